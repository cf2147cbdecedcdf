//! 诊断截图服务 - 业务能力层
//!
//! 只负责"出错时给当前页面拍一张照片"，文件名由时间戳决定。

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, error};

use crate::error::DiagnosticsError;
use crate::infrastructure::RenderSession;

/// 截图文件名中的时间格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// 诊断截图服务
#[derive(Debug, Clone)]
pub struct Diagnostics {
    dir: PathBuf,
}

impl Diagnostics {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 某一时刻对应的截图路径：`<dir>/error_<YYYY-MM-DD_HH-MM-SS>.png`
    pub fn artifact_path(&self, at: DateTime<Local>) -> PathBuf {
        self.dir.join(format!("error_{}.png", at.format(TIMESTAMP_FORMAT)))
    }

    /// 截图并记录触发错误
    ///
    /// 返回截图路径；截图本身失败时只返回错误，调用方不应因此掩盖原始错误。
    pub async fn capture<S>(&self, session: &S, reason: &str) -> Result<PathBuf, DiagnosticsError>
    where
        S: RenderSession + ?Sized,
    {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| DiagnosticsError::CreateDirFailed {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.artifact_path(Local::now());
        debug!("正在保存诊断截图: {}", path.display());

        session.capture_screenshot(&path).await?;

        error!("📸 截图已保存到 {}，原因: {}", path.display(), reason);
        Ok(path)
    }
}
