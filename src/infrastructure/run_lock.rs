//! 运行锁
//!
//! 定时任务可能重叠触发。发布是整体覆盖，重叠运行时谁最后写谁生效，
//! 所以同一时间只允许一次运行。锁文件随 `RunLock` 释放而删除，
//! 进程崩溃留下的残留锁超过时限后被回收。

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::error::LockError;

/// 持有期间独占运行权
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    /// 获取运行锁
    ///
    /// 已有未过期的锁时返回 [`LockError::Held`]。
    pub fn acquire(path: &Path, stale_after: Duration) -> Result<Self, LockError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| io_error(path, source))?;
        }

        match Self::create(path) {
            Ok(lock) => Ok(lock),
            Err(LockError::Held { .. }) if is_stale(path, stale_after) => {
                warn!("⚠️ 回收残留的运行锁: {}", path.display());
                fs::remove_file(path).map_err(|source| io_error(path, source))?;
                Self::create(path)
            }
            Err(e) => Err(e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create(path: &Path) -> Result<Self, LockError> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(LockError::Held {
                    path: path.to_path_buf(),
                })
            }
            Err(source) => return Err(io_error(path, source)),
        };

        let owner = format!(
            "pid={}\nstarted_at={}\n",
            std::process::id(),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        file.write_all(owner.as_bytes())
            .map_err(|source| io_error(path, source))?;

        debug!("已获取运行锁: {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("已释放运行锁: {}", self.path.display()),
            Err(e) => warn!("释放运行锁失败 ({}): {}", self.path.display(), e),
        }
    }
}

fn is_stale(path: &Path, stale_after: Duration) -> bool {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .map(|age| age > stale_after)
        .unwrap_or(false)
}

fn io_error(path: &Path, source: std::io::Error) -> LockError {
    LockError::Io {
        path: path.to_path_buf(),
        source,
    }
}
