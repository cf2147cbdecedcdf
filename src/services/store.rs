//! 远端快照存储
//!
//! 每个目标只有一个能力：把整个值写到某个路径上（整体覆盖，不合并）。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::Destination;
use crate::error::PublishError;
use crate::utils::logging::truncate_text;

/// 快照存储
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// 目标名称（用于日志和报告）
    fn name(&self) -> &str;

    /// 用 `value` 整体替换 `path` 上的旧值
    async fn put(&self, path: &str, value: &Value) -> Result<(), PublishError>;
}

/// Firebase Realtime Database 存储
///
/// REST 接口：`PUT {database_url}/{path}.json` 会整体替换该节点。
pub struct FirebaseStore {
    name: String,
    database_url: String,
    auth_token: Option<String>,
    client: Client,
}

impl FirebaseStore {
    /// 根据目标配置创建
    pub fn new(destination: &Destination, timeout: Duration) -> Result<Self, PublishError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PublishError::request_failed(&destination.name, e))?;

        Ok(Self {
            name: destination.name.clone(),
            database_url: destination.database_url.clone(),
            auth_token: destination.auth_token.clone(),
            client,
        })
    }

    /// 节点的 REST 地址
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}.json",
            self.database_url.trim_end_matches('/'),
            path.trim_matches('/')
        )
    }
}

#[async_trait]
impl SnapshotStore for FirebaseStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, path: &str, value: &Value) -> Result<(), PublishError> {
        let endpoint = self.endpoint(path);
        debug!("PUT {} ({})", endpoint, self.name);

        let mut request = self.client.put(&endpoint).json(value);
        if let Some(token) = &self.auth_token {
            request = request.query(&[("auth", token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PublishError::request_failed(&self.name, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::BadStatus {
                destination: self.name.clone(),
                status: status.as_u16(),
                body: truncate_text(&body, 200),
            });
        }

        Ok(())
    }
}

/// 进程内存储
///
/// 与远端语义一致（整体覆盖），用于测试和库调用方。克隆后共享同一份数据。
#[derive(Clone, Default)]
pub struct MemoryStore {
    name: String,
    nodes: Arc<Mutex<HashMap<String, Value>>>,
    writes: Arc<Mutex<usize>>,
    fail_with: Option<u16>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// 每次写入都返回指定 HTTP 状态的失败
    pub fn failing(name: impl Into<String>, status: u16) -> Self {
        Self {
            fail_with: Some(status),
            ..Self::new(name)
        }
    }

    /// 读取某个路径上的当前值
    pub fn get(&self, path: &str) -> Option<Value> {
        self.nodes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path.trim_matches('/'))
            .cloned()
    }

    /// 写入次数（含失败的尝试）
    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, path: &str, value: &Value) -> Result<(), PublishError> {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;

        if let Some(status) = self.fail_with {
            return Err(PublishError::BadStatus {
                destination: self.name.clone(),
                status,
                body: String::new(),
            });
        }

        self.nodes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.trim_matches('/').to_string(), value.clone());
        Ok(())
    }
}
