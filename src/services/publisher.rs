//! 快照发布服务 - 业务能力层
//!
//! 把一次运行的快照整体写到每个配置的目标上。
//! 目标之间互不影响：一个失败不会阻止其他目标的写入，也不会回滚已完成的写入。

use futures::future::join_all;
use tracing::{error, info};

use crate::error::PublishError;
use crate::models::LeaderboardSnapshot;
use crate::services::store::SnapshotStore;

/// 单个目标的发布结果
#[derive(Debug)]
pub struct DestinationOutcome {
    pub destination: String,
    pub result: Result<(), PublishError>,
}

/// 一次发布的汇总
#[derive(Debug, Default)]
pub struct PublishReport {
    pub records: usize,
    pub outcomes: Vec<DestinationOutcome>,
}

impl PublishReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }
}

/// 快照发布器
pub struct SnapshotPublisher {
    path: String,
    stores: Vec<Box<dyn SnapshotStore>>,
}

impl SnapshotPublisher {
    /// `path` 是每个目标上要整体替换的逻辑路径
    pub fn new(path: impl Into<String>, stores: Vec<Box<dyn SnapshotStore>>) -> Self {
        Self {
            path: path.into(),
            stores,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn destinations(&self) -> usize {
        self.stores.len()
    }

    /// 发布快照
    ///
    /// 快照只序列化一次，然后并发写入所有目标。
    /// 只有序列化失败会返回 `Err`；各目标的失败记录在报告中。
    pub async fn publish(
        &self,
        snapshot: &LeaderboardSnapshot,
    ) -> Result<PublishReport, PublishError> {
        let value = serde_json::to_value(snapshot)?;

        info!(
            "📤 正在发布 {} 条记录到 {} 个目标 (路径: {})",
            snapshot.len(),
            self.stores.len(),
            self.path
        );

        let writes = self.stores.iter().map(|store| {
            let value = &value;
            async move {
                let result = store.put(&self.path, value).await;
                match &result {
                    Ok(()) => info!("✓ {} 写入成功", store.name()),
                    Err(e) => error!("❌ {} 写入失败: {}", store.name(), e),
                }
                DestinationOutcome {
                    destination: store.name().to_string(),
                    result,
                }
            }
        });

        let outcomes = join_all(writes).await;

        Ok(PublishReport {
            records: snapshot.len(),
            outcomes,
        })
    }
}
