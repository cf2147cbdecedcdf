//! 排行榜数据模型

use serde::{Deserialize, Serialize};

/// 哨兵值：字段存在于模式中，但源页面中缺失
pub const NOT_AVAILABLE: &str = "N/A";

/// 历史轮次成绩最多 4 轮
pub const MAX_ROUND_SCORES: usize = 4;

/// 字符串核心字段的个数（`position` 到 `odds_to_win`）
pub const CORE_FIELDS: usize = 6;

/// 排行榜中的一名选手
///
/// `position` / `name` / `score` 等字符串字段永远不会为空，
/// 取不到时一律使用 [`NOT_AVAILABLE`]。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorRecord {
    /// 名次（可能并列，如 "T4"）
    pub position: String,
    /// 选手姓名
    pub name: String,
    /// 相对标准杆成绩（"+3" / "-5" / "E"）
    pub score: String,
    /// 已完成洞数或开球时间
    pub thru_status: String,
    /// 本轮成绩
    #[serde(rename = "round")]
    pub current_round_score: String,
    /// 夺冠赔率
    pub odds_to_win: String,
    /// 国家代码（从国旗图片路径推断，未识别时省略）
    #[serde(rename = "country", default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    /// 历史各轮成绩（仅部分页面布局提供）
    #[serde(rename = "rounds", default, skip_serializing_if = "Option::is_none")]
    pub round_scores: Option<Vec<String>>,
}

impl Default for CompetitorRecord {
    fn default() -> Self {
        Self {
            position: NOT_AVAILABLE.to_string(),
            name: NOT_AVAILABLE.to_string(),
            score: NOT_AVAILABLE.to_string(),
            thru_status: NOT_AVAILABLE.to_string(),
            current_round_score: NOT_AVAILABLE.to_string(),
            odds_to_win: NOT_AVAILABLE.to_string(),
            country_code: None,
            round_scores: None,
        }
    }
}

impl CompetitorRecord {
    /// 设置历史轮次成绩，超过 4 轮的部分被截断
    pub fn set_round_scores(&mut self, mut rounds: Vec<String>) {
        rounds.truncate(MAX_ROUND_SCORES);
        self.round_scores = Some(rounds);
    }

    /// 有多少个核心字段回退到了哨兵值
    pub fn missing_fields(&self) -> usize {
        [
            &self.position,
            &self.name,
            &self.score,
            &self.thru_status,
            &self.current_round_score,
            &self.odds_to_win,
        ]
        .iter()
        .filter(|v| v.as_str() == NOT_AVAILABLE)
        .count()
    }
}

/// 一次运行得到的完整排行榜快照
///
/// 每次运行全新创建，顺序与页面行顺序一致，不做重新排序。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeaderboardSnapshot {
    records: Vec<CompetitorRecord>,
}

impl LeaderboardSnapshot {
    pub fn new(records: Vec<CompetitorRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CompetitorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<CompetitorRecord> {
        self.records
    }
}

impl From<Vec<CompetitorRecord>> for LeaderboardSnapshot {
    fn from(records: Vec<CompetitorRecord>) -> Self {
        Self::new(records)
    }
}
