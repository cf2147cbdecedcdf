//! 排行榜提取服务 - 业务能力层
//!
//! 只负责"把渲染好的 HTML 变成有序的选手记录"，不关心页面从哪来、结果写到哪去。
//!
//! 每个字段独立走"定位或回退"：找到节点就取文本，找不到就用哨兵值 `N/A`。
//! 单个字段失败只影响这个字段，单行失败只跳过这一行。

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, trace, warn};

use crate::error::ExtractError;
use crate::models::{CompetitorRecord, LeaderboardSnapshot, CORE_FIELDS, NOT_AVAILABLE};
use crate::services::country::extract_country_code;
use crate::services::locator::{parse_selector, CompiledLocator, FieldLocator, LocatorTable};

/// 文档级状态
///
/// 零行不是异常：调用方需要区分"页面渲染了但一行都没匹配到"和真正的失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    /// 匹配到了选手行
    Rows,
    /// 文档可用，但没有匹配的行
    NoRows,
    /// 文档为空
    EmptyDocument,
}

/// 提取统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// 匹配到的行数
    pub rows_matched: usize,
    /// 所有文本字段都回退为哨兵值的行数（仍然保留在快照中）
    pub rows_blank: usize,
    /// 回退到哨兵值的字段数
    pub fields_defaulted: usize,
    /// 未识别到国家代码的行数
    pub countries_missing: usize,
}

/// 一次提取的结果
#[derive(Debug, Clone)]
pub struct Extraction {
    pub snapshot: LeaderboardSnapshot,
    pub stats: ExtractionStats,
    pub status: DocumentStatus,
}

/// 排行榜提取器
///
/// 构建时编译全部选择器，配置错误在运行前暴露。
#[derive(Debug, Clone)]
pub struct LeaderboardExtractor {
    row: Selector,
    row_source: String,
    position: Option<CompiledLocator>,
    name: Option<CompiledLocator>,
    score: Option<CompiledLocator>,
    thru_status: Option<CompiledLocator>,
    current_round: Option<CompiledLocator>,
    odds_to_win: Option<CompiledLocator>,
    round_scores: Option<CompiledLocator>,
    flag_marker: String,
    flag_terminator: String,
}

impl LeaderboardExtractor {
    /// 根据定位规则表创建提取器
    pub fn new(table: &LocatorTable) -> Result<Self, ExtractError> {
        if table.flag_marker.is_empty() {
            return Err(ExtractError::EmptyMarker {
                field: "flag_marker".to_string(),
            });
        }
        if table.flag_terminator.is_empty() {
            return Err(ExtractError::EmptyMarker {
                field: "flag_terminator".to_string(),
            });
        }

        Ok(Self {
            row: parse_selector("row", &table.row)?,
            row_source: table.row.clone(),
            position: compile("position", &table.position)?,
            name: compile("name", &table.name)?,
            score: compile("score", &table.score)?,
            thru_status: compile("thru_status", &table.thru_status)?,
            current_round: compile("current_round", &table.current_round)?,
            odds_to_win: compile("odds_to_win", &table.odds_to_win)?,
            round_scores: compile("round_scores", &table.round_scores)?,
            flag_marker: table.flag_marker.clone(),
            flag_terminator: table.flag_terminator.clone(),
        })
    }

    /// 从渲染好的 HTML 中提取排行榜
    ///
    /// 永不返回错误：字段和行的失败在内部消化，文档级问题体现在 [`DocumentStatus`] 中。
    pub fn extract(&self, html: &str) -> Extraction {
        let mut stats = ExtractionStats::default();

        if html.trim().is_empty() {
            warn!("⚠️ 页面文档为空，没有可提取的内容");
            return Extraction {
                snapshot: LeaderboardSnapshot::default(),
                stats,
                status: DocumentStatus::EmptyDocument,
            };
        }

        let document = Html::parse_document(html);
        let mut records = Vec::new();

        for (index, row) in document.select(&self.row).enumerate() {
            let row_number = index + 1;
            stats.rows_matched += 1;

            let record = self.extract_row(row_number, row, &mut stats);
            if record.missing_fields() == CORE_FIELDS {
                warn!("⚠️ 第 {} 行没有任何可读字段，按 {} 保留", row_number, NOT_AVAILABLE);
                stats.rows_blank += 1;
            }
            records.push(record);
        }

        let status = if stats.rows_matched == 0 {
            warn!(
                "⚠️ 页面已渲染，但没有匹配到任何选手行 (选择器: {})",
                self.row_source
            );
            DocumentStatus::NoRows
        } else {
            info!(
                "✓ 提取完成: 匹配 {} 行, 记录 {} 条, 空白行 {} 行, 回退字段 {} 个",
                stats.rows_matched,
                records.len(),
                stats.rows_blank,
                stats.fields_defaulted
            );
            DocumentStatus::Rows
        };

        Extraction {
            snapshot: LeaderboardSnapshot::new(records),
            stats,
            status,
        }
    }

    /// 提取单行
    ///
    /// 每个匹配行都产出一条记录，取不到的字段一律回退。
    fn extract_row(
        &self,
        row_number: usize,
        row: ElementRef<'_>,
        stats: &mut ExtractionStats,
    ) -> CompetitorRecord {
        let mut record = CompetitorRecord {
            position: self.text_field(&self.position, row_number, row, stats),
            name: self.text_field(&self.name, row_number, row, stats),
            score: self.text_field(&self.score, row_number, row, stats),
            thru_status: self.text_field(&self.thru_status, row_number, row, stats),
            current_round_score: self.text_field(&self.current_round, row_number, row, stats),
            odds_to_win: self.text_field(&self.odds_to_win, row_number, row, stats),
            ..Default::default()
        };

        if let Some(locator) = &self.round_scores {
            match locator.locate_span(row) {
                Ok(rounds) => record.set_round_scores(rounds),
                Err(e) => trace!("第 {} 行没有轮次成绩列: {}", row_number, e),
            }
        }

        record.country_code =
            extract_country_code(&row.html(), &self.flag_marker, &self.flag_terminator);
        if record.country_code.is_none() {
            stats.countries_missing += 1;
            trace!("第 {} 行未识别到国家代码", row_number);
        }

        debug!(
            "第 {} 行: {} | {} | {} | {}",
            row_number, record.position, record.name, record.score, record.thru_status
        );

        record
    }

    /// 定位或回退
    fn text_field(
        &self,
        locator: &Option<CompiledLocator>,
        row_number: usize,
        row: ElementRef<'_>,
        stats: &mut ExtractionStats,
    ) -> String {
        let Some(locator) = locator else {
            return NOT_AVAILABLE.to_string();
        };

        match locator.locate_text(row) {
            Ok(text) => text,
            Err(e) => {
                trace!(
                    "第 {} 行字段 {} 回退为 {}: {}",
                    row_number,
                    locator.field(),
                    NOT_AVAILABLE,
                    e
                );
                stats.fields_defaulted += 1;
                NOT_AVAILABLE.to_string()
            }
        }
    }
}

fn compile(
    field: &str,
    locator: &Option<FieldLocator>,
) -> Result<Option<CompiledLocator>, ExtractError> {
    locator.as_ref().map(|l| l.compile(field)).transpose()
}
