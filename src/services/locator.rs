//! 字段定位规则表
//!
//! 页面使用自动生成的 class 名（如 `css-1qtrmek`），每次站点发版都可能变化。
//! 这里把"逻辑字段 → 定位规则"做成一张可配置的表，布局漂移时只改配置，不改逻辑。

use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, FieldError};
use crate::models::NOT_AVAILABLE;

/// 单个字段的定位规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldLocator {
    /// 行内第一个匹配节点
    First { selector: String },
    /// 行内第 `index` 个匹配节点（从 0 开始）
    Nth { selector: String, index: usize },
    /// 从第 `start` 个匹配节点开始，最多取 `max` 个
    Span {
        selector: String,
        start: usize,
        max: usize,
    },
}

impl FieldLocator {
    pub fn first(selector: impl Into<String>) -> Self {
        FieldLocator::First {
            selector: selector.into(),
        }
    }

    pub fn nth(selector: impl Into<String>, index: usize) -> Self {
        FieldLocator::Nth {
            selector: selector.into(),
            index,
        }
    }

    pub fn span(selector: impl Into<String>, start: usize, max: usize) -> Self {
        FieldLocator::Span {
            selector: selector.into(),
            start,
            max,
        }
    }

    pub fn selector(&self) -> &str {
        match self {
            FieldLocator::First { selector }
            | FieldLocator::Nth { selector, .. }
            | FieldLocator::Span { selector, .. } => selector,
        }
    }

    /// 编译选择器
    pub fn compile(&self, field: &str) -> Result<CompiledLocator, ExtractError> {
        let selector = parse_selector(field, self.selector())?;
        Ok(CompiledLocator {
            field: field.to_string(),
            source: self.selector().to_string(),
            selector,
            rule: self.clone(),
        })
    }
}

/// 排行榜定位规则表
///
/// 字段为 `None` 表示当前布局不提供该列，直接使用哨兵值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorTable {
    /// 选手行
    pub row: String,
    pub position: Option<FieldLocator>,
    pub name: Option<FieldLocator>,
    pub score: Option<FieldLocator>,
    pub thru_status: Option<FieldLocator>,
    pub current_round: Option<FieldLocator>,
    pub odds_to_win: Option<FieldLocator>,
    pub round_scores: Option<FieldLocator>,
    /// 国旗图片路径前的固定标记
    pub flag_marker: String,
    /// 国旗图片扩展名
    pub flag_terminator: String,
}

const SCORE_CELL: &str = "td.css-139kpds";

impl Default for LocatorTable {
    fn default() -> Self {
        Self {
            row: "tr.css-1qtrmek".to_string(),
            position: Some(FieldLocator::first("td.css-11dj2vk")),
            name: Some(FieldLocator::first("span.chakra-text.css-hmig5c")),
            score: Some(FieldLocator::nth(SCORE_CELL, 2)),
            thru_status: Some(FieldLocator::nth(SCORE_CELL, 3)),
            current_round: Some(FieldLocator::nth(SCORE_CELL, 4)),
            odds_to_win: Some(FieldLocator::nth(SCORE_CELL, 5)),
            round_scores: Some(FieldLocator::span(SCORE_CELL, 6, 4)),
            flag_marker: "flags/".to_string(),
            flag_terminator: ".png".to_string(),
        }
    }
}

/// 编译后的定位规则
#[derive(Debug, Clone)]
pub struct CompiledLocator {
    field: String,
    source: String,
    selector: Selector,
    rule: FieldLocator,
}

impl CompiledLocator {
    pub fn field(&self) -> &str {
        &self.field
    }

    /// 定位单个文本值
    ///
    /// `Span` 规则取区间内第一个节点。
    pub fn locate_text(&self, row: ElementRef<'_>) -> Result<String, FieldError> {
        let index = match &self.rule {
            FieldLocator::First { .. } => 0,
            FieldLocator::Nth { index, .. } => *index,
            FieldLocator::Span { start, .. } => *start,
        };

        let mut matches = row.select(&self.selector);
        let node = match matches.nth(index) {
            Some(node) => node,
            None if index == 0 => {
                return Err(FieldError::Missing {
                    selector: self.source.clone(),
                })
            }
            None => {
                return Err(FieldError::OutOfRange {
                    selector: self.source.clone(),
                    index,
                    found: row.select(&self.selector).count(),
                })
            }
        };

        let text = node_text(node);
        if text.is_empty() {
            return Err(FieldError::EmptyText {
                selector: self.source.clone(),
            });
        }
        Ok(text)
    }

    /// 定位一组文本值（历史轮次成绩）
    ///
    /// 匹配节点数不超过 `start` 时视为该布局没有这组列。
    /// 空单元格记为哨兵值，保持列对齐。
    pub fn locate_span(&self, row: ElementRef<'_>) -> Result<Vec<String>, FieldError> {
        let (start, max) = match &self.rule {
            FieldLocator::First { .. } => (0, 1),
            FieldLocator::Nth { index, .. } => (*index, 1),
            FieldLocator::Span { start, max, .. } => (*start, *max),
        };

        let cells: Vec<ElementRef<'_>> = row.select(&self.selector).collect();
        if cells.len() <= start {
            return Err(FieldError::OutOfRange {
                selector: self.source.clone(),
                index: start,
                found: cells.len(),
            });
        }

        Ok(cells
            .into_iter()
            .skip(start)
            .take(max)
            .map(|cell| {
                let text = node_text(cell);
                if text.is_empty() {
                    NOT_AVAILABLE.to_string()
                } else {
                    text
                }
            })
            .collect())
    }
}

/// 编译选择器，错误信息带上字段名
pub fn parse_selector(field: &str, selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
        field: field.to_string(),
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// 节点的纯文本内容，空白折叠后去首尾空格
pub fn node_text(node: ElementRef<'_>) -> String {
    node.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
