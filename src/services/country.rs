//! 国家代码启发式提取
//!
//! 页面没有结构化的国家属性，只能在行的原始 HTML 中找国旗图片路径，
//! 例如 `.../flags/USA.png` → `USA`。这是对非结构化文本的猜测，
//! 页面改版很容易失效，所以只返回 `Option`，从不报错。

/// 从行的原始 HTML 中提取国家代码
///
/// 1. 找到 `marker`（如 `flags/`）
/// 2. 从标记之后向前扫描到 `terminator`（如 `.png`）
/// 3. 两者之间第一个路径段即为国家代码（去掉扩展名）
///
/// 任意一步失败都返回 `None`。
pub fn extract_country_code(markup: &str, marker: &str, terminator: &str) -> Option<String> {
    if marker.is_empty() || terminator.is_empty() {
        return None;
    }

    let start = markup.find(marker)? + marker.len();
    let rest = &markup[start..];
    let end = rest.find(terminator)?;

    let segment = rest[..end].split('/').find(|s| !s.is_empty())?;
    let code = segment.split('.').next().unwrap_or(segment).trim();

    if is_plausible_code(code) {
        Some(code.to_string())
    } else {
        None
    }
}

// 终止符可能落在另一个属性里，扫描结果会混入引号、空格或标签
fn is_plausible_code(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= 8
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_code_from_flag_path() {
        let markup = r#"<td><img src="https://res.cloudinary.com/pgatour-prod/flags/USA.png" alt=""></td>"#;
        assert_eq!(
            extract_country_code(markup, "flags/", ".png"),
            Some("USA".to_string())
        );
    }

    #[test]
    fn test_takes_segment_right_after_marker() {
        let markup = r#"<img src="/img/flags/ENG/large.png">"#;
        assert_eq!(
            extract_country_code(markup, "flags/", ".png"),
            Some("ENG".to_string())
        );
    }

    #[test]
    fn test_missing_marker_returns_none() {
        let markup = r#"<td><img src="/headshots/12345.png"></td>"#;
        assert_eq!(extract_country_code(markup, "flags/", ".png"), None);
    }

    #[test]
    fn test_missing_terminator_returns_none() {
        let markup = r#"<td><img src="/flags/USA.svg"></td>"#;
        assert_eq!(extract_country_code(markup, "flags/", ".png"), None);
    }

    #[test]
    fn test_terminator_in_unrelated_markup_returns_none() {
        let markup = r#"<a href="/flags/">All</a><img src="/x/headshot.png">"#;
        assert_eq!(extract_country_code(markup, "flags/", ".png"), None);
    }

    #[test]
    fn test_empty_markers_return_none() {
        assert_eq!(extract_country_code("flags/USA.png", "", ".png"), None);
        assert_eq!(extract_country_code("flags/USA.png", "flags/", ""), None);
    }
}
