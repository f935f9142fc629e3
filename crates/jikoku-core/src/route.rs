//! 区間 (出発地・到着地) の解析

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// 「AからB」の区切り語
pub const ROUTE_SEPARATOR: &str = "から";

/// 出発地と到着地の組
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub starting_point: String,
    pub end_point: String,
}

impl Route {
    pub fn new(starting_point: impl Into<String>, end_point: impl Into<String>) -> Self {
        Self {
            starting_point: starting_point.into(),
            end_point: end_point.into(),
        }
    }

    /// 両端の駅名が空でないか
    pub fn is_complete(&self) -> bool {
        !self.starting_point.is_empty() && !self.end_point.is_empty()
    }

    /// "渋谷から新宿" のような表示用の文字列
    pub fn summary(&self) -> String {
        format!("{}{}{}", self.starting_point, ROUTE_SEPARATOR, self.end_point)
    }
}

/// ユーザー入力を区切り語で分割する
///
/// 最初の区切り語より前が出発地、それ以降すべて (区切り語を含んでいても) が到着地になります。
/// 駅名の空白除去や正規化は行いません。
#[derive(Debug, Clone)]
pub struct RouteParser {
    separator: String,
}

impl Default for RouteParser {
    fn default() -> Self {
        Self::new(ROUTE_SEPARATOR)
    }
}

impl RouteParser {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Split `text` at the first separator occurrence.
    pub fn parse(&self, text: &str) -> Result<Route> {
        text.split_once(self.separator.as_str())
            .map(|(start, end)| Route::new(start, end))
            .ok_or_else(|| {
                Error::MalformedInput(format!(
                    "separator '{}' not found in '{}'",
                    self.separator, text
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_route() {
        let route = RouteParser::default().parse("渋谷から新宿").unwrap();
        assert_eq!(route, Route::new("渋谷", "新宿"));
    }

    #[test]
    fn test_parse_splits_on_first_separator_only() {
        let route = RouteParser::default().parse("AからBからC").unwrap();
        assert_eq!(route.starting_point, "A");
        assert_eq!(route.end_point, "BからC");
    }

    #[test]
    fn test_parse_keeps_whitespace() {
        let route = RouteParser::default().parse(" 渋谷 から 新宿 ").unwrap();
        assert_eq!(route.starting_point, " 渋谷 ");
        assert_eq!(route.end_point, " 新宿 ");
    }

    #[test]
    fn test_parse_missing_separator() {
        let result = RouteParser::default().parse("渋谷 新宿");
        assert!(matches!(result, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_parse_reconstructs_input() {
        let parser = RouteParser::default();
        let inputs = [
            "渋谷から新宿",
            "から",
            "東京から",
            "から大阪",
            "京都から大阪から神戸",
            "abcからdef",
        ];

        for input in inputs {
            let route = parser.parse(input).unwrap();
            let rebuilt = format!("{}{}{}", route.starting_point, parser.separator(), route.end_point);
            assert_eq!(rebuilt, input);
            assert!(!route.starting_point.contains(parser.separator()));
        }
    }

    #[test]
    fn test_is_complete() {
        assert!(Route::new("渋谷", "新宿").is_complete());
        assert!(!Route::new("", "新宿").is_complete());
        assert!(!Route::new("渋谷", "").is_complete());
    }

    #[test]
    fn test_custom_separator() {
        let route = RouteParser::new("->").parse("Shibuya->Shinjuku").unwrap();
        assert_eq!(route, Route::new("Shibuya", "Shinjuku"));
    }

    #[test]
    fn test_summary() {
        assert_eq!(Route::new("渋谷", "新宿").summary(), "渋谷から新宿");
    }
}
