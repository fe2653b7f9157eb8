//! # Locale 模块
//!
//! 翻译提供方接缝。
//!
//! ## 设计说明
//!
//! - 语言索引 `0` 固定表示原文，此时不做任何查表
//! - 查表键是 `(行号, 语言索引)`；查不到时调用方回退到原文
//! - [`TranslationTable`] 是自带的内存实现，数据可序列化，
//!   真实项目里 Host 也可以接自己的本地化系统

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 翻译提供方
pub trait TranslationSource {
    /// 当前语言索引（0 = 原文）
    fn current_language(&self) -> usize;

    /// 查询指定行在指定语言下的译文
    ///
    /// 语言 0 或查不到时返回 None，由调用方回退到原文。
    fn translation(&self, line_id: i32, language: usize) -> Option<String>;
}

/// 内存翻译表
///
/// 每行存一个译文列表，索引 `language - 1` 对应语言 `language`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationTable {
    /// 当前语言索引（0 = 原文）
    current_language: usize,
    /// 行号 -> 各语言译文（索引 0 对应语言 1）
    entries: HashMap<i32, Vec<String>>,
}

impl TranslationTable {
    /// 创建空表（语言 0，原文）
    pub fn new() -> Self {
        Self::default()
    }

    /// 切换当前语言
    pub fn set_language(&mut self, language: usize) {
        self.current_language = language;
    }

    /// 录入某行的全部译文（覆盖旧值）
    pub fn insert_line(&mut self, line_id: i32, translations: Vec<String>) {
        self.entries.insert(line_id, translations);
    }

    /// 录入单条译文
    pub fn insert(&mut self, line_id: i32, language: usize, text: impl Into<String>) {
        if language == 0 {
            return; // 语言 0 是原文，不入表
        }
        let row = self.entries.entry(line_id).or_default();
        if row.len() < language {
            row.resize(language, String::new());
        }
        row[language - 1] = text.into();
    }
}

impl TranslationSource for TranslationTable {
    fn current_language(&self) -> usize {
        self.current_language
    }

    fn translation(&self, line_id: i32, language: usize) -> Option<String> {
        if language == 0 {
            return None;
        }
        self.entries
            .get(&line_id)
            .and_then(|row| row.get(language - 1))
            .filter(|text| !text.is_empty())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_zero_is_original() {
        let mut table = TranslationTable::new();
        table.insert_line(1, vec!["Hello".to_string()]);

        assert_eq!(table.current_language(), 0);
        assert_eq!(table.translation(1, 0), None);
    }

    #[test]
    fn test_lookup() {
        let mut table = TranslationTable::new();
        table.insert_line(1, vec!["Hello".to_string(), "Bonjour".to_string()]);

        assert_eq!(table.translation(1, 1), Some("Hello".to_string()));
        assert_eq!(table.translation(1, 2), Some("Bonjour".to_string()));
        // 行不存在 / 语言越界
        assert_eq!(table.translation(2, 1), None);
        assert_eq!(table.translation(1, 3), None);
    }

    #[test]
    fn test_insert_single() {
        let mut table = TranslationTable::new();
        table.insert(7, 2, "Bonjour");

        // 语言 1 未录入，占位为空串，视为缺失
        assert_eq!(table.translation(7, 1), None);
        assert_eq!(table.translation(7, 2), Some("Bonjour".to_string()));

        // 语言 0 不入表
        table.insert(7, 0, "原文");
        assert_eq!(table.translation(7, 0), None);
    }

    #[test]
    fn test_table_serialization() {
        let mut table = TranslationTable::new();
        table.set_language(1);
        table.insert(1, 1, "Hello");

        let json = serde_json::to_string(&table).unwrap();
        let loaded: TranslationTable = serde_json::from_str(&json).unwrap();
        assert_eq!(table, loaded);
        assert_eq!(loaded.current_language(), 1);
    }
}
