// ==========================================
// 表格导入引擎 - 校验错误
// ==========================================
// 每条错误定位到: 批次内行下标 + 物理行号 + 字段 + 规则
// 键格式: "<row_index>.<field>.<rule>"
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row_index: usize,  // 批次内下标（0 起）
    pub row_number: usize, // 物理行号
    pub field: String,     // 领域字段
    pub rule: String,      // 规则名
    pub message: String,   // 格式化后的消息
}

impl ValidationError {
    pub fn key(&self) -> String {
        format!("{}.{}.{}", self.row_index, self.field, self.rule)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// 按 "<row_index>.<field>.<rule>" 查找消息
    pub fn get(&self, key: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.key() == key)
            .map(|e| e.message.as_str())
    }

    /// 某一行（批次下标）的全部错误
    pub fn for_row(&self, row_index: usize) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.row_index == row_index)
    }

    /// 键 → 消息 视图
    pub fn messages(&self) -> BTreeMap<String, String> {
        self.errors
            .iter()
            .map(|e| (e.key(), e.message.clone()))
            .collect()
    }

    /// 按行号、字段排序，保证输出稳定
    pub(crate) fn sort(&mut self) {
        self.errors
            .sort_by(|a, b| (a.row_index, &a.field).cmp(&(b.row_index, &b.field)));
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 项校验错误", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  {}", error.message)?;
        }
        Ok(())
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
