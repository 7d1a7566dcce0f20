// ==========================================
// 表格导入引擎 - 行结构
// ==========================================
// RawRow:    读取器输出，列标签 → 单元格值（保持表头顺序）
// MappedRow: 投影输出，领域字段 → 单元格值（保持列顺序）
// ==========================================

use crate::domain::cell::CellValue;
use serde::ser::{Serialize, SerializeMap, Serializer};

// ==========================================
// RawRow - 原始行
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一个单元格（列标签按表头原样保留）
    pub fn push(&mut self, label: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.push((label.into(), value.into()));
    }

    /// 链式构造，便于测试与调用方手工组装
    pub fn with(mut self, label: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.push(label, value);
        self
    }

    pub fn get(&self, label: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(l, v)| (l.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<L, V> FromIterator<(L, V)> for RawRow
where
    L: Into<String>,
    V: Into<CellValue>,
{
    fn from_iter<I: IntoIterator<Item = (L, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (label, value) in iter {
            row.push(label, value);
        }
        row
    }
}

// ==========================================
// MappedRow - 映射后的行
// ==========================================
// row_number: 物理行号（表头行 + 1 起算），用于错误定位
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRow {
    row_number: usize,
    values: Vec<(String, CellValue)>,
}

impl MappedRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            values: Vec::new(),
        }
    }

    pub fn row_number(&self) -> usize {
        self.row_number
    }

    /// 写入字段值；同名字段后写覆盖先写，位置保持首次出现处
    pub fn insert(&mut self, field: impl Into<String>, value: CellValue) {
        let field = field.into();
        match self.values.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.values.push((field, value)),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.insert(field, value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.values
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.values.iter().map(|(f, v)| (f.as_str(), v))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(f, _)| f.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 所有值均为空白（或没有任何映射列）
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|(_, v)| v.is_blank())
    }
}

impl Serialize for MappedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in &self.values {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapped_row_insert_overwrites_in_place() {
        let mut row = MappedRow::new(2);
        row.insert("name", CellValue::text("Ann"));
        row.insert("email", CellValue::text("ann@x.com"));
        row.insert("name", CellValue::text("Bob"));

        let fields: Vec<&str> = row.fields().collect();
        assert_eq!(fields, vec!["name", "email"]);
        assert_eq!(row.get("name"), Some(&CellValue::text("Bob")));
    }

    #[test]
    fn test_mapped_row_blank() {
        let row = MappedRow::new(3).with("name", "").with("email", "  ");
        assert!(row.is_blank());

        let row = MappedRow::new(3).with("name", "").with("age", 0_i64);
        assert!(!row.is_blank());

        assert!(MappedRow::new(4).is_blank());
    }

    #[test]
    fn test_mapped_row_serializes_as_object() {
        let row = MappedRow::new(2).with("name", "Ann").with("age", 30_i64);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"name":"Ann","age":30}"#);
    }
}
