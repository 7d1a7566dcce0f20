// ==========================================
// 表格导入引擎 - 动态实体
// ==========================================
// EntitySchema: 目标表结构（主键 + 可赋值列），映射解析时用于拒绝未知字段
// Record:       按列名存放值的动态实体，标识为空即为新建
// ==========================================

use crate::domain::cell::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

// ==========================================
// EntityColumn - 列定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityColumn {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
}

impl EntityColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: String::new(),
            not_null: false,
            default_value: None,
        }
    }
}

// ==========================================
// EntitySchema - 实体结构
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    pub table: String,
    pub primary_key: String,
    /// 不含主键的可赋值列（保持建表顺序）
    pub columns: Vec<EntityColumn>,
}

impl EntitySchema {
    pub fn new(table: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: primary_key.into(),
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: EntityColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// 是否为可赋值列（主键不可通过导入赋值）
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// 是否可作为查找条件（主键或普通列）
    pub fn is_queryable(&self, name: &str) -> bool {
        name == self.primary_key || self.has_column(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

// ==========================================
// Record - 动态实体
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<EntitySchema>,
    id: Option<i64>,
    values: BTreeMap<String, CellValue>,
}

impl Record {
    /// 创建空白新实体
    pub fn new(schema: Arc<EntitySchema>) -> Self {
        Self {
            schema,
            id: None,
            values: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.values.get(field)
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn set_id(&mut self, id: Option<i64>) {
        self.id = id;
    }

    /// 写入值（调用方负责校验列名）
    pub(crate) fn put(&mut self, field: impl Into<String>, value: CellValue) {
        self.values.insert(field.into(), value);
    }
}
