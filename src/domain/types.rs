// ==========================================
// 表格导入引擎 - 领域枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Operation - 单行持久化操作类型
// ==========================================
// 目标实体在导入前已存在 → Update，否则 → Create
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// PersistencePath - 本次导入实际走的持久化路径
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersistencePath {
    /// 默认逐行持久化（事务内）
    Default,
    /// 行级覆写回调（事务内）
    RowOverride,
    /// 集合级覆写回调（不开启事务）
    CollectionOverride,
}
