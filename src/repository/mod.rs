// ==========================================
// 表格导入引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 实体查找与保存，屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod entity_store;
pub mod error;
pub mod sqlite_store;

pub use entity_store::{Entity, EntityStore};
pub use error::{RepositoryError, RepositoryResult};
pub use sqlite_store::SqliteEntityStore;
