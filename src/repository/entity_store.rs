// ==========================================
// 表格导入引擎 - 实体存储 Trait
// ==========================================
// 职责: 定义导入引擎所需的实体能力与存储能力（不包含实现）
// 实现者: sqlite_store::SqliteEntityStore
// ==========================================

use crate::domain::cell::CellValue;
use crate::domain::record::EntitySchema;
use crate::repository::error::RepositoryResult;
use std::fmt::Debug;

// ==========================================
// Entity Trait
// ==========================================
pub trait Entity: Clone + Debug {
    /// 持久化标识（未保存时为 None）
    fn id(&self) -> Option<i64>;

    /// 是否尚未持久化
    fn is_new(&self) -> bool {
        self.id().is_none()
    }

    fn get_field(&self, field: &str) -> Option<&CellValue>;

    /// 按名称赋值；实体上不存在的字段返回 UnknownField
    fn set_field(&mut self, field: &str, value: CellValue) -> RepositoryResult<()>;

    /// 以当前实体为原型复制一个未保存的新实体（保留默认值，清除标识）
    fn clone_as_new(&self) -> Self;
}

// ==========================================
// EntityStore Trait
// ==========================================
// 事务约定: begin / commit / rollback 由持久化引擎成对调用，
// 期间的 find_one_by / save / update 均落在同一事务内
pub trait EntityStore {
    type Entity: Entity;

    /// 目标实体结构（映射解析时拒绝未知字段）
    fn schema(&self) -> &EntitySchema;

    /// 按字段相等查找一条记录
    ///
    /// # 返回
    /// - Ok(Some): 找到（多条时取标识最小的一条）
    /// - Ok(None): 未找到
    fn find_one_by(&mut self, field: &str, value: &CellValue)
        -> RepositoryResult<Option<Self::Entity>>;

    /// 保存: 新实体插入并回填标识，已有实体更新
    fn save(&mut self, entity: &mut Self::Entity) -> RepositoryResult<()>;

    /// 更新已持久化实体
    fn update(&mut self, entity: &Self::Entity) -> RepositoryResult<()>;

    fn begin(&mut self) -> RepositoryResult<()>;

    fn commit(&mut self) -> RepositoryResult<()>;

    fn rollback(&mut self) -> RepositoryResult<()>;
}
