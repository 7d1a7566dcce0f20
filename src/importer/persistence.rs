// ==========================================
// 表格导入引擎 - 持久化引擎
// ==========================================
// 职责: 事务内逐行解析目标实体、两阶段赋值、保存并触发钩子
// 红线: 任一行失败整批回滚，不存在部分提交，不做重试
// ==========================================
// 事务内顺序:
// before_import → [逐行: 查找/新建 → 保存前字段 → before_insert → save
//                 → 保存后字段 → update → after_insert] → after_import → commit
// ==========================================

use crate::domain::cell::CellValue;
use crate::domain::row::MappedRow;
use crate::domain::types::Operation;
use crate::importer::column_mapping::ColumnMapping;
use crate::importer::error::{BoxError, ImportError, ImportResult};
use crate::importer::hooks::HookRegistry;
use crate::importer::overrides::RowOverride;
use crate::repository::entity_store::{Entity, EntityStore};
use std::collections::HashSet;
use tracing::{debug, error, warn};

/// 逐行持久化统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistStats {
    pub created: usize,
    pub updated: usize,
    pub overridden: usize,
}

/// 单行处理失败: (行号, 原始错误)
struct RowFailure {
    row_number: Option<usize>,
    source: BoxError,
}

impl RowFailure {
    fn batch(source: impl Into<BoxError>) -> Self {
        Self {
            row_number: None,
            source: source.into(),
        }
    }

    fn at(row: &MappedRow, source: impl Into<BoxError>) -> Self {
        Self {
            row_number: Some(row.row_number()),
            source: source.into(),
        }
    }
}

pub struct PersistenceEngine<'m, 'a, S: EntityStore> {
    mapping: &'m ColumnMapping<'a, S::Entity>,
    update_field: Option<&'m str>,
    after_save_fields: HashSet<&'m str>,
}

impl<'m, 'a, S: EntityStore> PersistenceEngine<'m, 'a, S> {
    /// 保存后字段集合按映射配置一次性确定
    pub fn new(mapping: &'m ColumnMapping<'a, S::Entity>, update_field: Option<&'m str>) -> Self {
        let after_save_fields = mapping
            .iter()
            .map(|(field, _)| field)
            .filter(|field| mapping.is_after_save(field))
            .collect();

        Self {
            mapping,
            update_field,
            after_save_fields,
        }
    }

    /// 事务内持久化整批行
    ///
    /// # 参数
    /// - store: 实体存储（事务由本方法开启与结束）
    /// - prototype: 新建实体的原型
    /// - rows: 已过滤空白行的映射行
    /// - hooks: 生命周期钩子
    /// - row_override: 行覆写；存在时替代默认逐行处理，且不触发 before/after_insert
    ///
    /// # 错误
    /// - PersistenceFailure: 任一步骤失败，事务已回滚
    pub fn persist(
        &self,
        store: &mut S,
        prototype: &S::Entity,
        rows: &[MappedRow],
        hooks: &mut HookRegistry<'a, S::Entity>,
        row_override: Option<&mut RowOverride<'a, S>>,
    ) -> ImportResult<PersistStats> {
        store
            .begin()
            .map_err(|e| ImportError::persistence(None, e))?;

        match self.run(store, prototype, rows, hooks, row_override) {
            Ok(stats) => {
                store
                    .commit()
                    .map_err(|e| ImportError::persistence(None, e))?;
                debug!(
                    created = stats.created,
                    updated = stats.updated,
                    overridden = stats.overridden,
                    "事务已提交"
                );
                Ok(stats)
            }
            Err(failure) => {
                if let Err(e) = store.rollback() {
                    error!(error = %e, "事务回滚失败");
                }
                warn!(
                    row_number = ?failure.row_number,
                    error = %failure.source,
                    "持久化失败，事务已回滚"
                );
                Err(ImportError::PersistenceFailure {
                    row_number: failure.row_number,
                    source: failure.source,
                })
            }
        }
    }

    fn run(
        &self,
        store: &mut S,
        prototype: &S::Entity,
        rows: &[MappedRow],
        hooks: &mut HookRegistry<'a, S::Entity>,
        mut row_override: Option<&mut RowOverride<'a, S>>,
    ) -> Result<PersistStats, RowFailure> {
        let mut stats = PersistStats::default();

        hooks.fire_before_import(rows).map_err(RowFailure::batch)?;

        for row in rows {
            if let Some(handler) = row_override.as_deref_mut() {
                handler(&mut *store, row).map_err(|e| RowFailure::at(row, e))?;
                stats.overridden += 1;
                continue;
            }

            match self.persist_row(store, prototype, row, hooks) {
                Ok(Operation::Create) => stats.created += 1,
                Ok(Operation::Update) => stats.updated += 1,
                Err(e) => return Err(RowFailure::at(row, e)),
            }
        }

        hooks.fire_after_import().map_err(RowFailure::batch)?;
        Ok(stats)
    }

    /// 默认单行处理，返回实际操作类型
    fn persist_row(
        &self,
        store: &mut S,
        prototype: &S::Entity,
        row: &MappedRow,
        hooks: &mut HookRegistry<'a, S::Entity>,
    ) -> Result<Operation, BoxError> {
        let (mut entity, operation) = match self.find_existing(store, row)? {
            Some(existing) => (existing, Operation::Update),
            None => (prototype.clone_as_new(), Operation::Create),
        };

        let (after_save, before_save): (Vec<_>, Vec<_>) = row
            .iter()
            .partition(|(field, _)| self.after_save_fields.contains(field));

        self.assign(&mut entity, row, &before_save, operation)?;
        hooks.fire_before_insert(&mut entity, row)?;
        store.save(&mut entity)?;

        if !after_save.is_empty() {
            self.assign(&mut entity, row, &after_save, operation)?;
            store.update(&entity)?;
        }

        hooks.fire_after_insert(&entity, row)?;

        debug!(
            row_number = row.row_number(),
            operation = %operation,
            id = ?entity.id(),
            "行已持久化"
        );
        Ok(operation)
    }

    /// 按更新键查找已有实体；未配置更新键或键值为空时走新建
    fn find_existing(&self, store: &mut S, row: &MappedRow) -> Result<Option<S::Entity>, BoxError> {
        let Some(field) = self.update_field else {
            return Ok(None);
        };
        match row.get(field).filter(|v| !v.is_blank()) {
            Some(key) => Ok(store.find_one_by(field, key)?),
            None => Ok(None),
        }
    }

    /// 字段赋值: 有自定义逻辑时调用，否则写入同名属性
    fn assign(
        &self,
        entity: &mut S::Entity,
        row: &MappedRow,
        fields: &[(&str, &CellValue)],
        operation: Operation,
    ) -> Result<(), BoxError> {
        for &(field, value) in fields {
            match self.mapping.get(field).and_then(|spec| spec.import_logic()) {
                Some(logic) => logic(&mut *entity, row, value, operation)?,
                None => entity.set_field(field, value.clone())?,
            }
        }
        Ok(())
    }
}
