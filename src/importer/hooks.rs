// ==========================================
// 表格导入引擎 - 生命周期钩子
// ==========================================
// 钩子点固定为四个: before_import / before_insert / after_insert / after_import
// 每个钩子点最多一个回调，重复注册后写覆盖先写
// 回调错误不做隔离，按持久化失败处理（整批回滚）
// ==========================================

use crate::domain::row::MappedRow;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// 钩子点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    BeforeImport,
    BeforeInsert,
    AfterInsert,
    AfterImport,
}

impl HookPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookPoint::BeforeImport => "before_import",
            HookPoint::BeforeInsert => "before_insert",
            HookPoint::AfterInsert => "after_insert",
            HookPoint::AfterImport => "after_import",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type BatchHook<'a> = Box<dyn FnMut(&[MappedRow]) -> anyhow::Result<()> + 'a>;
pub type BeforeInsertHook<'a, E> = Box<dyn FnMut(&mut E, &MappedRow) -> anyhow::Result<()> + 'a>;
pub type AfterInsertHook<'a, E> = Box<dyn FnMut(&E, &MappedRow) -> anyhow::Result<()> + 'a>;
pub type FinishHook<'a> = Box<dyn FnMut() -> anyhow::Result<()> + 'a>;

/// 钩子回调（签名随钩子点而定）
pub enum Hook<'a, E> {
    /// 事务开启后、逐行处理前，收到过滤后的整批行
    BeforeImport(BatchHook<'a>),
    /// 字段赋值完成、首次保存前
    BeforeInsert(BeforeInsertHook<'a, E>),
    /// 保存后字段写回之后
    AfterInsert(AfterInsertHook<'a, E>),
    /// 全部行处理完成、提交前
    AfterImport(FinishHook<'a>),
}

impl<'a, E> Hook<'a, E> {
    pub fn before_import(f: impl FnMut(&[MappedRow]) -> anyhow::Result<()> + 'a) -> Self {
        Hook::BeforeImport(Box::new(f))
    }

    pub fn before_insert(f: impl FnMut(&mut E, &MappedRow) -> anyhow::Result<()> + 'a) -> Self {
        Hook::BeforeInsert(Box::new(f))
    }

    pub fn after_insert(f: impl FnMut(&E, &MappedRow) -> anyhow::Result<()> + 'a) -> Self {
        Hook::AfterInsert(Box::new(f))
    }

    pub fn after_import(f: impl FnMut() -> anyhow::Result<()> + 'a) -> Self {
        Hook::AfterImport(Box::new(f))
    }

    pub fn point(&self) -> HookPoint {
        match self {
            Hook::BeforeImport(_) => HookPoint::BeforeImport,
            Hook::BeforeInsert(_) => HookPoint::BeforeInsert,
            Hook::AfterInsert(_) => HookPoint::AfterInsert,
            Hook::AfterImport(_) => HookPoint::AfterImport,
        }
    }
}

impl<E> fmt::Debug for Hook<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hook({})", self.point())
    }
}

// ==========================================
// HookRegistry - 钩子点 → 单一回调
// ==========================================
pub struct HookRegistry<'a, E> {
    hooks: HashMap<HookPoint, Hook<'a, E>>,
}

impl<E> Default for HookRegistry<'_, E> {
    fn default() -> Self {
        Self {
            hooks: HashMap::new(),
        }
    }
}

impl<E> fmt::Debug for HookRegistry<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.hooks.keys()).finish()
    }
}

impl<'a, E> HookRegistry<'a, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册钩子；同一钩子点已有回调时替换并返回旧回调
    pub fn register(&mut self, hook: Hook<'a, E>) -> Option<Hook<'a, E>> {
        let point = hook.point();
        let replaced = self.hooks.insert(point, hook);
        if replaced.is_some() {
            debug!(hook = %point, "钩子重复注册，覆盖旧回调");
        }
        replaced
    }

    pub fn is_registered(&self, point: HookPoint) -> bool {
        self.hooks.contains_key(&point)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn fire_before_import(&mut self, rows: &[MappedRow]) -> anyhow::Result<()> {
        match self.hooks.get_mut(&HookPoint::BeforeImport) {
            Some(Hook::BeforeImport(f)) => f(rows),
            _ => Ok(()),
        }
    }

    pub fn fire_before_insert(&mut self, entity: &mut E, row: &MappedRow) -> anyhow::Result<()> {
        match self.hooks.get_mut(&HookPoint::BeforeInsert) {
            Some(Hook::BeforeInsert(f)) => f(entity, row),
            _ => Ok(()),
        }
    }

    pub fn fire_after_insert(&mut self, entity: &E, row: &MappedRow) -> anyhow::Result<()> {
        match self.hooks.get_mut(&HookPoint::AfterInsert) {
            Some(Hook::AfterInsert(f)) => f(entity, row),
            _ => Ok(()),
        }
    }

    pub fn fire_after_import(&mut self) -> anyhow::Result<()> {
        match self.hooks.get_mut(&HookPoint::AfterImport) {
            Some(Hook::AfterImport(f)) => f(),
            _ => Ok(()),
        }
    }
}
