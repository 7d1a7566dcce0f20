// ==========================================
// 表格导入引擎 - 持久化覆写
// ==========================================
// 优先级（固定策略）:
// 1. 集合覆写: 校验后立即接管整批（含空白行），不开启事务、不触发钩子
// 2. 行覆写:   在事务内替代默认的逐行处理，before_insert / after_insert 不触发
// 3. 默认:     逐行解析实体 → 赋值 → 保存
// ==========================================

use crate::domain::row::MappedRow;
use crate::domain::types::PersistencePath;
use std::fmt;

/// 行覆写回调: (存储, 当前行)
pub type RowOverride<'a, S> = Box<dyn FnMut(&mut S, &MappedRow) -> anyhow::Result<()> + 'a>;

/// 集合覆写回调: (存储, 过滤后的整批行)
pub type CollectionOverride<'a, S> =
    Box<dyn FnMut(&mut S, &[MappedRow]) -> anyhow::Result<()> + 'a>;

pub struct Overrides<'a, S> {
    pub(crate) row: Option<RowOverride<'a, S>>,
    pub(crate) collection: Option<CollectionOverride<'a, S>>,
}

impl<S> Default for Overrides<'_, S> {
    fn default() -> Self {
        Self {
            row: None,
            collection: None,
        }
    }
}

impl<S> fmt::Debug for Overrides<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overrides")
            .field("row", &self.row.is_some())
            .field("collection", &self.collection.is_some())
            .finish()
    }
}

impl<'a, S> Overrides<'a, S> {
    pub fn set_row(&mut self, f: impl FnMut(&mut S, &MappedRow) -> anyhow::Result<()> + 'a) {
        self.row = Some(Box::new(f));
    }

    pub fn set_collection(
        &mut self,
        f: impl FnMut(&mut S, &[MappedRow]) -> anyhow::Result<()> + 'a,
    ) {
        self.collection = Some(Box::new(f));
    }

    /// 按优先级决定本次导入的持久化路径
    pub fn path(&self) -> PersistencePath {
        if self.collection.is_some() {
            PersistencePath::CollectionOverride
        } else if self.row.is_some() {
            PersistencePath::RowOverride
        } else {
            PersistencePath::Default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_precedence() {
        let mut overrides: Overrides<'_, ()> = Overrides::default();
        assert_eq!(overrides.path(), PersistencePath::Default);

        overrides.set_row(|_, _| Ok(()));
        assert_eq!(overrides.path(), PersistencePath::RowOverride);

        // 集合覆写优先于行覆写
        overrides.set_collection(|_, _| Ok(()));
        assert_eq!(overrides.path(), PersistencePath::CollectionOverride);
    }
}
