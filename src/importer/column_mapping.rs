// ==========================================
// 表格导入引擎 - 列映射解析
// ==========================================
// 职责: 领域字段 → 表格列标签 的声明式映射，解析为 slug → 领域字段 的查找表
// 红线: 缺少列名、slug 冲突、未知字段均在解析阶段报配置错误
// ==========================================

use crate::domain::cell::CellValue;
use crate::domain::record::EntitySchema;
use crate::domain::row::MappedRow;
use crate::domain::types::Operation;
use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// 自定义字段赋值逻辑: (实体, 整行, 当前值, 操作类型)
///
/// 回调收到的是完整的映射行，保存前与保存后两组字段都在其中，
/// 可按需读取同行的其他列；当前值即本字段所在列的单元格。
pub type ImportLogic<'a, E> =
    Box<dyn Fn(&mut E, &MappedRow, &CellValue, Operation) -> anyhow::Result<()> + 'a>;

/// 列标签规范化: 小写，连续的非字母数字字符折叠为单个 '_'，去掉首尾 '_'
///
/// 保留 Unicode 字母数字（中文表头原样保留）。对结果再次 slugify 不变。
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_separator = false;

    for c in label.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

// ==========================================
// FieldSpec - 单个字段的映射配置
// ==========================================
pub struct FieldSpec<'a, E> {
    name: Option<String>,
    set_after_save: bool,
    import_logic: Option<ImportLogic<'a, E>>,
}

impl<'a, E> FieldSpec<'a, E> {
    /// 仅指定列标签
    pub fn label(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            set_after_save: false,
            import_logic: None,
        }
    }

    /// 结构化配置，列名可缺省（缺省时解析阶段报错）
    pub fn structured(name: Option<String>) -> Self {
        Self {
            name,
            set_after_save: false,
            import_logic: None,
        }
    }

    /// 标记为保存后赋值（依赖实体标识的字段）
    pub fn after_save(mut self) -> Self {
        self.set_after_save = true;
        self
    }

    pub fn with_set_after_save(mut self, set_after_save: bool) -> Self {
        self.set_after_save = set_after_save;
        self
    }

    /// 自定义赋值逻辑，替代直接写入同名属性（回调可读取整行）
    pub fn with_import_logic<F>(mut self, logic: F) -> Self
    where
        F: Fn(&mut E, &MappedRow, &CellValue, Operation) -> anyhow::Result<()> + 'a,
    {
        self.import_logic = Some(Box::new(logic));
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_after_save(&self) -> bool {
        self.set_after_save
    }

    pub fn import_logic(&self) -> Option<&ImportLogic<'a, E>> {
        self.import_logic.as_ref()
    }
}

impl<E> fmt::Debug for FieldSpec<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("set_after_save", &self.set_after_save)
            .field("import_logic", &self.import_logic.is_some())
            .finish()
    }
}

impl<E> From<&str> for FieldSpec<'_, E> {
    fn from(label: &str) -> Self {
        FieldSpec::label(label)
    }
}

impl<E> From<String> for FieldSpec<'_, E> {
    fn from(label: String) -> Self {
        FieldSpec::label(label)
    }
}

// ==========================================
// ColumnMapping - 有序的字段映射
// ==========================================
pub struct ColumnMapping<'a, E> {
    fields: Vec<(String, FieldSpec<'a, E>)>,
}

impl<E> Default for ColumnMapping<'_, E> {
    fn default() -> Self {
        Self { fields: Vec::new() }
    }
}

impl<E> fmt::Debug for ColumnMapping<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.fields.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl<'a, E> ColumnMapping<'a, E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式添加字段
    pub fn field(mut self, field: impl Into<String>, spec: impl Into<FieldSpec<'a, E>>) -> Self {
        self.insert(field, spec);
        self
    }

    /// 添加或替换字段（替换时保持原位置）
    pub fn insert(&mut self, field: impl Into<String>, spec: impl Into<FieldSpec<'a, E>>) {
        let field = field.into();
        let spec = spec.into();
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = spec,
            None => self.fields.push((field, spec)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldSpec<'a, E>> {
        self.fields
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, spec)| spec)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec<'a, E>)> {
        self.fields.iter().map(|(f, spec)| (f.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 字段是否标记为保存后赋值（未映射字段视为保存前）
    pub fn is_after_save(&self, field: &str) -> bool {
        self.get(field).map(FieldSpec::set_after_save).unwrap_or(false)
    }

    /// 解析为 slug → 领域字段 查找表
    ///
    /// # 参数
    /// - schema: 目标实体结构；提供时拒绝实体上不存在且没有自定义赋值逻辑的字段
    ///
    /// # 错误
    /// - ConfigurationError: 缺少列名 / 列名为空 / slug 为空 / slug 冲突 / 未知字段
    pub fn resolve(&self, schema: Option<&EntitySchema>) -> ImportResult<SlugifiedColumnMapping> {
        let mut by_slug: HashMap<String, String> = HashMap::with_capacity(self.fields.len());

        for (field, spec) in &self.fields {
            let label = match spec.name.as_deref() {
                Some(label) if !label.trim().is_empty() => label,
                Some(_) => return Err(ImportError::configuration(field, "列名不能为空")),
                None => {
                    return Err(ImportError::configuration(
                        field,
                        format!("缺少列映射 \"{}\" 的 name", field),
                    ))
                }
            };

            let slug = slugify(label);
            if slug.is_empty() {
                return Err(ImportError::configuration(
                    field,
                    format!("列名 \"{}\" 规范化后为空", label),
                ));
            }

            if let Some(schema) = schema {
                if spec.import_logic.is_none() && !schema.has_column(field) {
                    return Err(ImportError::configuration(
                        field,
                        format!("实体 {} 上不存在该字段", schema.table),
                    ));
                }
            }

            if let Some(existing) = by_slug.get(&slug) {
                return Err(ImportError::configuration(
                    field,
                    format!("列 \"{}\" 与字段 {} 映射到同一列 ({})", label, existing, slug),
                ));
            }

            by_slug.insert(slug, field.clone());
        }

        debug!(fields = by_slug.len(), "列映射解析完成");
        Ok(SlugifiedColumnMapping { by_slug })
    }
}

// ==========================================
// SlugifiedColumnMapping - 每次导入临时构建
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlugifiedColumnMapping {
    by_slug: HashMap<String, String>,
}

impl SlugifiedColumnMapping {
    /// 按原始列标签查找领域字段（先规范化）
    pub fn field_for_label(&self, label: &str) -> Option<&str> {
        self.field_for_slug(&slugify(label))
    }

    pub fn field_for_slug(&self, slug: &str) -> Option<&str> {
        self.by_slug.get(slug).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_slug.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_slug.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_slug.iter().map(|(s, f)| (s.as_str(), f.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{EntityColumn, Record};

    type Mapping = ColumnMapping<'static, Record>;

    fn contacts_schema() -> EntitySchema {
        EntitySchema::new("contacts", "id")
            .with_column(EntityColumn::new("name"))
            .with_column(EntityColumn::new("email"))
    }

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Name"), "name");
        assert_eq!(slugify("E-mail Address"), "e_mail_address");
        assert_eq!(slugify("  Phone (mobile) "), "phone_mobile");
        assert_eq!(slugify("--Total--"), "total");
        assert_eq!(slugify("材料号"), "材料号");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_slugify_idempotent() {
        for label in ["Name", "E-mail Address", "a__b", "Ünïcode Côlumn", "状态时间(天)"] {
            let once = slugify(label);
            assert_eq!(slugify(&once), once);
        }
    }

    #[test]
    fn test_resolve_label_and_structured() {
        let mapping = Mapping::new()
            .field("name", "Name")
            .field("email", FieldSpec::structured(Some("E-mail".to_string())));

        let resolved = mapping.resolve(Some(&contacts_schema())).unwrap();

        assert_eq!(resolved.len(), mapping.len());
        assert_eq!(resolved.field_for_label("NAME"), Some("name"));
        assert_eq!(resolved.field_for_label("e mail"), Some("email"));
        assert_eq!(resolved.field_for_label("Phone"), None);
    }

    #[test]
    fn test_resolve_missing_name() {
        let mapping = Mapping::new().field("email", FieldSpec::structured(None));

        let err = mapping.resolve(None).unwrap_err();

        match err {
            ImportError::ConfigurationError { field, message } => {
                assert_eq!(field, "email");
                assert!(message.contains("name"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_empty_label() {
        let mapping = Mapping::new().field("name", "  ");
        assert!(mapping.resolve(None).unwrap_err().is_configuration());
    }

    #[test]
    fn test_resolve_rejects_slug_collision() {
        let mapping = Mapping::new()
            .field("name", "Full Name")
            .field("email", "full-name");

        let err = mapping.resolve(None).unwrap_err();

        assert!(matches!(err, ImportError::ConfigurationError { ref field, .. } if field == "email"));
    }

    #[test]
    fn test_resolve_rejects_unknown_field() {
        let mapping = Mapping::new().field("nickname", "Nickname");

        let err = mapping.resolve(Some(&contacts_schema())).unwrap_err();

        assert!(err.is_configuration());
    }

    #[test]
    fn test_resolve_allows_unknown_field_with_import_logic() {
        let mapping = Mapping::new().field(
            "full_name",
            FieldSpec::label("Full Name").with_import_logic(|_, _, _, _| Ok(())),
        );

        assert!(mapping.resolve(Some(&contacts_schema())).is_ok());
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut mapping = Mapping::new().field("name", "Name").field("email", "Email");
        mapping.insert("name", FieldSpec::label("Full Name").after_save());

        let fields: Vec<&str> = mapping.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["name", "email"]);
        assert!(mapping.is_after_save("name"));
        assert!(!mapping.is_after_save("email"));
    }
}
