// ==========================================
// 表格导入引擎 - 导入配置文件
// ==========================================
// 格式: JSON
// {
//   "table": "contacts",
//   "settings": { "heading_row": 1, "update_field": "email" },
//   "columns": { "name": "Name", "email": { "name": "E-mail", "set_after_save": false } },
//   "rules": { "email": "required|email", "code": ["required", "regex:^(a|b)$"] },
//   "attributes": { "email": "E-mail address" }
// }
// 注意: 自定义赋值逻辑与钩子只能通过代码注册
// ==========================================

use crate::config::import_settings::ImportSettings;
use crate::importer::column_mapping::{ColumnMapping, FieldSpec};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::rules::RuleSpec;
use crate::importer::tabular_importer::Importer;
use crate::repository::entity_store::EntityStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// 列配置: 列名字符串，或结构化配置（name 缺省时在解析映射阶段报错）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnConfig {
    Label(String),
    Detailed {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        set_after_save: bool,
    },
}

impl ColumnConfig {
    fn to_field_spec<'a, E>(&self) -> FieldSpec<'a, E> {
        match self {
            ColumnConfig::Label(label) => FieldSpec::label(label.clone()),
            ColumnConfig::Detailed {
                name,
                set_after_save,
            } => FieldSpec::structured(name.clone()).with_set_after_save(*set_after_save),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportProfile {
    /// 目标表
    pub table: String,

    #[serde(default)]
    pub settings: ImportSettings,

    /// 领域字段 → 列配置
    pub columns: BTreeMap<String, ColumnConfig>,

    /// 领域字段 → 规则
    #[serde(default)]
    pub rules: BTreeMap<String, RuleSpec>,

    /// 领域字段 → 显示名
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ImportProfile {
    pub fn from_json(json: &str) -> ImportResult<Self> {
        serde_json::from_str(json).map_err(|e| ImportError::ConfigReadError {
            key: "profile".to_string(),
            message: e.to_string(),
        })
    }

    /// 从文件读取
    ///
    /// # 错误
    /// - FileNotFound: 文件不存在
    /// - ConfigReadError: JSON 无法解析
    pub fn from_file(path: &Path) -> ImportResult<Self> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let json = std::fs::read_to_string(path)?;
        let profile: Self = serde_json::from_str(&json).map_err(|e| ImportError::ConfigReadError {
            key: path.display().to_string(),
            message: e.to_string(),
        })?;

        debug!(
            file = %path.display(),
            table = %profile.table,
            columns = profile.columns.len(),
            rules = profile.rules.len(),
            "导入配置已加载"
        );
        Ok(profile)
    }

    /// 按配置构建导入器
    pub fn build_importer<'a, S: EntityStore>(&self) -> Importer<'a, S> {
        let mapping = self
            .columns
            .iter()
            .fold(ColumnMapping::<S::Entity>::new(), |mapping, (field, column)| {
                mapping.field(field.as_str(), column.to_field_spec())
            });

        let mut importer = Importer::with_settings(self.settings.clone());
        importer
            .set_column_mapping(mapping)
            .set_validation_rules(self.rules.clone())
            .set_validation_attributes(self.attributes.clone());
        importer
    }
}
