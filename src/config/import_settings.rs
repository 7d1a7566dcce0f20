// ==========================================
// 表格导入引擎 - 导入设置
// ==========================================
// 封闭的设置集合: 表头行 / 工作表 / 更新键 / 消息语言
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};

fn default_heading_row() -> usize {
    1
}

fn default_locale() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    /// 表头所在物理行（1 起）
    #[serde(default = "default_heading_row")]
    pub heading_row: usize,

    /// 工作表下标（0 起，CSV 忽略）
    #[serde(default)]
    pub sheet_index: usize,

    /// 更新键字段；为空时仅新建
    #[serde(default)]
    pub update_field: Option<String>,

    /// 校验消息语言
    #[serde(default = "default_locale")]
    pub locale: String,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            heading_row: default_heading_row(),
            sheet_index: 0,
            update_field: None,
            locale: default_locale(),
        }
    }
}

impl ImportSettings {
    /// 第一条数据行的物理行号
    pub fn first_row_number(&self) -> usize {
        self.heading_row + 1
    }

    pub fn validate(&self) -> ImportResult<()> {
        if self.heading_row == 0 {
            return Err(ImportError::configuration("heading_row", "表头行号从 1 开始"));
        }
        if let Some(field) = &self.update_field {
            if field.trim().is_empty() {
                return Err(ImportError::configuration("update_field", "更新键不能为空字符串"));
            }
        }
        if self.locale.trim().is_empty() {
            return Err(ImportError::configuration("locale", "语言代码不能为空"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ImportSettings::default();
        assert_eq!(settings.heading_row, 1);
        assert_eq!(settings.first_row_number(), 2);
        assert_eq!(settings.locale, "en");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: ImportSettings =
            serde_json::from_str(r#"{"heading_row": 3, "update_field": "email"}"#).unwrap();

        assert_eq!(settings.heading_row, 3);
        assert_eq!(settings.sheet_index, 0);
        assert_eq!(settings.update_field.as_deref(), Some("email"));
        assert_eq!(settings.first_row_number(), 4);
    }

    #[test]
    fn test_validate_rejects_zero_heading_row() {
        let settings = ImportSettings {
            heading_row: 0,
            ..Default::default()
        };
        assert!(settings.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn test_validate_rejects_blank_update_field() {
        let settings = ImportSettings {
            update_field: Some(" ".to_string()),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
