// ==========================================
// 表格导入引擎 - 内置规则校验引擎
// ==========================================
// 职责: 对整批映射行逐行、逐字段执行规则，收集全部违规项（不短路）
// 约定: 空白值仅由 required 检查；distinct 在整批范围内判重
// ==========================================

use crate::domain::cell::CellValue;
use crate::domain::row::MappedRow;
use crate::domain::validation::{ValidationError, ValidationErrors};
use crate::i18n;
use crate::importer::import_traits::ValidationEngine;
use crate::importer::rules::{Rule, RuleSet};
use std::collections::HashMap;

static BLANK: CellValue = CellValue::Blank;

/// 规则校验引擎
///
/// 消息优先取调用方预展开的 messages["<row_index>.<field>.<rule>"]，
/// 缺省时按 locale 查找规则消息模板
#[derive(Debug, Clone)]
pub struct RuleEngine {
    locale: String,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new("en")
    }
}

impl RuleEngine {
    pub fn new(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    #[allow(clippy::too_many_arguments)]
    fn violation(
        &self,
        row_index: usize,
        row: &MappedRow,
        field: &str,
        attribute: &str,
        rule: &Rule,
        numeric: bool,
        messages: &HashMap<String, String>,
    ) -> ValidationError {
        let key = format!("{}.{}.{}", row_index, field, rule.name());
        let template = messages
            .get(&key)
            .cloned()
            .unwrap_or_else(|| i18n::t_in(&self.locale, &rule.message_key(numeric)));

        let placeholders = rule.placeholders();
        let mut args: Vec<(&str, &str)> = vec![("attribute", attribute)];
        args.extend(placeholders.iter().map(|(k, v)| (*k, v.as_str())));

        ValidationError {
            row_index,
            row_number: row.row_number(),
            field: field.to_string(),
            rule: rule.name().to_string(),
            message: i18n::replace_args(template, &args),
        }
    }
}

/// 整批判重: 返回出现多次的非空值
fn duplicated_values(payload: &[MappedRow], field: &str) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for row in payload {
        if let Some(value) = row.get(field).filter(|v| !v.is_blank()) {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }
    }
    counts.retain(|_, count| *count > 1);
    counts
}

impl ValidationEngine for RuleEngine {
    fn validate(
        &self,
        payload: &[MappedRow],
        rules: &[(String, RuleSet)],
        messages: &HashMap<String, String>,
        attributes: &HashMap<String, String>,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (path, rule_set) in rules {
            let field = path.strip_prefix("*.").unwrap_or(path);
            let attribute = attributes
                .get(path)
                .map(String::as_str)
                .unwrap_or(field);
            let numeric = rule_set.is_numeric();

            let duplicates = if rule_set.contains("distinct") {
                duplicated_values(payload, field)
            } else {
                HashMap::new()
            };

            for (row_index, row) in payload.iter().enumerate() {
                let value = row.get(field).unwrap_or(&BLANK);

                for rule in rule_set.iter() {
                    if value.is_blank() && !rule.is_implicit() {
                        continue;
                    }

                    let passed = if rule.is_batch_rule() {
                        !duplicates.contains_key(&value.to_string())
                    } else {
                        rule.passes(value, numeric)
                    };

                    if !passed {
                        errors.push(self.violation(
                            row_index, row, field, attribute, rule, numeric, messages,
                        ));
                    }
                }
            }
        }

        if errors.is_empty() {
            return Ok(());
        }
        errors.sort();
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::rules::RuleSpec;

    fn rules(entries: &[(&str, &str)]) -> Vec<(String, RuleSet)> {
        entries
            .iter()
            .map(|(field, expr)| {
                let path = format!("*.{}", field);
                let set = RuleSet::parse(field, &RuleSpec::from(*expr)).unwrap();
                (path, set)
            })
            .collect()
    }

    fn rows() -> Vec<MappedRow> {
        vec![
            MappedRow::new(2).with("email", "ann@x.com").with("age", "30"),
            MappedRow::new(3).with("email", CellValue::Blank).with("age", "abc"),
            MappedRow::new(4).with("email", "ann@x.com").with("age", "12"),
        ]
    }

    #[test]
    fn test_validate_passes() {
        let engine = RuleEngine::default();
        let payload = vec![MappedRow::new(2).with("email", "ann@x.com")];

        let result = engine.validate(
            &payload,
            &rules(&[("email", "required|email")]),
            &HashMap::new(),
            &HashMap::new(),
        );

        assert!(result.is_ok());
    }

    #[test]
    fn test_blank_values_only_checked_by_required() {
        let engine = RuleEngine::default();

        let errors = engine
            .validate(
                &rows(),
                &rules(&[("email", "required|email")]),
                &HashMap::new(),
                &HashMap::new(),
            )
            .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(errors.get("1.email.required").is_some());
        assert!(errors.get("1.email.email").is_none());
    }

    #[test]
    fn test_collects_all_errors_with_row_numbers() {
        let engine = RuleEngine::default();

        let errors = engine
            .validate(
                &rows(),
                &rules(&[("age", "integer|min:18")]),
                &HashMap::new(),
                &HashMap::new(),
            )
            .unwrap_err();

        // 行 1: integer 失败，min 无法取数值同样失败；行 2: min 失败
        let keys: Vec<String> = errors.iter().map(|e| e.key()).collect();
        assert_eq!(keys, vec!["1.age.integer", "1.age.min", "2.age.min"]);
        let error = errors.iter().last().unwrap();
        assert_eq!(error.row_number, 4);
        assert_eq!(error.message, "The age must be at least 18.");
    }

    #[test]
    fn test_distinct_flags_every_duplicate() {
        let engine = RuleEngine::default();

        let errors = engine
            .validate(
                &rows(),
                &rules(&[("email", "distinct")]),
                &HashMap::new(),
                &HashMap::new(),
            )
            .unwrap_err();

        let keys: Vec<String> = errors.iter().map(|e| e.key()).collect();
        assert_eq!(keys, vec!["0.email.distinct", "2.email.distinct"]);
    }

    #[test]
    fn test_custom_messages_and_attributes() {
        let engine = RuleEngine::new("zh-CN");
        let mut messages = HashMap::new();
        messages.insert(
            "1.email.required".to_string(),
            "Row 3: %{attribute} is mandatory".to_string(),
        );
        let mut attributes = HashMap::new();
        attributes.insert("*.email".to_string(), "E-mail address".to_string());

        let errors = engine
            .validate(&rows(), &rules(&[("email", "required")]), &messages, &attributes)
            .unwrap_err();

        assert_eq!(
            errors.get("1.email.required"),
            Some("Row 3: E-mail address is mandatory")
        );
    }

    #[test]
    fn test_locale_fallback_message() {
        let engine = RuleEngine::new("zh-CN");

        let errors = engine
            .validate(&rows(), &rules(&[("email", "required")]), &HashMap::new(), &HashMap::new())
            .unwrap_err();

        assert_eq!(errors.get("1.email.required"), Some("email 不能为空。"));
    }
}
