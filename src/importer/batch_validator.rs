// ==========================================
// 表格导入引擎 - 批量校验
// ==========================================
// 职责: 字段规则展开为 "*.<field>"，按行预展开带行号前缀的消息，交由校验引擎
// 红线: 任一违规即整批失败，不存在部分成功
// ==========================================

use crate::domain::row::MappedRow;
use crate::i18n;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_traits::ValidationEngine;
use crate::importer::rules::{RuleSet, RuleSpec};
use std::collections::HashMap;
use tracing::{debug, info};

/// 编译后的批量校验器（导入前构建，规则错误在读取文件前暴露）
#[derive(Debug, Clone)]
pub struct BatchValidator {
    rules: Vec<(String, RuleSet)>,
    attributes: HashMap<String, String>,
    locale: String,
}

impl BatchValidator {
    /// 解析规则并展开为整批寻址
    ///
    /// # 参数
    /// - rules: 领域字段 → 规则写法（保持声明顺序）
    /// - attributes: 领域字段 → 显示名
    /// - locale: 消息语言
    ///
    /// # 错误
    /// - ConfigurationError: 规则无法解析
    pub fn compile(
        rules: &[(String, RuleSpec)],
        attributes: &HashMap<String, String>,
        locale: &str,
    ) -> ImportResult<Self> {
        let rules = rules
            .iter()
            .map(|(field, spec)| Ok((format!("*.{}", field), RuleSet::parse(field, spec)?)))
            .collect::<ImportResult<Vec<_>>>()?;

        let attributes = attributes
            .iter()
            .map(|(field, label)| (format!("*.{}", field), label.clone()))
            .collect();

        Ok(Self {
            rules,
            attributes,
            locale: locale.to_string(),
        })
    }

    /// 未声明任何规则时跳过校验
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 校验整批映射行
    ///
    /// # 返回
    /// - Ok(()): 全部通过或未声明规则
    /// - Err(ImportError::ValidationFailure): 全部违规项
    pub fn validate(&self, engine: &dyn ValidationEngine, rows: &[MappedRow]) -> ImportResult<()> {
        if self.is_empty() {
            debug!("未声明校验规则，跳过校验");
            return Ok(());
        }

        let messages = self.expand_messages(rows);
        match engine.validate(rows, &self.rules, &messages, &self.attributes) {
            Ok(()) => {
                debug!(rows = rows.len(), fields = self.rules.len(), "批量校验通过");
                Ok(())
            }
            Err(errors) => {
                info!(errors = errors.len(), "批量校验失败");
                Err(ImportError::ValidationFailure(errors))
            }
        }
    }

    /// 预展开消息: "<row_index>.<field>.<rule>" → "Row <n>: <规则消息模板>"
    fn expand_messages(&self, rows: &[MappedRow]) -> HashMap<String, String> {
        let rule_count: usize = self.rules.iter().map(|(_, set)| set.len()).sum();
        let mut messages = HashMap::with_capacity(rows.len() * rule_count);

        // 模板与行无关，只查一次
        let templates: Vec<(&str, Vec<(&str, String)>)> = self
            .rules
            .iter()
            .map(|(path, set)| {
                let field = path.strip_prefix("*.").unwrap_or(path);
                let numeric = set.is_numeric();
                let per_rule = set
                    .iter()
                    .map(|rule| (rule.name(), i18n::t_in(&self.locale, &rule.message_key(numeric))))
                    .collect();
                (field, per_rule)
            })
            .collect();

        for (row_index, row) in rows.iter().enumerate() {
            let row_number = row.row_number().to_string();
            let prefix = i18n::t_in_with_args(
                &self.locale,
                "validation.row_prefix",
                &[("row", row_number.as_str())],
            );

            for (field, per_rule) in &templates {
                for (rule, template) in per_rule {
                    messages.insert(
                        format!("{}.{}.{}", row_index, field, rule),
                        format!("{}{}", prefix, template),
                    );
                }
            }
        }

        messages
    }
}
