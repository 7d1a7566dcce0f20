// ==========================================
// 表格导入引擎 - 导入结果
// ==========================================

use crate::domain::types::PersistencePath;
use crate::domain::validation::ValidationErrors;
use crate::importer::error::{ImportError, ImportResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ImportReport - 成功导入的统计
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub import_id: String,            // 导入 ID（日志关联）
    pub total_rows: usize,            // 读取到的数据行数
    pub blank_rows_skipped: usize,    // 过滤掉的空白行
    pub created: usize,               // 新建实体数
    pub updated: usize,               // 更新实体数
    pub overridden: usize,            // 交由覆写回调处理的行数
    pub path: PersistencePath,        // 持久化路径
    pub started_at: DateTime<Utc>,    // 开始时间
    pub elapsed_ms: u64,              // 耗时（毫秒）
}

impl ImportReport {
    /// 实际进入持久化阶段的行数
    pub fn persisted_rows(&self) -> usize {
        self.created + self.updated + self.overridden
    }
}

// ==========================================
// ImportOutcome - 导入结论
// ==========================================
// 配置错误与文件错误不属于导入结论，保持为 Err
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportOutcome {
    Success {
        report: ImportReport,
    },
    ValidationFailure {
        errors: ValidationErrors,
    },
    PersistenceFailure {
        row_number: Option<usize>,
        message: String,
    },
}

impl ImportOutcome {
    pub fn from_result(result: ImportResult<ImportReport>) -> ImportResult<Self> {
        let err = match result {
            Ok(report) => return Ok(ImportOutcome::Success { report }),
            Err(err) => err,
        };
        match err {
            ImportError::ValidationFailure(errors) => {
                Ok(ImportOutcome::ValidationFailure { errors })
            }
            ImportError::PersistenceFailure { row_number, .. } => {
                Ok(ImportOutcome::PersistenceFailure {
                    row_number,
                    message: format_error_chain(&err),
                })
            }
            other => Err(other),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ImportOutcome::Success { .. })
    }
}

/// 展开错误链，形如 "外层: 内层: 根因"
fn format_error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
