// ==========================================
// 表格导入引擎 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 文件错误 / 配置错误 / 校验失败 / 持久化失败
// ==========================================

use crate::domain::validation::ValidationErrors;
use thiserror::Error;

/// 回调与存储错误统一装箱，保留 source 链
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xlsm/.xls/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("工作表不存在: 索引 {0}")]
    SheetNotFound(usize),

    #[error("表头行不存在: 第 {0} 行")]
    HeadingRowNotFound(usize),

    // ===== 配置错误 =====
    #[error("导入配置错误 (字段 {field}): {message}")]
    ConfigurationError { field: String, message: String },

    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== 数据校验 =====
    #[error("数据校验失败: {0}")]
    ValidationFailure(ValidationErrors),

    // ===== 持久化 =====
    #[error("持久化失败{}: {source}", describe_row(.row_number))]
    PersistenceFailure {
        row_number: Option<usize>,
        source: BoxError,
    },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn describe_row(row_number: &Option<usize>) -> String {
    match row_number {
        Some(row) => format!(" (行 {})", row),
        None => String::new(),
    }
}

impl ImportError {
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        ImportError::ConfigurationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn persistence(row_number: Option<usize>, source: impl Into<BoxError>) -> Self {
        ImportError::PersistenceFailure {
            row_number,
            source: source.into(),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ImportError::ConfigurationError { .. } | ImportError::ConfigReadError { .. }
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
