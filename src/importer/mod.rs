// ==========================================
// 表格导入引擎 - 导入层
// ==========================================
// 职责: 表格行 → 领域实体（映射、校验、事务化持久化）
// 支持: Excel, CSV, 已解析的原始行
// ==========================================

// 模块声明
pub mod batch_validator;
pub mod column_mapping;
pub mod error;
pub mod file_parser;
pub mod hooks;
pub mod import_traits;
pub mod overrides;
pub mod persistence;
pub mod row_projector;
pub mod rules;
pub mod tabular_importer;
pub mod validation_engine;

// 重导出核心类型
pub use batch_validator::BatchValidator;
pub use column_mapping::{slugify, ColumnMapping, FieldSpec, ImportLogic, SlugifiedColumnMapping};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvReader, ExcelReader, UniversalReader};
pub use hooks::{Hook, HookPoint, HookRegistry};
pub use overrides::{CollectionOverride, RowOverride};
pub use persistence::{PersistStats, PersistenceEngine};
pub use rules::{Rule, RuleSet, RuleSpec};
pub use tabular_importer::Importer;
pub use validation_engine::RuleEngine;

// 重导出 Trait 接口
pub use import_traits::{SpreadsheetReader, ValidationEngine};
