// ==========================================
// 表格导入引擎 - 领域层
// ==========================================
// 职责: 单元格值、行结构、动态实体、导入结果
// ==========================================

pub mod cell;
pub mod outcome;
pub mod record;
pub mod row;
pub mod types;
pub mod validation;

pub use cell::CellValue;
pub use outcome::{ImportOutcome, ImportReport};
pub use record::{EntityColumn, EntitySchema, Record};
pub use row::{MappedRow, RawRow};
pub use types::{Operation, PersistencePath};
pub use validation::{ValidationError, ValidationErrors};
