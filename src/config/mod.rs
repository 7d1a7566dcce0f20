// ==========================================
// 表格导入引擎 - 配置层
// ==========================================
// 职责: 导入设置与 JSON 导入配置
// ==========================================

pub mod import_profile;
pub mod import_settings;

pub use import_profile::{ColumnConfig, ImportProfile};
pub use import_settings::ImportSettings;
