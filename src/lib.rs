// ==========================================
// 表格导入引擎 - 核心库
// ==========================================
// 职责: 表格行按声明式列映射与校验规则转换为领域实体，整批事务化持久化
// 技术栈: Rust + SQLite (rusqlite) + calamine / csv
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 单元格、行、实体、导入结果
pub mod domain;

// 导入层 - 映射、校验、持久化流程
pub mod importer;

// 数据仓储层 - 实体存储
pub mod repository;

// 配置层 - 导入设置与配置文件
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::{ImportProfile, ImportSettings};
pub use domain::{
    CellValue, EntitySchema, ImportOutcome, ImportReport, MappedRow, Operation, PersistencePath,
    RawRow, Record, ValidationError, ValidationErrors,
};
pub use importer::{
    ColumnMapping, FieldSpec, Hook, HookPoint, ImportError, ImportResult, Importer, RuleEngine,
    SpreadsheetReader, ValidationEngine,
};
pub use repository::{Entity, EntityStore, RepositoryError, SqliteEntityStore};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "tabular-import";
