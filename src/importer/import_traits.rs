// ==========================================
// 表格导入引擎 - 外部协作方 Trait
// ==========================================
// 职责: 定义读取器与校验引擎的接口（不包含实现）
// 实现者: file_parser::{CsvReader, ExcelReader, UniversalReader}
//         validation_engine::RuleEngine
// ==========================================

use crate::domain::row::{MappedRow, RawRow};
use crate::domain::validation::ValidationErrors;
use crate::importer::error::ImportResult;
use crate::importer::rules::RuleSet;
use std::collections::HashMap;
use std::path::Path;

// ==========================================
// SpreadsheetReader Trait
// ==========================================
// 用途: 将表格文件解析为原始行（阶段 0）
pub trait SpreadsheetReader: Send + Sync {
    /// 读取表格文件
    ///
    /// # 参数
    /// - path: 文件路径
    /// - heading_row: 表头所在物理行（1 起）
    /// - sheet_index: 工作表下标（0 起，CSV 忽略）
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 表头之后的所有行（含全空白行，保证行号对齐）
    /// - Err: 文件不存在、格式不支持、解析失败
    ///
    /// # 约定
    /// - 列标签按表头原样返回（仅 TRIM），规范化由映射解析负责
    /// - 缺失或空白单元格返回 CellValue::Blank
    fn read(&self, path: &Path, heading_row: usize, sheet_index: usize)
        -> ImportResult<Vec<RawRow>>;
}

// ==========================================
// ValidationEngine Trait
// ==========================================
// 用途: 对整批映射行执行规则校验
//
// 字段路径约定:
// - rules / attributes 的键为 "*.<field>"，表示批次内每一行的该字段
// - messages 的键为 "<row_index>.<field>.<rule>"，值为预展开的完整消息模板
pub trait ValidationEngine: Send + Sync {
    /// 校验整批数据
    ///
    /// # 返回
    /// - Ok(()): 全部通过
    /// - Err(ValidationErrors): 全部违规项（不短路）
    fn validate(
        &self,
        payload: &[MappedRow],
        rules: &[(String, RuleSet)],
        messages: &HashMap<String, String>,
        attributes: &HashMap<String, String>,
    ) -> Result<(), ValidationErrors>;
}
