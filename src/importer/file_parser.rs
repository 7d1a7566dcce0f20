// ==========================================
// 表格导入引擎 - 表格读取器实现
// ==========================================
// 职责: 阶段 0 文件读取与解析
// 支持: Excel (.xlsx/.xlsm/.xls/.xlsb/.ods) / CSV (.csv)
// 约定: 表头行可配置，表头之后的行原样返回（含空白行）
// ==========================================

use crate::domain::cell::CellValue;
use crate::domain::row::RawRow;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_traits::SpreadsheetReader;
use calamine::{open_workbook_auto, Data, ExcelDateTime, Reader};
use chrono::Timelike;
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use tracing::debug;

const EXCEL_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// 小写扩展名
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn ensure_heading_row(heading_row: usize) -> ImportResult<()> {
    if heading_row == 0 {
        return Err(ImportError::configuration(
            "heading_row",
            "表头行号从 1 开始",
        ));
    }
    Ok(())
}

/// 按表头组装一行；缺失单元格补 Blank，表头为空的列丢弃
fn build_row(headers: &[String], mut cell_at: impl FnMut(usize) -> CellValue) -> RawRow {
    let mut row = RawRow::new();
    for (col_idx, header) in headers.iter().enumerate() {
        if header.is_empty() {
            continue;
        }
        row.push(header.clone(), cell_at(col_idx));
    }
    row
}

// ==========================================
// CSV Reader 实现
// ==========================================
pub struct CsvReader;

/// 物理行索引: 按字节偏移查行号（\n、\r\n、单独的 \r 均计为换行）
struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    fn new(bytes: &[u8]) -> Self {
        let mut line_starts = vec![0];
        for (idx, &b) in bytes.iter().enumerate() {
            let is_break = b == b'\n' || (b == b'\r' && bytes.get(idx + 1) != Some(&b'\n'));
            if is_break {
                line_starts.push(idx + 1);
            }
        }
        Self { line_starts }
    }

    /// 偏移所在的物理行（1 起）
    fn line_at(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset)
    }
}

fn is_line_break(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

/// 记录的 (首行, 末行)
///
/// csv 的记录位置指向上一条记录之后，被跳过的空行包含在内，需按字节重新定位
fn record_lines(bytes: &[u8], lines: &LineIndex, start: usize, end: usize) -> (usize, usize) {
    let end = end.min(bytes.len());
    let first = (start..end)
        .find(|&i| !is_line_break(bytes[i]))
        .unwrap_or(start);
    let last = (first..end)
        .rev()
        .find(|&i| !is_line_break(bytes[i]))
        .unwrap_or(first);
    (lines.line_at(first), lines.line_at(last))
}

impl SpreadsheetReader for CsvReader {
    fn read(
        &self,
        path: &Path,
        heading_row: usize,
        _sheet_index: usize,
    ) -> ImportResult<Vec<RawRow>> {
        ensure_exists(path)?;
        ensure_heading_row(heading_row)?;

        let ext = extension_of(path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let bytes = std::fs::read(path)?;
        let lines = LineIndex::new(&bytes);
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes.as_slice());

        let mut headers: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        let mut record = StringRecord::new();
        let mut last_line = 0;

        while reader.read_record(&mut record)? {
            let start = record.position().map_or(0, |p| p.byte() as usize);
            let end = reader.position().byte() as usize;
            let (first_line, end_line) = record_lines(&bytes, &lines, start, end);

            if let Some(headers) = headers.as_ref() {
                // csv 跳过的空行按全空白行补齐
                for _ in (last_line + 1)..first_line {
                    rows.push(build_row(headers, |_| CellValue::Blank));
                }
                rows.push(build_row(headers, |col_idx| {
                    record.get(col_idx).map(CellValue::text).unwrap_or_default()
                }));
            } else if first_line == heading_row {
                headers = Some(
                    record
                        .iter()
                        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
                        .collect(),
                );
            } else if first_line > heading_row {
                // 表头行为空行
                return Err(ImportError::HeadingRowNotFound(heading_row));
            }
            last_line = end_line;
        }

        if headers.is_none() {
            return Err(ImportError::HeadingRowNotFound(heading_row));
        }

        debug!(file = %path.display(), rows = rows.len(), "CSV 解析完成");
        Ok(rows)
    }
}

// ==========================================
// Excel Reader 实现
// ==========================================
pub struct ExcelReader;

impl ExcelReader {
    fn cell_value(cell: &Data) -> CellValue {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Blank,
            Data::String(s) => CellValue::text(s.as_str()),
            Data::Int(i) => CellValue::Integer(*i),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => Self::datetime_value(dt),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.as_str()),
        }
    }

    /// 日期单元格转 ISO 文本（零点只保留日期）；时长转 HH:MM:SS
    fn datetime_value(dt: &ExcelDateTime) -> CellValue {
        if dt.is_datetime() {
            if let Some(value) = dt.as_datetime() {
                let text = if value.time().num_seconds_from_midnight() == 0 {
                    value.format("%Y-%m-%d").to_string()
                } else {
                    value.format("%Y-%m-%d %H:%M:%S").to_string()
                };
                return CellValue::text(text);
            }
        } else if let Some(duration) = dt.as_duration() {
            let secs = duration.num_seconds();
            return CellValue::text(format!(
                "{:02}:{:02}:{:02}",
                secs / 3600,
                (secs % 3600) / 60,
                secs % 60
            ));
        }
        CellValue::Number(dt.as_f64())
    }
}

impl SpreadsheetReader for ExcelReader {
    fn read(
        &self,
        path: &Path,
        heading_row: usize,
        sheet_index: usize,
    ) -> ImportResult<Vec<RawRow>> {
        ensure_exists(path)?;
        ensure_heading_row(heading_row)?;

        let ext = extension_of(path);
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(sheet_index)
            .ok_or(ImportError::SheetNotFound(sheet_index))??;

        // Range 从第一个非空单元格开始，需换算为物理行
        let start_row = match range.start() {
            Some((row, _)) => row as usize,
            None => return Err(ImportError::HeadingRowNotFound(heading_row)),
        };
        let heading_idx = heading_row - 1;
        if heading_idx < start_row {
            return Err(ImportError::HeadingRowNotFound(heading_row));
        }

        let mut sheet_rows = range.rows().skip(heading_idx - start_row);
        let header_row = sheet_rows
            .next()
            .ok_or(ImportError::HeadingRowNotFound(heading_row))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let rows: Vec<RawRow> = sheet_rows
            .map(|data_row| {
                build_row(&headers, |col_idx| {
                    data_row
                        .get(col_idx)
                        .map(Self::cell_value)
                        .unwrap_or_default()
                })
            })
            .collect();

        debug!(
            file = %path.display(),
            sheet_index = sheet_index,
            rows = rows.len(),
            "Excel 解析完成"
        );
        Ok(rows)
    }
}

// ==========================================
// 通用读取器（根据扩展名自动选择）
// ==========================================
pub struct UniversalReader;

impl SpreadsheetReader for UniversalReader {
    fn read(
        &self,
        path: &Path,
        heading_row: usize,
        sheet_index: usize,
    ) -> ImportResult<Vec<RawRow>> {
        let ext = extension_of(path);

        match ext.as_str() {
            "csv" => CsvReader.read(path, heading_row, sheet_index),
            e if EXCEL_EXTENSIONS.contains(&e) => ExcelReader.read(path, heading_row, sheet_index),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
