// ==========================================
// 表格导入引擎 - 行投影
// ==========================================
// 职责: 原始行 (列标签 → 值) 投影为映射行 (领域字段 → 值)
// 约定: 未映射列静默丢弃；行数进出一致，空白行过滤放在校验之后
// ==========================================

use crate::domain::row::{MappedRow, RawRow};
use crate::importer::column_mapping::SlugifiedColumnMapping;
use tracing::debug;

/// 投影整批原始行
///
/// # 参数
/// - rows: 读取器输出
/// - mapping: 本次导入的 slug → 字段 查找表
/// - first_row_number: 第一条数据行的物理行号（表头行 + 1）
///
/// # 返回
/// 与输入等长、同序的映射行
pub fn project(
    rows: &[RawRow],
    mapping: &SlugifiedColumnMapping,
    first_row_number: usize,
) -> Vec<MappedRow> {
    rows.iter()
        .enumerate()
        .map(|(idx, raw)| project_row(raw, mapping, first_row_number + idx))
        .collect()
}

fn project_row(raw: &RawRow, mapping: &SlugifiedColumnMapping, row_number: usize) -> MappedRow {
    let mut mapped = MappedRow::new(row_number);
    for (label, value) in raw.iter() {
        if let Some(field) = mapping.field_for_label(label) {
            mapped.insert(field, value.clone());
        }
    }
    mapped
}

/// 过滤全空白行，返回 (保留行, 跳过行数)
pub fn filter_blank_rows(rows: Vec<MappedRow>) -> (Vec<MappedRow>, usize) {
    let total = rows.len();
    let kept: Vec<MappedRow> = rows.into_iter().filter(|r| !r.is_blank()).collect();
    let skipped = total - kept.len();

    if skipped > 0 {
        debug!(skipped = skipped, "过滤空白行");
    }
    (kept, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cell::CellValue;
    use crate::domain::record::Record;
    use crate::importer::column_mapping::ColumnMapping;

    fn contacts_mapping() -> SlugifiedColumnMapping {
        ColumnMapping::<Record>::new()
            .field("name", "Name")
            .field("email", "E-mail")
            .resolve(None)
            .unwrap()
    }

    #[test]
    fn test_project_drops_unmapped_columns() {
        let rows = vec![RawRow::new()
            .with("Name", "Ann")
            .with("E-MAIL", "ann@x.com")
            .with("Notes", "vip")];

        let mapped = project(&rows, &contacts_mapping(), 2);

        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].row_number(), 2);
        assert_eq!(mapped[0].get("name"), Some(&CellValue::text("Ann")));
        assert_eq!(mapped[0].get("email"), Some(&CellValue::text("ann@x.com")));
        assert!(mapped[0].fields().all(|f| f == "name" || f == "email"));
    }

    #[test]
    fn test_project_preserves_count_and_order() {
        let rows = vec![
            RawRow::new().with("Name", "Ann"),
            RawRow::new().with("Name", CellValue::Blank),
            RawRow::new().with("Name", "Bob"),
        ];

        let mapped = project(&rows, &contacts_mapping(), 5);

        // 空白行保留到校验之后
        assert_eq!(mapped.len(), 3);
        let numbers: Vec<usize> = mapped.iter().map(|r| r.row_number()).collect();
        assert_eq!(numbers, vec![5, 6, 7]);
        assert_eq!(mapped[2].get("name"), Some(&CellValue::text("Bob")));
    }

    #[test]
    fn test_filter_blank_rows() {
        let rows = vec![
            MappedRow::new(2).with("name", "Ann"),
            MappedRow::new(3).with("name", CellValue::Blank),
            MappedRow::new(4),
        ];

        let (kept, skipped) = filter_blank_rows(rows);

        assert_eq!(kept.len(), 1);
        assert_eq!(skipped, 2);
        assert_eq!(kept[0].row_number(), 2);
    }
}
