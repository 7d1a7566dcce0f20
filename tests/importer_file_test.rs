// ==========================================
// 表格导入引擎 - 文件导入端到端测试
// ==========================================
// 覆盖: CSV / xlsx 读取 → 映射 → 校验 → 持久化；导入配置文件驱动；文件错误
// ==========================================

mod test_helpers;

use std::collections::HashMap;
use std::path::Path;
use tabular_import::importer::rules::RuleSet;
use tabular_import::{
    ColumnMapping, ImportError, ImportOutcome, ImportProfile, ImportResult, Importer, MappedRow,
    PersistencePath, RawRow, Record, SpreadsheetReader, SqliteEntityStore, ValidationEngine,
    ValidationError, ValidationErrors,
};

/// 内存读取器: 不访问文件系统
struct FixedReader(Vec<RawRow>);

impl SpreadsheetReader for FixedReader {
    fn read(&self, _path: &Path, _heading_row: usize, _sheet_index: usize) -> ImportResult<Vec<RawRow>> {
        Ok(self.0.clone())
    }
}

/// 拒绝名单中的 email
struct BlocklistEngine(Vec<&'static str>);

impl ValidationEngine for BlocklistEngine {
    fn validate(
        &self,
        payload: &[MappedRow],
        _rules: &[(String, RuleSet)],
        messages: &HashMap<String, String>,
        _attributes: &HashMap<String, String>,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for (idx, row) in payload.iter().enumerate() {
            let email = row.get("email").map(|v| v.to_string()).unwrap_or_default();
            if self.0.contains(&email.as_str()) {
                let key = format!("{}.email.required", idx);
                errors.push(ValidationError {
                    row_index: idx,
                    row_number: row.row_number(),
                    field: "email".to_string(),
                    rule: "blocked".to_string(),
                    message: messages.get(&key).cloned().unwrap_or_else(|| "blocked".to_string()),
                });
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn contacts_importer<'a>() -> Importer<'a, SqliteEntityStore> {
    let mut importer: Importer<SqliteEntityStore> = Importer::new();
    importer.set_column_mapping(
        ColumnMapping::<Record>::new()
            .field("name", "Name")
            .field("email", "E-mail")
            .field("age", "Age"),
    );
    importer
}

#[test]
fn test_csv_import_end_to_end() {
    let (_db, mut store) = test_helpers::open_contacts_store();
    let prototype = store.new_prototype();
    let csv = test_helpers::write_csv(&[
        "Name,E-mail,Age,Notes",
        "Ann,ann@x.com,31,first",
        ",,,",
        "Bob,bob@x.com,45,",
    ]);

    let mut importer = contacts_importer();
    importer.set_validation_rules([("email", "email"), ("age", "integer|between:0,120")]);

    let report = importer.import_file(csv.path(), &mut store, &prototype).unwrap();

    assert_eq!(report.total_rows, 3);
    assert_eq!(report.blank_rows_skipped, 1);
    assert_eq!(report.created, 2);
    assert_eq!(report.path, PersistencePath::Default);
    assert!(!report.import_id.is_empty());

    let records = store.find_all().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].get("name").and_then(|v| v.as_str()), Some("Bob"));
    // 文本 "45" 按 INTEGER 列亲和性存储
    assert_eq!(records[1].get("age").and_then(|v| v.as_i64()), Some(45));
}

#[test]
fn test_csv_heading_row_offset() {
    let (_db, mut store) = test_helpers::open_contacts_store();
    let prototype = store.new_prototype();
    let csv = test_helpers::write_csv(&[
        "Contact export",
        "generated,2024-01-01",
        "Name,E-mail,Age",
        "Ann,ann@x.com,31",
        "Bob,bob-at-x,45",
    ]);

    let mut importer = contacts_importer();
    importer
        .set_heading_row(3)
        .set_validation_rules([("email", "email")]);

    let err = importer
        .import_file(csv.path(), &mut store, &prototype)
        .unwrap_err();

    let ImportError::ValidationFailure(errors) = err else {
        panic!("期望校验失败，实际: {:?}", err);
    };
    let error = errors.iter().next().unwrap();
    assert_eq!(error.row_index, 1);
    assert_eq!(error.row_number, 5);
    assert!(error.message.starts_with("Row 5:"), "{}", error.message);
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_csv_empty_line_keeps_physical_row_numbers() {
    let (_db, mut store) = test_helpers::open_contacts_store();
    let prototype = store.new_prototype();
    // 第 3 行是真正的空行（无分隔符）
    let csv = test_helpers::write_csv(&["Name,E-mail,Age", "Ann,ann@x.com,31", "", "Bob,bob-at-x,45"]);

    let mut importer = contacts_importer();
    importer.set_validation_rules([("email", "email")]);

    let err = importer
        .import_file(csv.path(), &mut store, &prototype)
        .unwrap_err();

    let ImportError::ValidationFailure(errors) = err else {
        panic!("期望校验失败，实际: {:?}", err);
    };
    assert_eq!(errors.len(), 1);
    let message = errors.get("2.email.email").expect("缺少 Bob 的校验错误");
    assert!(message.starts_with("Row 4:"), "{}", message);
    let error = errors.iter().next().unwrap();
    assert_eq!(error.row_index, 2);
    assert_eq!(error.row_number, 4);
}

#[test]
fn test_headers_are_matched_by_slug() {
    let (_db, mut store) = test_helpers::open_contacts_store();
    let prototype = store.new_prototype();
    // 表头大小写与空白不同，slug 一致
    let csv = test_helpers::write_csv(&["  NAME , e mail", "Ann,ann@x.com"]);

    let mut importer: Importer<SqliteEntityStore> = Importer::new();
    importer.set_column_mapping(
        ColumnMapping::<Record>::new()
            .field("name", "Name")
            .field("email", "E Mail"),
    );

    let report = importer.import_file(csv.path(), &mut store, &prototype).unwrap();

    assert_eq!(report.created, 1);
    let records = store.find_all().unwrap();
    assert_eq!(records[0].get("email").and_then(|v| v.as_str()), Some("ann@x.com"));
}

fn xlsx_importer<'a>() -> Importer<'a, SqliteEntityStore> {
    let mut importer = contacts_importer();
    importer.set_heading_row(3).set_sheet_index(1);
    importer
}

#[test]
fn test_xlsx_import_with_heading_offset_and_dates() {
    let (_db, mut store) = test_helpers::open_contacts_store();
    let prototype = store.new_prototype();
    let xlsx = test_helpers::fixture_path("contacts.xlsx");

    let mut importer: Importer<SqliteEntityStore> = Importer::new();
    importer
        .set_column_mapping(
            ColumnMapping::<Record>::new()
                .field("name", "Name")
                .field("email", "E-mail")
                .field("age", "Age")
                .field("joined_on", "Joined"),
        )
        .set_heading_row(3)
        .set_sheet_index(1)
        .set_validation_rules([("joined_on", "required|date")]);
    let err = importer
        .import_file(&xlsx, &mut store, &prototype)
        .unwrap_err();
    // 第 5 行整行为空，日期 required 失败
    let ImportError::ValidationFailure(errors) = err else {
        panic!("期望校验失败，实际: {:?}", err);
    };
    assert_eq!(errors.len(), 1);
    assert!(errors.get("1.joined_on.required").unwrap().starts_with("Row 5:"));

    importer.set_validation_rules([("joined_on", "date")]);
    let report = importer.import_file(&xlsx, &mut store, &prototype).unwrap();

    assert_eq!(report.total_rows, 3);
    assert_eq!(report.blank_rows_skipped, 1);
    assert_eq!(report.created, 2);
    let records = store.find_all().unwrap();
    assert_eq!(records[0].get("joined_on").and_then(|v| v.as_str()), Some("2024-01-01"));
    assert_eq!(records[1].get("joined_on").and_then(|v| v.as_str()), Some("2024-01-15"));
}

#[test]
fn test_xlsx_validation_reports_physical_row_number() {
    let (_db, mut store) = test_helpers::open_contacts_store();
    let prototype = store.new_prototype();

    let mut importer = xlsx_importer();
    importer.set_validation_rules([("age", "numeric|max:40")]);

    let err = importer
        .import_file(test_helpers::fixture_path("contacts.xlsx"), &mut store, &prototype)
        .unwrap_err();

    let ImportError::ValidationFailure(errors) = err else {
        panic!("期望校验失败，实际: {:?}", err);
    };
    let error = errors.iter().next().unwrap();
    assert_eq!(error.row_index, 2);
    assert_eq!(error.row_number, 6);
    assert!(error.message.starts_with("Row 6:"), "{}", error.message);
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_xlsx_sheet_index_out_of_range() {
    let (_db, mut store) = test_helpers::open_contacts_store();
    let prototype = store.new_prototype();

    let mut importer = xlsx_importer();
    importer.set_sheet_index(7);

    let err = importer
        .import_file(test_helpers::fixture_path("contacts.xlsx"), &mut store, &prototype)
        .unwrap_err();

    assert!(matches!(err, ImportError::SheetNotFound(7)));
}

#[test]
fn test_profile_driven_import() {
    let (_db, mut store) = test_helpers::open_contacts_store();
    let prototype = store.new_prototype();
    let profile_file = test_helpers::write_profile(
        r#"
        {
            "table": "contacts",
            "settings": { "heading_row": 1, "update_field": "email" },
            "columns": { "name": "Full name", "email": { "name": "E-mail" } },
            "rules": { "email": ["required", "email"] },
            "attributes": { "email": "E-mail address" }
        }
        "#,
    );
    let csv = test_helpers::write_csv(&[
        "Full name,E-mail",
        "Ann,ann@x.com",
        "Ann Lee,ann@x.com",
    ]);

    let profile = ImportProfile::from_file(profile_file.path()).unwrap();
    assert_eq!(profile.table, "contacts");

    let mut importer = profile.build_importer::<SqliteEntityStore>();
    let report = importer.import_file(csv.path(), &mut store, &prototype).unwrap();

    // 第二行按 email 命中第一行新建的实体
    assert_eq!(report.created, 1);
    assert_eq!(report.updated, 1);
    let records = store.find_all().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("name").and_then(|v| v.as_str()), Some("Ann Lee"));
}

#[test]
fn test_profile_attributes_in_messages() {
    let (_db, mut store) = test_helpers::open_contacts_store();
    let prototype = store.new_prototype();
    let profile = ImportProfile::from_json(
        r#"
        {
            "table": "contacts",
            "columns": { "name": "Name", "email": "E-mail" },
            "rules": { "email": "required" },
            "attributes": { "email": "E-mail address" }
        }
        "#,
    )
    .unwrap();
    let csv = test_helpers::write_csv(&["Name,E-mail", "Ann,"]);

    let result = profile
        .build_importer::<SqliteEntityStore>()
        .import_file(csv.path(), &mut store, &prototype);

    match ImportOutcome::from_result(result).unwrap() {
        ImportOutcome::ValidationFailure { errors } => {
            assert_eq!(
                errors.get("0.email.required"),
                Some("Row 2: The E-mail address field is required.")
            );
        }
        other => panic!("期望校验失败结论，实际: {:?}", other),
    }
}

#[test]
fn test_missing_file() {
    let (_db, mut store) = test_helpers::open_contacts_store();
    let prototype = store.new_prototype();

    let err = contacts_importer()
        .import_file(Path::new("/nonexistent/contacts.csv"), &mut store, &prototype)
        .unwrap_err();

    assert!(matches!(err, ImportError::FileNotFound(_)));
    assert!(ImportOutcome::from_result(Err(err)).is_err());
}

#[test]
fn test_unsupported_format() {
    let (_db, mut store) = test_helpers::open_contacts_store();
    let prototype = store.new_prototype();
    let file = test_helpers::write_profile("{}");

    let err = contacts_importer()
        .import_file(file.path(), &mut store, &prototype)
        .unwrap_err();

    assert!(matches!(err, ImportError::UnsupportedFormat(_)));
}

#[test]
fn test_configuration_error_precedes_file_read() {
    let (_db, mut store) = test_helpers::open_contacts_store();
    let prototype = store.new_prototype();

    let mut importer = contacts_importer();
    importer.set_update_field("nickname");

    // 文件不存在，但配置错误先暴露
    let err = importer
        .import_file(Path::new("/nonexistent/contacts.csv"), &mut store, &prototype)
        .unwrap_err();

    assert!(err.is_configuration());
}

#[test]
fn test_custom_reader_and_engine() {
    let (_db, mut store) = test_helpers::open_contacts_store();
    let prototype = store.new_prototype();
    let reader = FixedReader(vec![
        RawRow::new().with("Name", "Ann").with("E-mail", "ann@x.com"),
        RawRow::new().with("Name", "Eve").with("E-mail", "eve@x.com"),
    ]);

    let mut importer = contacts_importer()
        .with_reader(reader)
        .with_validation_engine(BlocklistEngine(vec!["eve@x.com"]));
    // 规则集非空时才会调用校验引擎
    importer.set_validation_rules([("email", "required")]);

    let err = importer
        .import_file("in-memory.csv", &mut store, &prototype)
        .unwrap_err();

    let ImportError::ValidationFailure(errors) = err else {
        panic!("期望校验失败，实际: {:?}", err);
    };
    assert_eq!(errors.for_row(1).count(), 1);
    assert_eq!(errors.for_row(0).count(), 0);
    let messages = errors.messages();
    assert!(messages["1.email.blocked"].starts_with("Row 3:"));
    assert_eq!(store.count().unwrap(), 0);
}
