// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试文件生成等功能
// ==========================================
#![allow(dead_code)]

use rusqlite::Connection;
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use tabular_import::SqliteEntityStore;
use tempfile::{Builder, NamedTempFile};

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = Connection::open(&db_path)?;

    // 初始化 schema
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 初始化数据库 schema
fn init_schema(conn: &Connection) -> Result<(), Box<dyn Error>> {
    // 联系人表: 导入目标
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT,
            age INTEGER,
            status TEXT DEFAULT 'active',
            avatar_path TEXT,
            joined_on TEXT
        )
        "#,
        [],
    )?;

    // 复合主键表: 不支持作为导入目标
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS contact_tags (
            contact_id INTEGER NOT NULL,
            tag TEXT NOT NULL,
            PRIMARY KEY (contact_id, tag)
        )
        "#,
        [],
    )?;

    Ok(())
}

/// 创建测试数据库并打开 contacts 表的实体存储
pub fn open_contacts_store() -> (NamedTempFile, SqliteEntityStore) {
    tabular_import::logging::init_test();
    let (temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let store = SqliteEntityStore::open(&db_path, "contacts").expect("打开实体存储失败");
    (temp_file, store)
}

/// 生成临时 CSV 文件（逐行写入）
pub fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut temp_file = Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("创建临时文件失败");
    for line in lines {
        writeln!(temp_file, "{}", line).expect("写入临时文件失败");
    }
    temp_file.flush().expect("刷新临时文件失败");
    temp_file
}

/// tests/fixtures 下的测试文件路径
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// 生成临时 JSON 导入配置文件
pub fn write_profile(json: &str) -> NamedTempFile {
    let mut temp_file = Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("创建临时文件失败");
    temp_file
        .write_all(json.as_bytes())
        .expect("写入临时文件失败");
    temp_file
}
