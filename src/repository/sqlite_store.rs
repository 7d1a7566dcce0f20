// ==========================================
// 表格导入引擎 - SQLite 实体存储
// ==========================================
// 职责: 按表结构读写动态实体 Record
// 约束: 单列 INTEGER 主键；所有值参数化绑定，标识符统一加引号
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::cell::CellValue;
use crate::domain::record::{EntityColumn, EntitySchema, Record};
use crate::repository::entity_store::{Entity, EntityStore};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// 引用 SQL 标识符
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

// ==========================================
// Record 的实体能力
// ==========================================
impl Entity for Record {
    fn id(&self) -> Option<i64> {
        Record::id(self)
    }

    fn get_field(&self, field: &str) -> Option<&CellValue> {
        self.get(field)
    }

    fn set_field(&mut self, field: &str, value: CellValue) -> RepositoryResult<()> {
        if !self.schema().has_column(field) {
            return Err(RepositoryError::UnknownField {
                table: self.schema().table.clone(),
                field: field.to_string(),
            });
        }
        self.put(field, value);
        Ok(())
    }

    fn clone_as_new(&self) -> Self {
        let mut fresh = self.clone();
        fresh.set_id(None);
        fresh
    }
}

// ==========================================
// SqliteEntityStore
// ==========================================
pub struct SqliteEntityStore {
    conn: Arc<Mutex<Connection>>,
    schema: Arc<EntitySchema>,
}

impl SqliteEntityStore {
    /// 打开数据库并绑定目标表
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - table: 目标表名
    pub fn open(db_path: &str, table: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::for_table(Arc::new(Mutex::new(conn)), table)
    }

    /// 从已有连接创建，读取表结构
    ///
    /// # 错误
    /// - TableNotFound: 表不存在
    /// - UnsupportedSchema: 主键不是单列 INTEGER
    pub fn for_table(conn: Arc<Mutex<Connection>>, table: &str) -> RepositoryResult<Self> {
        let schema = {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            introspect(&guard, table)?
        };

        debug!(
            table = %schema.table,
            primary_key = %schema.primary_key,
            columns = schema.columns.len(),
            "读取表结构"
        );

        Ok(Self {
            conn,
            schema: Arc::new(schema),
        })
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 空白原型实体（导入时的新建模板）
    pub fn new_prototype(&self) -> Record {
        Record::new(Arc::clone(&self.schema))
    }

    /// 按主键查询
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Record>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            self.select_list(),
            quote_ident(&self.schema.table),
            quote_ident(&self.schema.primary_key)
        );
        let record = conn
            .query_row(&sql, params![id], |row| self.read_record(row))
            .optional()?;
        Ok(record)
    }

    /// 全部记录（按主键排序）
    pub fn find_all(&self) -> RepositoryResult<Vec<Record>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            self.select_list(),
            quote_ident(&self.schema.table),
            quote_ident(&self.schema.primary_key)
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map([], |row| self.read_record(row))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(&self.schema.table));
        let count = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    fn select_list(&self) -> String {
        std::iter::once(self.schema.primary_key.as_str())
            .chain(self.schema.column_names())
            .map(quote_ident)
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn read_record(&self, row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
        let mut record = Record::new(Arc::clone(&self.schema));
        record.set_id(row.get::<_, Option<i64>>(0)?);
        for (idx, column) in self.schema.columns.iter().enumerate() {
            record.put(column.name.clone(), row.get::<_, CellValue>(idx + 1)?);
        }
        Ok(record)
    }

    fn transaction_statement(&self, sql: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(sql)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
    }
}

/// PRAGMA table_info 读取表结构
fn introspect(conn: &Connection, table: &str) -> RepositoryResult<EntitySchema> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;

    // (name, type, notnull, dflt_value, pk)
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                row.get::<_, i64>(3)? != 0,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    if rows.is_empty() {
        return Err(RepositoryError::TableNotFound(table.to_string()));
    }

    let primary_keys: Vec<&(String, String, bool, Option<String>, i64)> =
        rows.iter().filter(|r| r.4 > 0).collect();
    let primary_key = match primary_keys.as_slice() {
        [pk] if pk.1.to_uppercase().contains("INT") => pk.0.clone(),
        [pk] => {
            return Err(RepositoryError::UnsupportedSchema {
                table: table.to_string(),
                message: format!("主键 {} 不是 INTEGER 类型", pk.0),
            })
        }
        _ => {
            return Err(RepositoryError::UnsupportedSchema {
                table: table.to_string(),
                message: format!("需要单列主键，实际 {} 列", primary_keys.len()),
            })
        }
    };

    let schema = rows
        .into_iter()
        .filter(|r| r.4 == 0)
        .fold(EntitySchema::new(table, primary_key), |schema, r| {
            schema.with_column(EntityColumn {
                name: r.0,
                declared_type: r.1,
                not_null: r.2,
                default_value: r.3,
            })
        });
    Ok(schema)
}

impl EntityStore for SqliteEntityStore {
    type Entity = Record;

    fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    fn find_one_by(&mut self, field: &str, value: &CellValue) -> RepositoryResult<Option<Record>> {
        if !self.schema.is_queryable(field) {
            return Err(RepositoryError::UnknownField {
                table: self.schema.table.clone(),
                field: field.to_string(),
            });
        }

        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1 ORDER BY {} LIMIT 1",
            self.select_list(),
            quote_ident(&self.schema.table),
            quote_ident(field),
            quote_ident(&self.schema.primary_key)
        );
        let record = conn
            .query_row(&sql, params![value], |row| self.read_record(row))
            .optional()?;
        Ok(record)
    }

    fn save(&mut self, entity: &mut Record) -> RepositoryResult<()> {
        if !entity.is_new() {
            return self.update(entity);
        }

        let conn = self.get_conn()?;
        let table = quote_ident(&self.schema.table);
        let (columns, values): (Vec<&str>, Vec<&CellValue>) = entity.values().unzip();

        if columns.is_empty() {
            conn.execute(&format!("INSERT INTO {} DEFAULT VALUES", table), [])?;
        } else {
            let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", "),
                placeholders.join(", ")
            );
            conn.execute(&sql, params_from_iter(values))?;
        }

        let id = conn.last_insert_rowid();
        drop(conn);
        entity.set_id(Some(id));
        Ok(())
    }

    fn update(&mut self, entity: &Record) -> RepositoryResult<()> {
        let id = entity
            .id()
            .ok_or_else(|| RepositoryError::MissingIdentifier(self.schema.table.clone()))?;

        let (columns, mut values): (Vec<&str>, Vec<&CellValue>) = entity.values().unzip();
        if columns.is_empty() {
            return Ok(());
        }

        let assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = ?{}", quote_ident(c), i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote_ident(&self.schema.table),
            assignments.join(", "),
            quote_ident(&self.schema.primary_key),
            columns.len() + 1
        );

        let id_value = CellValue::Integer(id);
        values.push(&id_value);

        let conn = self.get_conn()?;
        conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    fn begin(&mut self) -> RepositoryResult<()> {
        self.transaction_statement("BEGIN IMMEDIATE")
    }

    fn commit(&mut self) -> RepositoryResult<()> {
        self.transaction_statement("COMMIT")
    }

    fn rollback(&mut self) -> RepositoryResult<()> {
        self.transaction_statement("ROLLBACK")
    }
}
