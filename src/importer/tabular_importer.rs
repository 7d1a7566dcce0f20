// ==========================================
// 表格导入引擎 - 导入器
// ==========================================
// 流程: 读取 → 列映射解析 → 行投影 → 批量校验 → 集合覆写短路
//       → 空白行过滤 → 事务内逐行持久化
// 约定: 配置错误在读取文件之前暴露；校验作用于未过滤的整批行
// ==========================================

use crate::config::import_settings::ImportSettings;
use crate::domain::outcome::ImportReport;
use crate::domain::row::{MappedRow, RawRow};
use crate::domain::types::PersistencePath;
use crate::importer::batch_validator::BatchValidator;
use crate::importer::column_mapping::{ColumnMapping, SlugifiedColumnMapping};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalReader;
use crate::importer::hooks::{Hook, HookRegistry};
use crate::importer::import_traits::{SpreadsheetReader, ValidationEngine};
use crate::importer::overrides::Overrides;
use crate::importer::persistence::{PersistStats, PersistenceEngine};
use crate::importer::row_projector::{filter_blank_rows, project};
use crate::importer::rules::RuleSpec;
use crate::importer::validation_engine::RuleEngine;
use crate::repository::entity_store::EntityStore;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn, Span};
use uuid::Uuid;

// ==========================================
// Importer - 单个导入任务的全部配置
// ==========================================
// 钩子、覆写与映射归本实例所有；原型实体与存储由调用方借出
pub struct Importer<'a, S: EntityStore> {
    settings: ImportSettings,
    mapping: ColumnMapping<'a, S::Entity>,
    rules: Vec<(String, RuleSpec)>,
    attributes: HashMap<String, String>,
    hooks: HookRegistry<'a, S::Entity>,
    overrides: Overrides<'a, S>,
    reader: Box<dyn SpreadsheetReader + 'a>,
    engine: Option<Box<dyn ValidationEngine + 'a>>,
}

impl<S: EntityStore> Default for Importer<'_, S> {
    fn default() -> Self {
        Self::with_settings(ImportSettings::default())
    }
}

impl<'a, S: EntityStore> Importer<'a, S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: ImportSettings) -> Self {
        Self {
            settings,
            mapping: ColumnMapping::new(),
            rules: Vec::new(),
            attributes: HashMap::new(),
            hooks: HookRegistry::new(),
            overrides: Overrides::default(),
            reader: Box::new(UniversalReader),
            engine: None,
        }
    }

    // ===== 设置 =====

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    pub fn set_heading_row(&mut self, heading_row: usize) -> &mut Self {
        self.settings.heading_row = heading_row;
        self
    }

    pub fn set_sheet_index(&mut self, sheet_index: usize) -> &mut Self {
        self.settings.sheet_index = sheet_index;
        self
    }

    pub fn set_update_field(&mut self, field: impl Into<String>) -> &mut Self {
        self.settings.update_field = Some(field.into());
        self
    }

    pub fn set_locale(&mut self, locale: impl Into<String>) -> &mut Self {
        self.settings.locale = locale.into();
        self
    }

    // ===== 映射与校验 =====

    pub fn set_column_mapping(&mut self, mapping: ColumnMapping<'a, S::Entity>) -> &mut Self {
        self.mapping = mapping;
        self
    }

    pub fn column_mapping(&self) -> &ColumnMapping<'a, S::Entity> {
        &self.mapping
    }

    /// 按当前覆写配置决定的持久化路径
    pub fn persistence_path(&self) -> PersistencePath {
        self.overrides.path()
    }

    /// 字段 → 规则；保持声明顺序
    pub fn set_validation_rules<K, V>(&mut self, rules: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<RuleSpec>,
    {
        self.rules = rules
            .into_iter()
            .map(|(field, spec)| (field.into(), spec.into()))
            .collect();
        self
    }

    /// 字段 → 显示名（替换消息中的 %{attribute}）
    pub fn set_validation_attributes<K, V>(
        &mut self,
        attributes: impl IntoIterator<Item = (K, V)>,
    ) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.attributes = attributes
            .into_iter()
            .map(|(field, label)| (field.into(), label.into()))
            .collect();
        self
    }

    // ===== 覆写与钩子 =====

    pub fn set_row_override(
        &mut self,
        f: impl FnMut(&mut S, &MappedRow) -> anyhow::Result<()> + 'a,
    ) -> &mut Self {
        self.overrides.set_row(f);
        self
    }

    pub fn set_collection_override(
        &mut self,
        f: impl FnMut(&mut S, &[MappedRow]) -> anyhow::Result<()> + 'a,
    ) -> &mut Self {
        self.overrides.set_collection(f);
        self
    }

    /// 注册钩子；同一钩子点后注册覆盖先注册
    pub fn add_hook(&mut self, hook: Hook<'a, S::Entity>) -> &mut Self {
        self.hooks.register(hook);
        self
    }

    // ===== 外部协作方 =====

    pub fn with_reader(mut self, reader: impl SpreadsheetReader + 'a) -> Self {
        self.reader = Box::new(reader);
        self
    }

    pub fn with_validation_engine(mut self, engine: impl ValidationEngine + 'a) -> Self {
        self.engine = Some(Box::new(engine));
        self
    }

    // ==========================================
    // 导入入口
    // ==========================================

    /// 从表格文件导入
    ///
    /// # 参数
    /// - path: 表格文件
    /// - store: 目标实体存储
    /// - prototype: 新建实体的原型（仅借用）
    ///
    /// # 返回
    /// - Ok(ImportReport): 全部行已持久化或已交由集合覆写
    /// - Err(ValidationFailure): 任一行校验失败，未持久化任何行
    /// - Err(PersistenceFailure): 持久化失败，事务已回滚
    /// - Err(其他): 配置错误或文件错误
    #[instrument(skip_all, fields(import_id))]
    pub fn import_file(
        &mut self,
        path: impl AsRef<Path>,
        store: &mut S,
        prototype: &S::Entity,
    ) -> ImportResult<ImportReport> {
        let started = (Instant::now(), Utc::now());
        let import_id = Uuid::new_v4().to_string();
        Span::current().record("import_id", import_id.as_str());

        let path = path.as_ref();
        info!(import_id = %import_id, file = %path.display(), "开始导入");

        // 配置错误先于读取文件暴露
        let (slug_mapping, validator) = self.prepare(store)?;

        debug!("步骤 1: 读取文件");
        let raw_rows = self
            .reader
            .read(path, self.settings.heading_row, self.settings.sheet_index)
            .inspect_err(|e| error!(error = %e, "文件读取失败"))?;

        self.execute(import_id, started, raw_rows, &slug_mapping, &validator, store, prototype)
    }

    /// 导入已解析的原始行（读取器由调用方负责）
    #[instrument(skip_all, fields(import_id))]
    pub fn import_rows(
        &mut self,
        raw_rows: Vec<RawRow>,
        store: &mut S,
        prototype: &S::Entity,
    ) -> ImportResult<ImportReport> {
        let started = (Instant::now(), Utc::now());
        let import_id = Uuid::new_v4().to_string();
        Span::current().record("import_id", import_id.as_str());
        info!(import_id = %import_id, rows = raw_rows.len(), "开始导入");

        let (slug_mapping, validator) = self.prepare(store)?;
        self.execute(import_id, started, raw_rows, &slug_mapping, &validator, store, prototype)
    }

    /// 校验设置、解析映射、编译规则
    fn prepare(&self, store: &S) -> ImportResult<(SlugifiedColumnMapping, BatchValidator)> {
        self.settings.validate()?;

        let schema = store.schema();
        if let Some(field) = &self.settings.update_field {
            if !schema.is_queryable(field) {
                return Err(ImportError::configuration(
                    "update_field",
                    format!("更新键 {} 不是实体 {} 的字段", field, schema.table),
                ));
            }
        }

        let slug_mapping = self.mapping.resolve(Some(schema))?;
        let validator = BatchValidator::compile(&self.rules, &self.attributes, &self.settings.locale)?;
        Ok((slug_mapping, validator))
    }

    #[allow(clippy::too_many_arguments)]
    fn execute(
        &mut self,
        import_id: String,
        started: (Instant, DateTime<Utc>),
        raw_rows: Vec<RawRow>,
        slug_mapping: &SlugifiedColumnMapping,
        validator: &BatchValidator,
        store: &mut S,
        prototype: &S::Entity,
    ) -> ImportResult<ImportReport> {
        let (clock, started_at) = started;
        let total_rows = raw_rows.len();

        debug!("步骤 2: 行投影");
        let mapped = project(&raw_rows, slug_mapping, self.settings.first_row_number());

        debug!("步骤 3: 批量校验");
        let default_engine;
        let engine: &dyn ValidationEngine = match &self.engine {
            Some(engine) => engine.as_ref(),
            None => {
                default_engine = RuleEngine::new(self.settings.locale.as_str());
                &default_engine
            }
        };
        validator
            .validate(engine, &mapped)
            .inspect_err(|e| warn!(error = %e, "校验未通过，未持久化任何行"))?;

        let path = self.overrides.path();

        debug!(path = ?path, rows = mapped.len(), "步骤 4: 持久化");
        let (stats, blank_rows_skipped) = match self.overrides.collection.as_mut() {
            // 集合覆写: 接管未过滤的整批，不开启事务，不触发钩子
            Some(handler) => {
                handler(&mut *store, &mapped).map_err(|e| ImportError::persistence(None, e))?;
                let stats = PersistStats {
                    overridden: mapped.len(),
                    ..Default::default()
                };
                (stats, 0)
            }
            None => {
                let (rows, blank_rows_skipped) = filter_blank_rows(mapped);
                let engine = PersistenceEngine::<S>::new(
                    &self.mapping,
                    self.settings.update_field.as_deref(),
                );
                let stats = engine.persist(
                    store,
                    prototype,
                    &rows,
                    &mut self.hooks,
                    self.overrides.row.as_mut(),
                )?;
                (stats, blank_rows_skipped)
            }
        };

        let elapsed_ms = clock.elapsed().as_millis() as u64;
        info!(
            import_id = %import_id,
            total = total_rows,
            created = stats.created,
            updated = stats.updated,
            overridden = stats.overridden,
            blank_skipped = blank_rows_skipped,
            elapsed_ms = elapsed_ms,
            "导入完成"
        );

        Ok(ImportReport {
            import_id,
            total_rows,
            blank_rows_skipped,
            created: stats.created,
            updated: stats.updated,
            overridden: stats.overridden,
            path,
            started_at,
            elapsed_ms,
        })
    }
}
