//! 命令行参数定义

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tabular_import::ImportSettings;

#[derive(Parser)]
#[command(
    name = "tabular-import",
    version,
    about = "表格数据导入 - 按导入配置将 Excel/CSV 写入 SQLite 数据表",
    long_about = "按 JSON 导入配置（列映射、校验规则、更新键）读取 Excel/CSV 文件，\n\
                  整批校验通过后在单个事务内写入目标数据表。\n\n\
                  退出码: 0 成功, 1 校验失败, 2 持久化失败, 3 配置或文件错误"
)]
pub struct Cli {
    /// 待导入的表格文件（.xlsx/.xlsm/.xls/.xlsb/.ods/.csv）
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// 导入配置（JSON）
    #[arg(long = "profile", short = 'p', value_name = "PATH")]
    pub profile: PathBuf,

    /// 数据库文件（默认: $TABULAR_IMPORT_DB_PATH 或用户数据目录）
    #[arg(long = "db", value_name = "PATH")]
    pub db: Option<String>,

    /// 覆盖配置中的表头行（1 起）
    #[arg(long = "heading-row", value_name = "N")]
    pub heading_row: Option<usize>,

    /// 覆盖配置中的工作表下标（0 起）
    #[arg(long = "sheet", value_name = "INDEX")]
    pub sheet_index: Option<usize>,

    /// 覆盖配置中的更新键字段
    #[arg(long = "update-field", value_name = "FIELD")]
    pub update_field: Option<String>,

    /// 覆盖配置中的消息语言（en, zh-CN）
    #[arg(long = "locale", value_name = "LOCALE")]
    pub locale: Option<String>,

    /// 结果输出格式
    #[arg(long = "output", value_enum, default_value = "text")]
    pub output: OutputFormatArg,

    /// 日志格式（pretty 便于阅读，json 便于采集）
    #[arg(long = "log-format", value_enum, default_value = "pretty")]
    pub log_format: LogFormatArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

impl Cli {
    /// 命令行参数优先于配置文件
    pub fn apply_overrides(&self, settings: &mut ImportSettings) {
        if let Some(heading_row) = self.heading_row {
            settings.heading_row = heading_row;
        }
        if let Some(sheet_index) = self.sheet_index {
            settings.sheet_index = sheet_index;
        }
        if let Some(field) = &self.update_field {
            settings.update_field = Some(field.clone());
        }
        if let Some(locale) = &self.locale {
            settings.locale = locale.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_apply_overrides() {
        let cli = Cli::parse_from([
            "tabular-import",
            "contacts.csv",
            "--profile",
            "contacts.json",
            "--heading-row",
            "3",
            "--update-field",
            "email",
        ]);
        let mut settings = ImportSettings::default();

        cli.apply_overrides(&mut settings);

        assert_eq!(cli.input, PathBuf::from("contacts.csv"));
        assert_eq!(settings.heading_row, 3);
        assert_eq!(settings.update_field.as_deref(), Some("email"));
        assert_eq!(settings.locale, "en");
    }
}
