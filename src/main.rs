// ==========================================
// 表格导入引擎 - 命令行入口
// ==========================================

use clap::Parser;
use tabular_import::domain::ImportOutcome;
use tabular_import::i18n::{self, t_with_args};
use tabular_import::{db, logging, ImportError, ImportProfile, SqliteEntityStore};
use tracing::{error, info};

mod cli;

use crate::cli::{Cli, LogFormatArg, OutputFormatArg};

const EXIT_SUCCESS: i32 = 0;
const EXIT_VALIDATION: i32 = 1;
const EXIT_PERSISTENCE: i32 = 2;
const EXIT_CONFIG: i32 = 3;

fn main() {
    let cli = Cli::parse();
    match cli.log_format {
        LogFormatArg::Pretty => logging::init(),
        LogFormatArg::Json => logging::init_json(),
    }

    info!(version = tabular_import::VERSION, "{}", tabular_import::APP_NAME);
    std::process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    let mut profile = match ImportProfile::from_file(&cli.profile) {
        Ok(profile) => profile,
        Err(e) => return abort(&e),
    };
    cli.apply_overrides(&mut profile.settings);
    i18n::set_locale(&profile.settings.locale);

    let db_path = cli.db.clone().unwrap_or_else(db::default_db_path);
    info!(db = %db_path, table = %profile.table, "打开目标数据表");

    let mut store = match SqliteEntityStore::open(&db_path, &profile.table) {
        Ok(store) => store,
        Err(e) => return abort(&ImportError::configuration("table", e.to_string())),
    };
    let prototype = store.new_prototype();

    let mut importer = profile.build_importer::<SqliteEntityStore>();
    let result = importer.import_file(&cli.input, &mut store, &prototype);

    let outcome = match ImportOutcome::from_result(result) {
        Ok(outcome) => outcome,
        Err(e) => return abort(&e),
    };

    print_outcome(&outcome, cli.output);
    match outcome {
        ImportOutcome::Success { .. } => EXIT_SUCCESS,
        ImportOutcome::ValidationFailure { .. } => EXIT_VALIDATION,
        ImportOutcome::PersistenceFailure { .. } => EXIT_PERSISTENCE,
    }
}

/// 配置或文件错误
fn abort(err: &ImportError) -> i32 {
    error!(error = %err, "导入中止");
    eprintln!("{}", t_with_args("cli.error", &[("message", &err.to_string())]));
    EXIT_CONFIG
}

fn print_outcome(outcome: &ImportOutcome, format: OutputFormatArg) {
    if let OutputFormatArg::Json = format {
        match serde_json::to_string_pretty(outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{}", t_with_args("cli.error", &[("message", &e.to_string())])),
        }
        return;
    }

    match outcome {
        ImportOutcome::Success { report } => {
            println!(
                "{}",
                t_with_args(
                    "cli.import_success",
                    &[
                        ("import_id", report.import_id.as_str()),
                        ("created", &report.created.to_string()),
                        ("updated", &report.updated.to_string()),
                        ("overridden", &report.overridden.to_string()),
                        ("skipped", &report.blank_rows_skipped.to_string()),
                        ("elapsed", &report.elapsed_ms.to_string()),
                    ],
                )
            );
        }
        ImportOutcome::ValidationFailure { errors } => {
            println!(
                "{}",
                t_with_args("cli.validation_failed", &[("count", &errors.len().to_string())])
            );
            for error in errors.iter() {
                println!("  {}", error.message);
            }
        }
        ImportOutcome::PersistenceFailure { message, .. } => {
            println!(
                "{}",
                t_with_args("cli.persistence_failed", &[("message", message.as_str())])
            );
        }
    }
}
