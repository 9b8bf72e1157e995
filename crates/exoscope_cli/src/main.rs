//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `exoscope_core` linkage, configuration and store bootstrap.
//! - Keep output deterministic for quick local sanity checks.

use exoscope_core::db::open_db_from_config;
use exoscope_core::{
    init_logging_from_config, AnalysisQuery, AnalysisService, CoreConfig,
    SqliteAnalysisRepository,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("exoscope_core ping={}", exoscope_core::ping());
    println!("exoscope_core version={}", exoscope_core::core_version());

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("exoscope_cli error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    init_logging_from_config(&config).map_err(|err| err.to_string())?;

    let mut conn = open_db_from_config(&config).map_err(|err| err.to_string())?;
    let service = AnalysisService::new(SqliteAnalysisRepository::new(&mut conn));
    let count = service.count().map_err(|err| err.to_string())?;
    let first_page = config.page_request(0).map_err(|err| err.to_string())?;
    let newest = service
        .list(&AnalysisQuery::default().with_page(first_page))
        .map_err(|err| err.to_string())?;

    let store = config
        .db_path
        .as_deref()
        .map_or_else(|| "memory".to_string(), |path| path.display().to_string());
    println!("exoscope_core store={store} analyses={count}");
    for item in &newest.items {
        println!(
            "analysis id={} classification={} probability={}",
            item.id, item.metrics.classification, item.metrics.probability
        );
    }
    log::info!("event=cli_probe module=cli status=ok analyses={count}");
    Ok(())
}
