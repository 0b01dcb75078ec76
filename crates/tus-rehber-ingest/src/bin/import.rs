use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    if args.len() != 4 {
        eprintln!("usage: tus-rehber-import <institutions.csv> <placements.csv> <db-path>");
        return ExitCode::from(2);
    }
    let institutions_csv = PathBuf::from(&args[1]);
    let placements_csv = PathBuf::from(&args[2]);
    let db_path = PathBuf::from(&args[3]);

    match tus_rehber_ingest::run_import(&institutions_csv, &placements_csv, &db_path) {
        Ok(report) => {
            info!(
                institutions = report.institutions,
                placements = report.placements,
                skipped_institution_rows = report.skipped_institution_rows,
                skipped_placement_rows = report.skipped_placement_rows,
                "import completed"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("import failed: {e}");
            ExitCode::FAILURE
        }
    }
}
