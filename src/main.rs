use std::fs::File;
use std::io::{self, BufReader};
use std::process::ExitCode;

use dojang_progress::config::Config;
use dojang_progress::engine::ProgressEngine;
use dojang_progress::logging;
use dojang_progress::replay::replay;
use dojang_progress::store::MemoryStore;

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = logging::init_tracing(&config);

    let engine = ProgressEngine::from_config(MemoryStore::new(), &config);
    let stdout = io::stdout();

    let result = match std::env::args().nth(1).as_deref() {
        None | Some("-") => replay(&engine, io::stdin().lock(), stdout.lock()),
        Some(path) => match File::open(path) {
            Ok(file) => replay(&engine, BufReader::new(file), stdout.lock()),
            Err(err) => {
                tracing::error!(path, error = %err, "failed to open event log");
                return ExitCode::FAILURE;
            }
        },
    };

    match result {
        Ok(summary) => {
            tracing::info!(
                applied = summary.applied,
                rejected = summary.rejected,
                malformed = summary.malformed,
                learners = engine.store().learners().len(),
                "replay finished"
            );
            if summary.rejected + summary.malformed > 0 {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            tracing::error!(error = %err, "replay aborted");
            ExitCode::FAILURE
        }
    }
}
