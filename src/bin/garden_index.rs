//! Offline search index build step.
//!
//! Reads the note corpus from its fixed location and writes the JSON search
//! artifact to the static output path. Takes no flags. Exits 0 on success,
//! including the empty/missing-corpus case; exits non-zero only on an
//! unexpected internal error.

use std::process::ExitCode;

use garden::search::builder::{write_index, IndexConfig};

fn main() -> ExitCode {
    env_logger::init();

    let config = IndexConfig::default();
    match write_index(&config) {
        Ok(count) => {
            log::info!(
                "[garden-index] {} documents -> {}",
                count,
                config.output_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("[garden-index] build failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
