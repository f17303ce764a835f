use std::path::Path;

use anyhow::Context;

use crate::app::open_store;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::seed::{load_seed_file, seed_store};

pub async fn handle(config: AppConfig, file: &Path, output_format: OutputFormat) -> anyhow::Result<()> {
    let records = load_seed_file(file).await.with_context(|| format!("failed to read seed file {}", file.display()))?;
    let store = open_store(&config).await?;
    let report = seed_store(store.as_ref(), records).await?;

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => println!(
            "Seeded {} characters ({} already present, {} rejected)",
            report.inserted, report.skipped, report.rejected
        ),
    }
    Ok(())
}
