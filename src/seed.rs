use std::path::Path;

use serde::Serialize;

use crate::store::{CharacterStore, NewCharacter, StoreError};

/// Outcome of loading seed characters into a store
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
    pub rejected: usize,
}

/// Reads a JSON array of create payloads (`house` / `strength` given by name)
pub async fn load_seed_file(path: &Path) -> Result<Vec<NewCharacter>, StoreError> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Inserts each record through the normal create path; names already present are skipped
pub async fn seed_store(store: &dyn CharacterStore, records: Vec<NewCharacter>) -> Result<SeedReport, StoreError> {
    let mut report = SeedReport::default();

    for record in records {
        let name = record.name.clone();
        match store.create(record).await {
            Ok(_) => report.inserted += 1,
            Err(StoreError::Duplicate(_)) => {
                tracing::debug!("Seed character '{}' already exists", name);
                report.skipped += 1;
            }
            Err(StoreError::Validation { message, field_errors }) => {
                tracing::warn!("Seed character '{}' rejected: {} {:?}", name, message, field_errors);
                report.rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        "Seeded {} store: {} inserted, {} skipped, {} rejected",
        store.backend().as_str(),
        report.inserted,
        report.skipped,
        report.rejected
    );
    Ok(report)
}
