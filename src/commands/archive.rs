use crate::output;
use crate::storage::{ArchiveStore, EntryHealth, Fingerprint};
use crate::tasks::TaskError;
use crate::utils::format_size;
use anyhow::{Context, Result};
use std::path::Path;

/// Execute `archive list` - one line per entry with blob size and record count
///
/// # Errors
///
/// Returns an error if the archive cannot be listed
pub fn list(archive: &Path) -> Result<(), TaskError> {
    let store = ArchiveStore::open(archive)?;
    let entries = store.entries()?;

    for fingerprint in &entries {
        let summary = store.summarize(*fingerprint)?;
        println!(
            "{}  {:>10}  {} record(s)",
            summary.fingerprint,
            format_size(summary.blob_size),
            summary.records
        );
    }

    output::info(&format!("{} entr{}", entries.len(), plural_y(entries.len())));
    Ok(())
}

/// Execute `archive show` - print the provenance records of one entry
///
/// # Errors
///
/// Returns an error if the fingerprint is malformed, the entry does not
/// exist, or its log cannot be read
pub fn show(archive: &Path, fingerprint: &str) -> Result<(), TaskError> {
    let store = ArchiveStore::open(archive)?;
    let fingerprint: Fingerprint = fingerprint
        .parse()
        .context("Expected an archive entry name")?;

    if !store.contains(fingerprint) {
        return Err(anyhow::anyhow!(
            "No archive entry {fingerprint} in {}",
            store.root().display()
        )
        .into());
    }

    for record in store.provenance(fingerprint)? {
        print!("{}", record.to_line());
    }
    Ok(())
}

/// Execute `archive verify` - re-hash every blob against its entry name
///
/// Nothing is repaired; damaged entries are reported.
///
/// # Errors
///
/// Returns an alarm if any entry is damaged, and a failure if the archive
/// cannot be read
pub fn verify(archive: &Path) -> Result<(), TaskError> {
    let store = ArchiveStore::open(archive)?;
    let entries = store.entries()?;
    output::info(&format!("Verifying {} archive entries...", entries.len()));

    let damaged = find_damaged(&store, &entries)?;
    for (fingerprint, health) in &damaged {
        match health {
            EntryHealth::MissingBlob => {
                output::error(&format!("{fingerprint}: blob missing"));
            }
            EntryHealth::Mismatch { actual } => {
                output::error(&format!("{fingerprint}: blob content hashes to {actual}"));
            }
            EntryHealth::Intact => {}
        }
    }

    if damaged.is_empty() {
        output::success(&format!("All {} entries intact", entries.len()));
        Ok(())
    } else {
        Err(TaskError::alarm(format!(
            "{} of {} archive entries damaged",
            damaged.len(),
            entries.len()
        )))
    }
}

/// Entries whose blob is missing or does not hash to the entry name.
fn find_damaged(
    store: &ArchiveStore,
    entries: &[Fingerprint],
) -> Result<Vec<(Fingerprint, EntryHealth)>> {
    let mut damaged = Vec::new();
    for &fingerprint in entries {
        let health = store.verify_entry(fingerprint)?;
        output::verbose(&format!("{fingerprint}: {health:?}"));
        if health != EntryHealth::Intact {
            damaged.push((fingerprint, health));
        }
    }
    Ok(damaged)
}

const fn plural_y(n: usize) -> &'static str {
    if n == 1 { "y" } else { "ies" }
}
