use crate::types::Result;
use dialoguer::Confirm;
use std::path::Path;

pub fn index_reset_prompt(chunk_count: usize, index_path: &Path) -> String {
    let noun = if chunk_count == 1 { "chunk" } else { "chunks" };
    format!(
        "Drop all {chunk_count} indexed {noun} in {} and re-embed the corpus?",
        index_path.display()
    )
}

/// Asks before `ingest --rebuild` wipes the vector index. Defaults to no.
pub fn confirm_index_reset(chunk_count: usize, index_path: &Path) -> Result<bool> {
    let choice = Confirm::new()
        .with_prompt(index_reset_prompt(chunk_count, index_path))
        .default(false)
        .show_default(true)
        .interact()?;
    Ok(choice)
}
