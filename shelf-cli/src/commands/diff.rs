//! `shelf diff <record-id>`: show what an export would change.

use anyhow::{Context, Result};
use clap::Args;

use shelf_core::RecordId;

use super::Session;

/// Arguments for `shelf diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Record to preview.
    pub record_id: String,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let session = Session::open()?;
        let diff = session
            .orchestrator
            .diff_record(&RecordId::from(self.record_id.clone()))
            .with_context(|| format!("diff failed for '{}'", self.record_id))?;

        if diff.is_empty() {
            println!("No differences for '{}'.", self.record_id);
            return Ok(());
        }

        print!("{}", diff.unified_diff);
        if !diff.unified_diff.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}
