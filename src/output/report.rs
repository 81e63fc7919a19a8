//! JSON report export

use crate::aggregate::CensusReport;
use crate::storage::write_json_atomic;
use crate::CensusError;
use std::path::Path;

/// Writes the report as pretty JSON, replacing `path` atomically
pub fn export_report(report: &CensusReport, path: &Path) -> Result<(), CensusError> {
    write_json_atomic(path, report)?;
    tracing::info!(
        "Report with {} pages written to {}",
        report.page_count,
        path.display()
    );
    Ok(())
}
