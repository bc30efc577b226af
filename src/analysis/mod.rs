//! Analysis layer: energy-window statistics, histograms and the orchestrator
//! that combines them into one response.

pub mod aggregate;
pub mod histogram;
pub mod ranges;
pub mod request;

use std::path::Path;

pub use aggregate::{aggregate, AggregateResult, PlotGroup, SingleParticle, ViewMode};
pub use request::AnalysisRequest;

use crate::data::loader::{load_file, parse_table};
use crate::error::AnalysisError;

/// Parse an upload and aggregate it.
pub fn analyze_bytes(raw: &[u8], request: &AnalysisRequest) -> Result<AggregateResult, AnalysisError> {
    let table = parse_table(raw).map_err(|e| {
        log::error!("failed to parse upload: {e:#}");
        AnalysisError::Processing(format!("Error processing file: {e}"))
    })?;

    if table.is_empty() {
        return Err(AnalysisError::NoData("No valid data found in file".to_string()));
    }

    aggregate(&table, request.view_mode, request.bin_count, request.log_scale)
}

/// Load a file (delimited text or persisted Parquet table) and aggregate it.
/// `request.group_id` scopes Parquet inputs to one group.
pub fn analyze_file(path: &Path, request: &AnalysisRequest) -> Result<AggregateResult, AnalysisError> {
    let table = load_file(path, request.group_id.as_deref()).map_err(|e| {
        log::error!("failed to load {}: {e:#}", path.display());
        AnalysisError::Processing(format!("Error processing file: {e:#}"))
    })?;

    if table.is_empty() {
        let message = match &request.group_id {
            Some(group) => format!("No valid data found for group {group}"),
            None => "No valid data found in file".to_string(),
        };
        return Err(AnalysisError::NoData(message));
    }

    aggregate(&table, request.view_mode, request.bin_count, request.log_scale)
}
