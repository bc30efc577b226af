use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::aggregate::ViewMode;
use super::histogram::effective_bin_count;

/// Parameters of one aggregation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Requested bin count; `None` or non-positive means the default.
    #[serde(default)]
    pub bin_count: Option<i64>,
    #[serde(default)]
    pub log_scale: bool,
    #[serde(default)]
    pub view_mode: ViewMode,
    /// Group scope for persisted tables; opaque to the core.
    #[serde(default)]
    pub group_id: Option<String>,
}

impl AnalysisRequest {
    /// Read the upload form fields `num_bins`, `log_scale`, `view_mode` and
    /// `group_id`.
    ///
    /// * `num_bins` that is not an integer counts as absent.
    /// * `log_scale` is on only for the literal `"true"`.
    /// * an unknown `view_mode` is logged and treated as `all`, rather than
    ///   producing a response without plots.
    pub fn from_form(form: &BTreeMap<String, String>) -> Self {
        let bin_count = form
            .get("num_bins")
            .and_then(|raw| raw.trim().parse::<i64>().ok());

        let log_scale = form.get("log_scale").is_some_and(|v| v == "true");

        let view_mode = match form.get("view_mode") {
            None => ViewMode::All,
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                log::warn!("{e}; using 'all'");
                ViewMode::All
            }),
        };

        let group_id = form
            .get("group_id")
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());

        AnalysisRequest {
            bin_count,
            log_scale,
            view_mode,
            group_id,
        }
    }

    /// Bin count the histograms will actually use.
    pub fn effective_bins(&self) -> usize {
        effective_bin_count(self.bin_count)
    }
}
