use std::path::{Path, PathBuf};

use rusty_mass::analysis::{aggregate, AggregateResult, AnalysisRequest, ViewMode};
use rusty_mass::data::loader::load_file;
use rusty_mass::data::model::MeasurementTable;
use rusty_mass::data::store;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded table (None until user loads a file).
    pub table: Option<MeasurementTable>,

    /// File the table was loaded from.
    pub source: Option<PathBuf>,

    /// Group ids stored in the source, when it is a Parquet file.
    pub groups: Vec<String>,

    /// Current request parameters.
    pub request: AnalysisRequest,

    /// Charts and statistics for the current table and request (cached).
    pub result: Option<AggregateResult>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl AppState {
    pub fn new(request: AnalysisRequest) -> Self {
        Self {
            table: None,
            source: None,
            groups: Vec::new(),
            request,
            result: None,
            status_message: None,
            loading: false,
        }
    }

    /// Load `path` with the current group scope and rebuild the result.
    pub fn open(&mut self, path: &Path) {
        self.loading = true;
        self.groups = if is_parquet(path) {
            store::group_ids(path).unwrap_or_else(|e| {
                log::warn!("Could not list groups of {}: {e:#}", path.display());
                Vec::new()
            })
        } else {
            Vec::new()
        };
        let scope_still_exists = self
            .request
            .group_id
            .as_ref()
            .is_some_and(|g| self.groups.contains(g));
        if !scope_still_exists {
            self.request.group_id = None;
        }
        self.source = Some(path.to_path_buf());
        self.reload();
    }

    /// Re-read the current source, e.g. after the group scope changed.
    pub fn reload(&mut self) {
        let Some(path) = self.source.clone() else {
            return;
        };
        match load_file(&path, self.request.group_id.as_deref()) {
            Ok(table) => {
                log::info!("Loaded {} rows from {}", table.len(), path.display());
                self.set_table(table);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.table = None;
                self.result = None;
                self.status_message = Some(format!("Error: {e:#}"));
                self.loading = false;
            }
        }
    }

    /// Ingest a newly loaded table and aggregate it.
    pub fn set_table(&mut self, table: MeasurementTable) {
        self.table = Some(table);
        self.loading = false;
        self.recompute();
    }

    /// Recompute `result` after a table or request change.
    pub fn recompute(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        let req = &self.request;
        match aggregate(table, req.view_mode, req.bin_count, req.log_scale) {
            Ok(result) => {
                self.result = Some(result);
                self.status_message = None;
            }
            Err(e) => {
                log::warn!("Aggregation failed: {e}");
                self.result = None;
                self.status_message = Some(e.to_string());
            }
        }
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.request.view_mode != mode {
            self.request.view_mode = mode;
            self.recompute();
        }
    }

    pub fn set_bins(&mut self, bins: i64) {
        if self.request.bin_count != Some(bins) {
            self.request.bin_count = Some(bins);
            self.recompute();
        }
    }

    pub fn toggle_log_scale(&mut self) {
        self.request.log_scale = !self.request.log_scale;
        self.recompute();
    }

    /// Change the group scope; `None` shows every group.
    pub fn set_group(&mut self, group: Option<String>) {
        if self.request.group_id != group {
            self.request.group_id = group;
            self.reload();
        }
    }
}

fn is_parquet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("parquet") || e.eq_ignore_ascii_case("pq"))
}
