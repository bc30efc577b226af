//! Core of the invariant-mass viewer: table parsing, category filtering,
//! energy-window statistics and chart-ready histograms.
//!
//! The viewer binary (`src/main.rs`) and the `mass_report` CLI are thin
//! collaborators around [`analysis::analyze_bytes`] / [`analysis::analyze_file`].

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
