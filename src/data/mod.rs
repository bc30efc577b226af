//! Data layer: core types, parsing, persistence and filtering.
//!
//! Architecture:
//! ```text
//!  .csv / .txt / .tsv        .parquet
//!        │                       │
//!        ▼                       ▼
//!   ┌──────────┐           ┌──────────┐
//!   │  loader   │           │  store    │  rebuild rows, optional group scope
//!   └──────────┘           └──────────┘
//!        │                       │
//!        ▼                       ▼
//!   ┌──────────────────┐
//!   │ MeasurementTable  │  Vec<MeasurementRow>, read-only
//!   └──────────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  Category → matching rows
//!   └──────────┘
//! ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod store;
