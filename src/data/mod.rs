//! Data layer: table model, loading, filtering and the aggregators.
//!
//! Architecture:
//! ```text
//!  .csv / .xlsx / .xls / .ods / .json
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → Table { headers, rows }
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  allow-set per column (AND of ORs) → row subset
//!   └──────────┘
//!        │
//!        ├──────────────┬──────────────┐
//!        ▼              ▼              ▼
//!   ┌───────────┐ ┌───────────┐ ┌───────────┐
//!   │ aggregate │ │  compare  │ │   pivot   │
//!   └───────────┘ └───────────┘ └───────────┘
//!    ranked bars   diverging      cross-tab
//! ```
//!
//! Everything below the loader is pure: the same rows and selections always
//! produce the same snapshot.

pub mod aggregate;
pub mod compare;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pivot;
