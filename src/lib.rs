//! Aggregation engine behind the rusty-likert dashboard.
//!
//! Files are parsed into a [`Table`](data::model::Table), narrowed by a
//! [`FilterSpec`](data::filter::FilterSpec) and summarised by one of three
//! aggregators: ranked groups for stacked Likert bars, a two-category
//! comparison for diverging bars, or a pivot table. [`state`] ties them to
//! the user's selections; the GUI in the binary only draws the snapshots.

pub mod data;
pub mod error;
pub mod schedule;
pub mod settings;
pub mod state;
