//! MarketLens Core — the algorithmic heart of the market-data explorer.
//!
//! This crate contains everything with real transformation logic:
//! - Schema classification (technical / dimension / hourly / value columns)
//! - Canonical date assembly from (year, month-day code) fields
//! - Version resolution (highest-weight revision wins per date + dimensions)
//! - Horizontal reduction of 24 hourly columns into one daily scalar
//! - Temporal aggregation into a sorted daily series
//! - Cascading filter-domain resolution for the filter panel
//!
//! Everything around it (file transfer, rendering, window layout) is an
//! external collaborator that calls into this crate and consumes the results.

pub mod aggregate;
pub mod cascade;
pub mod dates;
pub mod frame;
pub mod query;
pub mod reduce;
pub mod schema;
pub mod store;
pub mod version;
