//! Waybill - freight price lookup over rule-based Chinese address resolution.
//!
//! This library provides shared types and modules for the ingest and query binaries.

pub mod elasticsearch;
pub mod goods;
pub mod models;
pub mod region;
pub mod scylla;

pub use models::{RegionRecord, ResolvedAddress, Shipment};
pub use region::AddressResolver;
