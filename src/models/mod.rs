//! Core data models for the freight price system.

pub mod region;
pub mod shipment;

pub use region::{AreaRecord, ProvinceClass, RegionRecord, RegionTier, ResolvedAddress};
pub use shipment::{Shipment, ShipmentItem};
