pub mod location;
pub mod pricing;
pub mod vehicle;

pub use location::Location;
pub use pricing::price;
pub use vehicle::{
    FuelType, OwnerShare, SeatingClass, SharePercentage, Transmission, Vehicle, VehicleDraft,
    VehicleListing,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Owner share percentage must be between 0 and 100, got {0}")]
    ShareOutOfRange(i64),

    #[error("Invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}
