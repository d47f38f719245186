use drivehub_shared::Masked;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::CatalogError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatingClass {
    FourSeater,
    SixSevenSeater,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Transmission {
    Manual,
    Automatic,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
}

/// Owner's cut of realized revenue, always within `0..=100`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "i64", into = "i64")]
pub struct SharePercentage(u8);

impl SharePercentage {
    pub const FULL: SharePercentage = SharePercentage(100);

    pub fn value(self) -> u8 {
        self.0
    }

    /// Split `total` into `(owner, company)`. The owner's portion is truncated and the
    /// company keeps the remainder, so both parts always add back up to `total`.
    pub fn split(self, total: i64) -> (i64, i64) {
        let owner = total * i64::from(self.0) / 100;
        (owner, total - owner)
    }
}

impl Default for SharePercentage {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<i64> for SharePercentage {
    type Error = CatalogError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (0..=100).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(CatalogError::ShareOutOfRange(value))
        }
    }
}

impl From<SharePercentage> for i64 {
    fn from(value: SharePercentage) -> Self {
        i64::from(value.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OwnerShare {
    pub owner_name: Option<String>,
    pub owner_phone: Option<Masked<String>>,
    pub share_percentage: SharePercentage,
}

/// A rentable car as administrators see it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vehicle {
    pub id: Uuid,
    pub name: String,
    pub seating: SeatingClass,
    pub year: i32,
    pub transmission: Transmission,
    pub fuel: FuelType,
    /// Rate per started 24-hour block.
    pub price_24h: i64,
    /// Flat rate for rentals of up to twelve hours.
    pub price_12h: i64,
    pub mileage: Option<String>,
    pub image_url: Option<String>,
    pub location_id: Uuid,
    pub is_available: bool,
    pub registration_number: Option<Masked<String>>,
    pub owner: OwnerShare,
}

impl Vehicle {
    /// Customer-facing projection without the registration number or owner metadata.
    pub fn listing(&self) -> VehicleListing {
        VehicleListing {
            id: self.id,
            name: self.name.clone(),
            seating: self.seating,
            year: self.year,
            transmission: self.transmission,
            fuel: self.fuel,
            price_24h: self.price_24h,
            price_12h: self.price_12h,
            mileage: self.mileage.clone(),
            image_url: self.image_url.clone(),
            location_id: self.location_id,
        }
    }

    /// Replace every administrator-editable attribute, keeping the identity.
    pub fn apply(&mut self, draft: VehicleDraft) -> Result<(), CatalogError> {
        let share = self.owner.share_percentage;
        let updated = draft.into_vehicle(share)?;
        *self = Vehicle { id: self.id, ..updated };
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleListing {
    pub id: Uuid,
    pub name: String,
    pub seating: SeatingClass,
    pub year: i32,
    pub transmission: Transmission,
    pub fuel: FuelType,
    pub price_24h: i64,
    pub price_12h: i64,
    pub mileage: Option<String>,
    pub image_url: Option<String>,
    pub location_id: Uuid,
}

/// Administrator input for creating or replacing a vehicle.
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleDraft {
    pub name: String,
    pub seating: SeatingClass,
    pub year: i32,
    pub transmission: Transmission,
    pub fuel: FuelType,
    pub price_24h: i64,
    pub price_12h: i64,
    #[serde(default)]
    pub mileage: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    pub location_id: Uuid,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default = "default_available")]
    pub is_available: bool,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub owner_phone: Option<String>,
    /// Falls back to the supplied default when omitted.
    #[serde(default)]
    pub share_percentage: Option<i64>,
}

fn default_available() -> bool {
    true
}

impl VehicleDraft {
    pub fn into_vehicle(self, default_share: SharePercentage) -> Result<Vehicle, CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::InvalidField {
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.price_24h <= 0 {
            return Err(CatalogError::InvalidField {
                field: "price_24h",
                reason: format!("must be positive, got {}", self.price_24h),
            });
        }
        if self.price_12h <= 0 {
            return Err(CatalogError::InvalidField {
                field: "price_12h",
                reason: format!("must be positive, got {}", self.price_12h),
            });
        }

        let share_percentage = match self.share_percentage {
            Some(pct) => SharePercentage::try_from(pct)?,
            None => default_share,
        };

        Ok(Vehicle {
            id: Uuid::new_v4(),
            name: self.name.trim().to_string(),
            seating: self.seating,
            year: self.year,
            transmission: self.transmission,
            fuel: self.fuel,
            price_24h: self.price_24h,
            price_12h: self.price_12h,
            mileage: self.mileage,
            image_url: self.image_url,
            location_id: self.location_id,
            is_available: self.is_available,
            registration_number: self
                .registration_number
                .filter(|r| !r.trim().is_empty())
                .map(Masked::new),
            owner: OwnerShare {
                owner_name: self.owner_name,
                owner_phone: self.owner_phone.map(Masked::new),
                share_percentage,
            },
        })
    }
}
