//! # Domain Types
//!
//! Remote catalog payloads and the flattened record persisted for each area.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Remote (provider API)                    Local (courier_locations)     │
//! │                                                                         │
//! │  ┌──────────┐                                                          │
//! │  │   City   │──┐                                                       │
//! │  └──────────┘  │   ┌──────────┐                                        │
//! │                ├──►│   Zone   │──┐                                     │
//! │                │   └──────────┘  │   ┌──────────┐                      │
//! │                │                 ├──►│   Area   │                      │
//! │                │                 │   └────┬─────┘                      │
//! │                ▼                 ▼        ▼                             │
//! │          ┌─────────────────────────────────────┐    ┌────────────────┐ │
//! │          │ LocationRecord (one per area)       │───►│CourierLocation │ │
//! │          │ key: provider, city, zone, area     │    │ (persisted row)│ │
//! │          └─────────────────────────────────────┘    └────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Natural Key
//! `(provider_name, city_id, zone_id, area_id)` identifies a location. Key
//! fields never change once written; names and availability flags do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::provider::ProviderName;

// =============================================================================
// Remote Payloads
// =============================================================================

/// A city as returned by the provider's city list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub city_id: i64,
    pub city_name: String,
}

/// A zone within a city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    pub zone_id: i64,
    pub zone_name: String,
}

/// An area within a zone.
///
/// Availability flags are optional on the wire; a missing flag means the
/// service is not offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    #[serde(default)]
    pub area_id: Option<i64>,

    #[serde(default)]
    pub area_name: Option<String>,

    #[serde(default)]
    pub home_delivery_available: Option<bool>,

    #[serde(default)]
    pub pickup_available: Option<bool>,
}

// =============================================================================
// Location Key
// =============================================================================

/// Natural key of a location row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationKey {
    pub provider_name: ProviderName,
    pub city_id: i64,
    pub zone_id: i64,
    pub area_id: Option<i64>,
}

// =============================================================================
// Location Record
// =============================================================================

/// A flattened (city, zone, area) tuple ready to be upserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub provider_name: ProviderName,
    pub city_id: i64,
    pub city_name: String,
    pub zone_id: i64,
    pub zone_name: String,
    pub area_id: Option<i64>,
    pub area_name: Option<String>,
    pub home_delivery_available: bool,
    pub pickup_available: bool,

    /// Used only when the row is inserted.
    pub created_at: DateTime<Utc>,

    /// Written on insert and on every update.
    pub updated_at: DateTime<Utc>,
}

impl LocationRecord {
    /// Flattens one area of the hierarchy into a record stamped with `now`.
    pub fn from_hierarchy(
        provider: ProviderName,
        city: &City,
        zone: &Zone,
        area: &Area,
        now: DateTime<Utc>,
    ) -> Self {
        LocationRecord {
            provider_name: provider,
            city_id: city.city_id,
            city_name: city.city_name.clone(),
            zone_id: zone.zone_id,
            zone_name: zone.zone_name.clone(),
            area_id: area.area_id,
            area_name: area.area_name.clone(),
            home_delivery_available: area.home_delivery_available.unwrap_or(false),
            pickup_available: area.pickup_available.unwrap_or(false),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the natural key of this record.
    pub fn key(&self) -> LocationKey {
        LocationKey {
            provider_name: self.provider_name,
            city_id: self.city_id,
            zone_id: self.zone_id,
            area_id: self.area_id,
        }
    }
}

// =============================================================================
// Courier Location (persisted row)
// =============================================================================

/// A row of the `courier_locations` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CourierLocation {
    /// Surrogate primary key.
    pub id: i64,
    pub provider_name: ProviderName,
    pub city_id: i64,
    pub city_name: String,
    pub zone_id: i64,
    pub zone_name: String,
    pub area_id: Option<i64>,
    pub area_name: Option<String>,
    pub home_delivery_available: bool,
    pub pickup_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Soft-delete tombstone. Sync never sets or clears it.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CourierLocation {
    /// Returns the natural key of this row.
    pub fn key(&self) -> LocationKey {
        LocationKey {
            provider_name: self.provider_name,
            city_id: self.city_id,
            zone_id: self.zone_id,
            area_id: self.area_id,
        }
    }

    /// Whether the row carries a soft-delete tombstone.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dhaka() -> City {
        City {
            city_id: 1,
            city_name: "Dhaka".to_string(),
        }
    }

    fn banani() -> Zone {
        Zone {
            zone_id: 10,
            zone_name: "Banani".to_string(),
        }
    }

    #[test]
    fn test_area_missing_flags_deserialize_as_none() {
        let area: Area =
            serde_json::from_str(r#"{"area_id": 7, "area_name": "Road 11"}"#).unwrap();
        assert_eq!(area.area_id, Some(7));
        assert_eq!(area.home_delivery_available, None);
        assert_eq!(area.pickup_available, None);
    }

    #[test]
    fn test_record_defaults_missing_flags_to_false() {
        let area = Area {
            area_id: Some(7),
            area_name: Some("Road 11".to_string()),
            home_delivery_available: None,
            pickup_available: Some(true),
        };
        let now = Utc::now();
        let record = LocationRecord::from_hierarchy(ProviderName::Pathao, &dhaka(), &banani(), &area, now);

        assert_eq!(record.city_name, "Dhaka");
        assert_eq!(record.zone_name, "Banani");
        assert_eq!(record.area_name.as_deref(), Some("Road 11"));
        assert!(!record.home_delivery_available);
        assert!(record.pickup_available);
        assert_eq!(record.created_at, now);
        assert_eq!(record.updated_at, now);
    }

    #[test]
    fn test_record_key() {
        let area = Area {
            area_id: None,
            area_name: None,
            home_delivery_available: None,
            pickup_available: None,
        };
        let record =
            LocationRecord::from_hierarchy(ProviderName::Pathao, &dhaka(), &banani(), &area, Utc::now());

        assert_eq!(
            record.key(),
            LocationKey {
                provider_name: ProviderName::Pathao,
                city_id: 1,
                zone_id: 10,
                area_id: None,
            }
        );
    }
}
