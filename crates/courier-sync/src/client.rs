//! # Catalog Client
//!
//! Authenticated reads of a provider's location hierarchy.
//!
//! Every list endpoint answers with the same envelope; only `data.data`
//! matters:
//! ```json
//! { "message": "...", "type": "success", "code": 200,
//!   "data": { "data": [ { "city_id": 1, "city_name": "Dhaka" } ] } }
//! ```
//! A body without a list at that path reads as an empty list. Items that do
//! not match the expected shape are skipped one by one.

use courier_core::{Area, City, Zone};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::http::{HttpRequest, HttpTransport};
use crate::provider::ProviderEndpoints;

const DATA_LIST_POINTER: &str = "/data/data";

/// Reads cities, zones and areas with a fixed bearer token.
pub struct CatalogClient {
    endpoints: ProviderEndpoints,
    transport: Arc<dyn HttpTransport>,
    access_token: String,
}

impl CatalogClient {
    pub fn new(
        endpoints: ProviderEndpoints,
        transport: Arc<dyn HttpTransport>,
        access_token: String,
    ) -> Self {
        Self {
            endpoints,
            transport,
            access_token,
        }
    }

    pub async fn list_cities(&self) -> SyncResult<Vec<City>> {
        self.fetch_list("cities", self.endpoints.cities_url()).await
    }

    pub async fn list_zones(&self, city_id: i64) -> SyncResult<Vec<Zone>> {
        self.fetch_list("zones", self.endpoints.zones_url(city_id)).await
    }

    pub async fn list_areas(&self, zone_id: i64) -> SyncResult<Vec<Area>> {
        self.fetch_list("areas", self.endpoints.areas_url(zone_id)).await
    }

    async fn fetch_list<T: DeserializeOwned>(&self, resource: &str, url: String) -> SyncResult<Vec<T>> {
        let request = HttpRequest::get_with_bearer(url.as_str(), &self.access_token);

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| SyncError::fetch(resource, url.as_str(), None, e.to_string()))?;

        if !response.is_success() {
            return Err(SyncError::fetch(
                resource,
                url,
                Some(response.status),
                format!("HTTP {}", response.status),
            ));
        }

        let items: Vec<T> = parse_data_list(&response.body, resource);
        debug!(resource, url = %url, count = items.len(), "Fetched list");
        Ok(items)
    }
}

/// Extracts the list at `data.data`, tolerating any malformed input.
fn parse_data_list<T: DeserializeOwned>(body: &[u8], resource: &str) -> Vec<T> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            warn!(resource, error = %e, "Response body is not JSON, treating as empty list");
            return Vec::new();
        }
    };

    let Some(items) = value.pointer(DATA_LIST_POINTER).and_then(Value::as_array) else {
        debug!(resource, "No list at data.data, treating as empty list");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<T>(item.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(resource, error = %e, "Skipping malformed item");
                None
            }
        })
        .collect()
}
