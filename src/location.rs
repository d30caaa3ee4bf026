//! Approximate location lookup from the public IP address.

use std::time::Duration;

use serde::Deserialize;

use crate::settings::AppSettings;
use crate::sunrise_api::FetchError;

const GEO_URL: &str = "http://ip-api.com/json/?fields=status,lat,lon,city,regionName,country";
const GEO_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Deserialize)]
struct GeoResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
}

/// Coordinates and display name resolved from the IP address.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// `"City, Region"`, or just the city; `None` when the service had neither.
    pub name: Option<String>,
}

impl DetectedLocation {
    /// Copy the detected location into `settings`.
    pub fn apply_to(&self, settings: &mut AppSettings) {
        settings.latitude = self.latitude;
        settings.longitude = self.longitude;
        if let Some(name) = &self.name {
            settings.location_name = name.clone();
        }
    }
}

pub fn detect_location() -> Result<DetectedLocation, FetchError> {
    let response = reqwest::blocking::Client::builder()
        .timeout(GEO_TIMEOUT)
        .build()?
        .get(GEO_URL)
        .send()
        .map_err(|err| {
            if err.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Http(err)
            }
        })?
        .error_for_status()?;
    parse_geo(&response.text()?)
}

pub fn parse_geo(body: &str) -> Result<DetectedLocation, FetchError> {
    let geo: GeoResponse = serde_json::from_str(body)?;
    if geo.status != "success" {
        return Err(FetchError::Status(geo.status));
    }
    let (Some(latitude), Some(longitude)) = (geo.lat, geo.lon) else {
        return Err(FetchError::Status("success without coordinates".to_string()));
    };
    let name = match (geo.city, geo.region_name) {
        (Some(city), Some(region)) if !city.is_empty() && !region.is_empty() => {
            Some(format!("{city}, {region}"))
        }
        (Some(city), _) if !city.is_empty() => Some(city),
        _ => None,
    };
    Ok(DetectedLocation {
        latitude,
        longitude,
        name,
    })
}
