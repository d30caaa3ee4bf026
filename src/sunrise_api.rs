//! Client for the sunrise-sunset.org JSON API.

use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Timelike};
use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::solar::{MarkerSource, SolarMarkers};

pub const API_URL: &str = "https://api.sunrise-sunset.org/json";

const FIRST_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(5);
const RETRY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api returned status {0}")]
    Status(String),
    #[error("malformed api response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid timestamp for {field}: {value:?}")]
    Timestamp { field: &'static str, value: String },
}

/// Source of solar markers for a given date.
pub trait SolarFetcher {
    fn fetch(&self, date: NaiveDate) -> Result<SolarMarkers, FetchError>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    status: String,
    results: Option<ApiResults>,
}

#[derive(Debug, Deserialize)]
struct ApiResults {
    sunrise: String,
    sunset: String,
    solar_noon: String,
    civil_twilight_begin: String,
    civil_twilight_end: String,
}

/// Blocking client for one fixed location.
#[derive(Debug, Clone)]
pub struct SunriseSunsetClient {
    latitude: f64,
    longitude: f64,
    http: reqwest::blocking::Client,
}

impl SunriseSunsetClient {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("solar_wallpaper/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            latitude,
            longitude,
            http,
        })
    }

    fn request(&self, date: NaiveDate, timeout: Duration) -> Result<String, FetchError> {
        let response = self
            .http
            .get(API_URL)
            .query(&[
                ("lat", self.latitude.to_string()),
                ("lng", self.longitude.to_string()),
                ("date", date.format("%Y-%m-%d").to_string()),
                ("formatted", "0".to_string()),
            ])
            .timeout(timeout)
            .send()
            .map_err(classify)?
            .error_for_status()?;
        response.text().map_err(classify)
    }
}

impl SolarFetcher for SunriseSunsetClient {
    fn fetch(&self, date: NaiveDate) -> Result<SolarMarkers, FetchError> {
        let body = match self.request(date, FIRST_ATTEMPT_TIMEOUT) {
            Ok(body) => body,
            Err(FetchError::Timeout) => {
                debug!("solar request for {date} timed out, retrying once");
                self.request(date, RETRY_TIMEOUT)?
            }
            Err(err) => return Err(err),
        };
        parse_response(&body, &Local)
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() || err.is_connect() {
        FetchError::Timeout
    } else {
        FetchError::Http(err)
    }
}

/// Parse an API body into markers expressed in the hours of `tz`.
///
/// The markers are only valid when both sunrise and sunset land after
/// midnight; polar day and night responses come back with zeroed times.
pub fn parse_response<Tz: TimeZone>(body: &str, tz: &Tz) -> Result<SolarMarkers, FetchError> {
    let response: ApiResponse = serde_json::from_str(body)?;
    let results = match (response.status.as_str(), response.results) {
        ("OK", Some(results)) => results,
        (status, _) => return Err(FetchError::Status(status.to_string())),
    };

    let sunrise = local_hour("sunrise", &results.sunrise, tz)?;
    let sunset = local_hour("sunset", &results.sunset, tz)?;
    Ok(SolarMarkers {
        sunrise,
        sunset,
        solar_noon: local_hour("solar_noon", &results.solar_noon, tz)?,
        civil_twilight_begin: local_hour("civil_twilight_begin", &results.civil_twilight_begin, tz)?,
        civil_twilight_end: local_hour("civil_twilight_end", &results.civil_twilight_end, tz)?,
        valid: sunrise > 0.0 && sunset > 0.0,
        source: MarkerSource::Api,
    })
}

fn local_hour<Tz: TimeZone>(field: &'static str, value: &str, tz: &Tz) -> Result<f64, FetchError> {
    let stamp = DateTime::parse_from_rfc3339(value).map_err(|_| FetchError::Timestamp {
        field,
        value: value.to_string(),
    })?;
    let local = stamp.with_timezone(tz);
    Ok(f64::from(local.hour())
        + f64::from(local.minute()) / 60.0
        + f64::from(local.second()) / 3600.0)
}
