//! Weather timeline report (Visual Crossing shape)
//!
//! The browser client fetched this report and flattened its first day into
//! the prediction schema. The same mapping lives here so a client can post
//! the report as-is.

use serde::Deserialize;

use super::input::{lenient, InputRecord};

pub const DEFAULT_PRESSURE: f64 = 1013.0;
pub const DEFAULT_VISIBILITY: f64 = 10.0;
pub const DEFAULT_ELEVATION: f64 = 10.0;
pub const DEFAULT_SOIL_MOISTURE: f64 = 0.2;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    #[serde(deserialize_with = "lenient::number")]
    pub latitude: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub longitude: f64,
    #[serde(default)]
    pub resolved_address: Option<String>,

    /// Not part of the timeline API; callers may supply them
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub elevation: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub soil_moisture: Option<f64>,

    pub days: Vec<WeatherDay>,
}

/// One day of the timeline; the API sends `null` for absent readings
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherDay {
    #[serde(default)]
    pub datetime: Option<String>,

    #[serde(deserialize_with = "lenient::number")]
    pub temp: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub precip: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub humidity: f64,

    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub windspeed: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub pressure: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub cloudcover: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub visibility: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub severerisk: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub solarradiation: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub solarenergy: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub uvindex: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub moonphase: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub snowdepth: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub snow: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub precipprob: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub winddir: Option<f64>,
}

impl WeatherReport {
    /// The day that gets scored
    pub fn current_day(&self) -> Option<&WeatherDay> {
        self.days.first()
    }

    /// Flatten the current day; `None` when the report has no days
    pub fn to_input(&self) -> Option<InputRecord> {
        let day = self.current_day()?;

        Some(InputRecord {
            latitude: self.latitude,
            longitude: self.longitude,
            precipitation: day.precip,
            humidity: day.humidity,
            temperature: day.temp,
            wind_speed: day.windspeed.unwrap_or(0.0),
            pressure: day.pressure.unwrap_or(DEFAULT_PRESSURE),
            cloud_cover: day.cloudcover.unwrap_or(0.0),
            visibility: day.visibility.unwrap_or(DEFAULT_VISIBILITY),
            severerisk: day.severerisk.unwrap_or(0.0),
            solarradiation: day.solarradiation.unwrap_or(0.0),
            solarenergy: day.solarenergy.unwrap_or(0.0),
            uvindex: day.uvindex.unwrap_or(0.0),
            moonphase: day.moonphase.unwrap_or(0.0),
            snowdepth: day.snowdepth.unwrap_or(0.0),
            snow: day.snow.unwrap_or(0.0),
            precipprob: day.precipprob.unwrap_or(0.0),
            winddir: day.winddir.unwrap_or(0.0),
            elevation: self.elevation.unwrap_or(DEFAULT_ELEVATION),
            soil_moisture: self.soil_moisture.unwrap_or(DEFAULT_SOIL_MOISTURE),
        })
    }
}
