//! Prediction request schema

use serde::Deserialize;

use crate::inference::layout::FEATURE_COUNT;

/// One request's weather and terrain readings, bound by field name
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRecord {
    #[serde(deserialize_with = "lenient::number")]
    pub latitude: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub longitude: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub precipitation: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub humidity: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub temperature: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub wind_speed: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub pressure: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub cloud_cover: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub visibility: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub severerisk: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub solarradiation: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub solarenergy: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub uvindex: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub moonphase: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub snowdepth: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub snow: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub precipprob: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub winddir: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub elevation: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub soil_moisture: f64,
}

impl InputRecord {
    /// Values in `FEATURE_LAYOUT` order
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.latitude,
            self.longitude,
            self.precipitation,
            self.humidity,
            self.temperature,
            self.wind_speed,
            self.pressure,
            self.cloud_cover,
            self.visibility,
            self.severerisk,
            self.solarradiation,
            self.solarenergy,
            self.uvindex,
            self.moonphase,
            self.snowdepth,
            self.snow,
            self.precipprob,
            self.winddir,
            self.elevation,
            self.soil_moisture,
        ]
    }

    #[cfg(test)]
    pub fn from_array(v: [f64; FEATURE_COUNT]) -> Self {
        Self {
            latitude: v[0],
            longitude: v[1],
            precipitation: v[2],
            humidity: v[3],
            temperature: v[4],
            wind_speed: v[5],
            pressure: v[6],
            cloud_cover: v[7],
            visibility: v[8],
            severerisk: v[9],
            solarradiation: v[10],
            solarenergy: v[11],
            uvindex: v[12],
            moonphase: v[13],
            snowdepth: v[14],
            snow: v[15],
            precipprob: v[16],
            winddir: v[17],
            elevation: v[18],
            soil_moisture: v[19],
        }
    }
}

/// Numbers, or strings holding a finite decimal number
pub(crate) mod lenient {
    use std::fmt;

    use serde::de::{self, Deserializer, Visitor};

    struct LenientF64;

    impl<'de> Visitor<'de> for LenientF64 {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number or numeric string")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(n),
                _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
            }
        }
    }

    struct LenientOptionF64;

    impl<'de> Visitor<'de> for LenientOptionF64 {
        type Value = Option<f64>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number, numeric string or null")
        }

        fn visit_none<E: de::Error>(self) -> Result<Option<f64>, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Option<f64>, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Option<f64>, D::Error> {
            number(d).map(Some)
        }
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        d.deserialize_any(LenientF64)
    }

    pub fn optional_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        d.deserialize_option(LenientOptionF64)
    }
}
