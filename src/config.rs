//! Tool configuration and the request option vocabulary.
//!
//! The portal ships a JSON config; [`RoutingConfig::from_json`] reads it and
//! [`RoutingConfig::validate`] rejects a config the tool cannot open with.

use serde::{Deserialize, Serialize};

use crate::error::RoutingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpeedProfile {
    #[serde(rename = "driving-car")]
    DrivingCar,
    #[serde(rename = "driving-hgv")]
    DrivingHgv,
    #[serde(rename = "cycling-regular")]
    CyclingRegular,
    #[serde(rename = "foot-walking")]
    FootWalking,
    #[serde(rename = "wheelchair")]
    Wheelchair,
}

impl SpeedProfile {
    /// Path segment used by the service endpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedProfile::DrivingCar => "driving-car",
            SpeedProfile::DrivingHgv => "driving-hgv",
            SpeedProfile::CyclingRegular => "cycling-regular",
            SpeedProfile::FootWalking => "foot-walking",
            SpeedProfile::Wheelchair => "wheelchair",
        }
    }

    pub fn supports(&self, feature: AvoidFeature) -> bool {
        use AvoidFeature::*;
        match self {
            SpeedProfile::DrivingCar | SpeedProfile::DrivingHgv => {
                matches!(feature, Highways | Tollways | Ferries)
            }
            SpeedProfile::CyclingRegular | SpeedProfile::FootWalking => {
                matches!(feature, Ferries | Fords | Steps)
            }
            SpeedProfile::Wheelchair => matches!(feature, Ferries | Steps),
        }
    }

    /// Keeps only the avoid features this profile accepts, in input order.
    pub fn filter_avoid_features(&self, features: &[AvoidFeature]) -> Vec<AvoidFeature> {
        features
            .iter()
            .copied()
            .filter(|feature| self.supports(*feature))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvoidFeature {
    Highways,
    Tollways,
    Ferries,
    Fords,
    Steps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    #[default]
    Fastest,
    Shortest,
    Recommended,
}

/// Whether isochrones are computed over travel time or travel distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Optimization {
    #[default]
    Time,
    Distance,
}

impl Optimization {
    /// Factor turning the user-entered unit (minutes, kilometres) into the
    /// service unit (seconds, metres).
    pub fn multiplier(&self) -> f64 {
        match self {
            Optimization::Time => 60.0,
            Optimization::Distance => 1000.0,
        }
    }

    pub fn range_type(&self) -> &'static str {
        match self {
            Optimization::Time => "time",
            Optimization::Distance => "distance",
        }
    }

    pub fn unit_label(&self) -> &'static str {
        match self {
            Optimization::Time => "min",
            Optimization::Distance => "km",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceType {
    #[serde(rename = "ors")]
    Ors,
    #[serde(rename = "straight-line")]
    StraightLine,
    #[serde(rename = "none")]
    None,
}

/// Connection settings for one remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSettings {
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout. Unset leaves the HTTP client default in place.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ServiceSettings {
    pub fn ors(url: impl Into<String>) -> Self {
        Self {
            service_type: ServiceType::Ors,
            url: url.into(),
            api_key: None,
            timeout_secs: None,
        }
    }

    fn validate(&self, name: &str) -> Result<(), RoutingError> {
        match self.service_type {
            ServiceType::None => Err(RoutingError::Configuration(format!(
                "{name} service type is \"none\""
            ))),
            ServiceType::Ors if self.url.trim().is_empty() => Err(RoutingError::Configuration(
                format!("{name} service has no url"),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Linear interpolation towards `end`; `fraction` is clamped to [0, 1].
    pub fn interpolate(&self, end: Rgb, fraction: f64) -> Rgb {
        let t = fraction.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(
            channel(self.0, end.0),
            channel(self.1, end.1),
            channel(self.2, end.2),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionsDefaults {
    pub language: String,
    pub speed_profile: SpeedProfile,
    pub preference: Preference,
    pub avoid_features: Vec<AvoidFeature>,
    pub instructions: bool,
}

impl Default for DirectionsDefaults {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            speed_profile: SpeedProfile::DrivingCar,
            preference: Preference::Fastest,
            avoid_features: Vec::new(),
            instructions: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsochronesDefaults {
    pub speed_profile: SpeedProfile,
    pub optimization: Optimization,
    /// Outer range in minutes or kilometres.
    pub value: f64,
    /// Ring spacing in minutes or kilometres.
    pub interval: f64,
    pub avoid_features: Vec<AvoidFeature>,
    pub start_color: Rgb,
    pub end_color: Rgb,
}

impl Default for IsochronesDefaults {
    fn default() -> Self {
        Self {
            speed_profile: SpeedProfile::DrivingCar,
            optimization: Optimization::Time,
            value: 30.0,
            interval: 10.0,
            avoid_features: Vec::new(),
            start_color: Rgb(0, 153, 51),
            end_color: Rgb(204, 0, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub directions_service: Option<ServiceSettings>,
    pub isochrones_service: Option<ServiceSettings>,
    pub directions: DirectionsDefaults,
    pub isochrones: IsochronesDefaults,
}

impl RoutingConfig {
    pub fn from_json(raw: &str) -> Result<Self, RoutingError> {
        serde_json::from_str(raw).map_err(|err| RoutingError::Configuration(err.to_string()))
    }

    /// Both services must be present and usable before the tool opens.
    pub fn validate(&self) -> Result<(), RoutingError> {
        let directions = self.directions_service.as_ref().ok_or_else(|| {
            RoutingError::Configuration("directions service settings missing".to_string())
        })?;
        directions.validate("directions")?;
        let isochrones = self.isochrones_service.as_ref().ok_or_else(|| {
            RoutingError::Configuration("isochrones service settings missing".to_string())
        })?;
        isochrones.validate("isochrones")?;
        Ok(())
    }
}
