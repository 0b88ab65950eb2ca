//! Calculation requests as they arrive from a caller, and their validated form.
//!
//! [`CalculationRequest`] mirrors the JSON accepted by the `calculate` and
//! `batch` commands. Nothing downstream consumes it directly: every field is
//! checked once in [`CalculationRequest::validate`] and turned into a
//! [`CalculationParams`] so the pipeline never sees out-of-range input.

use crate::engine::{Atmosphere, ClearSkyModel, Surface, STANDARD_PRESSURE_HPA, STANDARD_TEMPERATURE_C};
use crate::error::{Result, SunpathError};
use crate::location::Location;
use crate::time_window::TimeWindow;
use serde::{Deserialize, Serialize};

pub const DEFAULT_START_TIME: &str = "00:00";
pub const DEFAULT_END_TIME: &str = "23:59";
pub const DEFAULT_INTERVAL_MINUTES: u32 = 60;
pub const DEFAULT_ALBEDO: f64 = 0.2;
pub const DEFAULT_MAX_OBJECT_HEIGHT: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInput {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub altitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeInput {
    pub date: String,
    #[serde(default = "default_start", alias = "start_time")]
    pub start_time: String,
    #[serde(default = "default_end", alias = "end_time")]
    pub end_time: String,
    #[serde(default = "default_interval")]
    pub interval: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInput {
    pub height: f64,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default, alias = "terrain_slope")]
    pub terrain_slope: Option<f64>,
    #[serde(default, alias = "terrain_aspect")]
    pub terrain_aspect: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceInput {
    pub tilt: f64,
    pub azimuth: f64,
    #[serde(default = "default_albedo")]
    pub albedo: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationOptions {
    /// Apply atmospheric refraction correction
    #[serde(default = "default_true")]
    pub atmosphere: bool,
    #[serde(default)]
    pub model: ClearSkyModel,
    #[serde(default = "default_true", alias = "include_par")]
    pub include_par: bool,
    /// hPa, falls back to the configured default
    #[serde(default)]
    pub pressure: Option<f64>,
    /// °C, falls back to the configured default
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub surface: Option<SurfaceInput>,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            atmosphere: true,
            model: ClearSkyModel::default(),
            include_par: true,
            pressure: None,
            temperature: None,
            surface: None,
        }
    }
}

/// One integrated calculation: sun position, irradiance and optionally a shadow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub location: LocationInput,
    pub datetime: DateTimeInput,
    #[serde(default)]
    pub object: Option<ObjectInput>,
    #[serde(default)]
    pub options: CalculationOptions,
}

/// Many independent calculations in one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub requests: Vec<CalculationRequest>,
    #[serde(default = "default_true")]
    pub parallel: bool,
}

fn default_start() -> String {
    DEFAULT_START_TIME.to_string()
}

fn default_end() -> String {
    DEFAULT_END_TIME.to_string()
}

fn default_interval() -> u32 {
    DEFAULT_INTERVAL_MINUTES
}

fn default_albedo() -> f64 {
    DEFAULT_ALBEDO
}

fn default_true() -> bool {
    true
}

/// Configured fallbacks and limits applied during validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestDefaults {
    pub max_object_height: f64,
    pub pressure: f64,
    pub temperature: f64,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            max_object_height: DEFAULT_MAX_OBJECT_HEIGHT,
            pressure: STANDARD_PRESSURE_HPA,
            temperature: STANDARD_TEMPERATURE_C,
        }
    }
}

/// A vertical object casting a shadow, with optional footprint width and
/// the terrain it stands on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectSpec {
    pub height: f64,
    pub width: Option<f64>,
    /// Terrain slope in degrees, 0 is flat
    pub terrain_slope: f64,
    /// Downhill-facing direction of the terrain, degrees from north
    pub terrain_aspect: f64,
}

impl ObjectSpec {
    pub fn new(height: f64) -> Result<Self> {
        if !height.is_finite() || height <= 0.0 {
            return Err(SunpathError::invalid(format!(
                "object height must be greater than 0, got {}",
                height
            )));
        }
        Ok(Self {
            height,
            width: None,
            terrain_slope: 0.0,
            terrain_aspect: 0.0,
        })
    }

    pub fn with_width(self, width: f64) -> Result<Self> {
        if !width.is_finite() || width <= 0.0 {
            return Err(SunpathError::invalid(format!(
                "object width must be greater than 0, got {}",
                width
            )));
        }
        Ok(Self {
            width: Some(width),
            ..self
        })
    }

    pub fn with_terrain(self, slope: f64, aspect: f64) -> Result<Self> {
        if !slope.is_finite() || !(0.0..90.0).contains(&slope) {
            return Err(SunpathError::invalid(format!(
                "terrain slope must be in [0, 90), got {}",
                slope
            )));
        }
        if !aspect.is_finite() || !(0.0..360.0).contains(&aspect) {
            return Err(SunpathError::invalid(format!(
                "terrain aspect must be in [0, 360), got {}",
                aspect
            )));
        }
        Ok(Self {
            terrain_slope: slope,
            terrain_aspect: aspect,
            ..self
        })
    }
}

/// A fully validated calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationParams {
    pub location: Location,
    pub window: TimeWindow,
    pub atmosphere: Atmosphere,
    pub model: ClearSkyModel,
    pub include_par: bool,
    pub object: Option<ObjectSpec>,
    pub surface: Option<Surface>,
}

impl CalculationRequest {
    /// Check every field and build the parameters the pipeline runs on.
    pub fn validate(&self, defaults: &RequestDefaults) -> Result<CalculationParams> {
        let location = Location::new(self.location.lat, self.location.lon, self.location.altitude)?;
        let window = TimeWindow::parse(
            &self.datetime.date,
            &self.datetime.start_time,
            &self.datetime.end_time,
            self.datetime.interval,
        )?;

        let object = match &self.object {
            Some(input) => Some(validate_object(input, defaults.max_object_height)?),
            None => None,
        };
        let surface = match &self.options.surface {
            Some(input) => Some(validate_surface(input)?),
            None => None,
        };

        let atmosphere = Atmosphere {
            pressure: self.options.pressure.unwrap_or(defaults.pressure),
            temperature: self.options.temperature.unwrap_or(defaults.temperature),
            refraction: self.options.atmosphere,
        };
        if !atmosphere.pressure.is_finite() || atmosphere.pressure <= 0.0 {
            return Err(SunpathError::invalid(format!(
                "pressure must be positive, got {}",
                atmosphere.pressure
            )));
        }
        if !atmosphere.temperature.is_finite() {
            return Err(SunpathError::invalid("temperature must be a finite number"));
        }

        Ok(CalculationParams {
            location,
            window,
            atmosphere,
            model: self.options.model,
            include_par: self.options.include_par,
            object,
            surface,
        })
    }
}

fn validate_object(input: &ObjectInput, max_height: f64) -> Result<ObjectSpec> {
    if input.height > max_height {
        return Err(SunpathError::invalid(format!(
            "object height must be at most {} m, got {}",
            max_height, input.height
        )));
    }
    let mut object = ObjectSpec::new(input.height)?;
    if let Some(width) = input.width {
        object = object.with_width(width)?;
    }
    if input.terrain_slope.is_some() || input.terrain_aspect.is_some() {
        object = object.with_terrain(
            input.terrain_slope.unwrap_or(0.0),
            input.terrain_aspect.unwrap_or(0.0),
        )?;
    }
    Ok(object)
}

fn validate_surface(input: &SurfaceInput) -> Result<Surface> {
    if !input.tilt.is_finite() || !(0.0..=90.0).contains(&input.tilt) {
        return Err(SunpathError::invalid(format!(
            "surface tilt must be in [0, 90], got {}",
            input.tilt
        )));
    }
    if !input.azimuth.is_finite() || !(0.0..360.0).contains(&input.azimuth) {
        return Err(SunpathError::invalid(format!(
            "surface azimuth must be in [0, 360), got {}",
            input.azimuth
        )));
    }
    if !input.albedo.is_finite() || !(0.0..=1.0).contains(&input.albedo) {
        return Err(SunpathError::invalid(format!(
            "albedo must be in [0, 1], got {}",
            input.albedo
        )));
    }
    Ok(Surface {
        tilt: input.tilt,
        azimuth: input.azimuth,
        albedo: input.albedo,
    })
}
