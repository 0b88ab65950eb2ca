//! Cached entry points over the calculation pipeline.
//!
//! Every entry point follows the same explicit pattern: derive the key from
//! the validated parameters, look it up, compute on a miss and store the
//! result. Cache trouble never reaches the caller.

use chrono::{DateTime, FixedOffset};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use sunpath_core::error::{Result, SunpathError};
use sunpath_core::{
    AstronomicalEngine, CalculationParams, CalculationRequest, CalculationResponse, ClearSkyModel,
    ClearSkySample, ExtremeConditions, Location, RequestDefaults, SpaEngine, SunTimes, TimeWindow,
};
use sunpath_data::{pipeline, position};
use sunpath_db::{Cache, CacheKey};
use sunpath_utils::dates::{format_date, format_hhmm};

use crate::config::Settings;

/// Sun times and polar flags for one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SunTimesReport {
    pub date: String,
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub sunset: Option<DateTime<FixedOffset>>,
    pub solar_noon: Option<DateTime<FixedOffset>>,
    pub day_length: f64,
    pub conditions: ExtremeConditions,
    /// Clear-sky irradiance at sunrise, absent without a sunrise
    pub sunrise_irradiance: Option<ClearSkySample>,
    /// Clear-sky irradiance at sunset, absent without a sunset
    pub sunset_irradiance: Option<ClearSkySample>,
}

pub struct Calculator {
    engine: Arc<dyn AstronomicalEngine>,
    cache: Cache,
    defaults: RequestDefaults,
    ttl_secs: u64,
}

impl Calculator {
    pub fn new(engine: Arc<dyn AstronomicalEngine>, cache: Cache, defaults: RequestDefaults, ttl_secs: u64) -> Self {
        Self {
            engine,
            cache,
            defaults,
            ttl_secs,
        }
    }

    /// SPA engine with the configured cache and request defaults.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Arc::new(SpaEngine::new()),
            settings.open_cache(),
            settings.request_defaults(),
            settings.cache_ttl_secs,
        )
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Validate a request and run it through the cache.
    pub fn calculate(&self, request: &CalculationRequest) -> Result<CalculationResponse> {
        let params = request.validate(&self.defaults)?;
        self.calculate_params(&params)
    }

    pub fn calculate_params(&self, params: &CalculationParams) -> Result<CalculationResponse> {
        let key = calculation_key(params);
        if let Some(cached) = self.cache.get_json::<CalculationResponse>(&key) {
            return Ok(cached);
        }
        let response = pipeline::calculate(self.engine.as_ref(), params)?;
        if !self.cache.set_json(&key, &response, self.ttl_secs) {
            debug!("result for {} not cached", key);
        }
        Ok(response)
    }

    /// Sun times for a date, with clear-sky irradiance at sunrise and sunset.
    pub fn sun_times(&self, location: &Location, date: &str, model: ClearSkyModel) -> Result<SunTimesReport> {
        // only the date part of the window matters here
        let window = TimeWindow::parse(date, "00:00", "00:00", 60)?;
        let key = CacheKey::new("sun_times")
            .coordinate("lat", location.latitude)
            .coordinate("lon", location.longitude)
            .coordinate("alt", location.altitude)
            .field("date", format_date(&window.date))
            .field("model", model)
            .build();
        if let Some(cached) = self.cache.get_json::<SunTimesReport>(&key) {
            return Ok(cached);
        }
        let times = self.engine.sun_times(location, window.date)?;
        let (sunrise_irradiance, sunset_irradiance) = self.edge_irradiance(location, &times, model)?;
        let report = SunTimesReport {
            date: format_date(&window.date),
            sunrise: times.sunrise,
            sunset: times.sunset,
            solar_noon: times.transit,
            day_length: position::day_length(&times),
            conditions: position::validate_extreme_conditions(location.latitude, window.date),
            sunrise_irradiance,
            sunset_irradiance,
        };
        if !self.cache.set_json(&key, &report, self.ttl_secs) {
            debug!("result for {} not cached", key);
        }
        Ok(report)
    }

    /// Clear-sky samples at whichever of sunrise and sunset exist.
    fn edge_irradiance(
        &self,
        location: &Location,
        times: &SunTimes,
        model: ClearSkyModel,
    ) -> Result<(Option<ClearSkySample>, Option<ClearSkySample>)> {
        let instants: Vec<DateTime<FixedOffset>> = [times.sunrise, times.sunset].into_iter().flatten().collect();
        if instants.is_empty() {
            return Ok((None, None));
        }
        let samples = self.engine.clear_sky(location, &instants, model)?;
        if samples.len() != instants.len() {
            error!(
                "engine returned {} clear-sky samples for {} sun-time instants",
                samples.len(),
                instants.len()
            );
            return Err(SunpathError::UpstreamDataMissing(format!(
                "expected {} clear-sky samples, got {}",
                instants.len(),
                samples.len()
            )));
        }
        let mut samples = samples.into_iter();
        let sunrise = times.sunrise.and_then(|_| samples.next());
        let sunset = times.sunset.and_then(|_| samples.next());
        Ok((sunrise, sunset))
    }
}

/// Key covering every parameter that affects an integrated calculation.
pub fn calculation_key(params: &CalculationParams) -> String {
    let window = &params.window;
    let atmosphere = &params.atmosphere;
    let object = params.object.as_ref();
    let surface = params.surface.as_ref();
    CacheKey::new("integrated")
        .coordinate("lat", params.location.latitude)
        .coordinate("lon", params.location.longitude)
        .coordinate("alt", params.location.altitude)
        .field("date", format_date(&window.date))
        .field("start", format_hhmm(&window.start))
        .field("end", format_hhmm(&window.end))
        .field("interval", window.interval_minutes)
        .field("model", params.model)
        .field("par", params.include_par)
        .field("refraction", atmosphere.refraction)
        .field("pressure", atmosphere.pressure)
        .field("temperature", atmosphere.temperature)
        .field_opt("height", object.map(|o| o.height))
        .field_opt("width", object.and_then(|o| o.width))
        .field_opt("slope", object.map(|o| o.terrain_slope))
        .field_opt("aspect", object.map(|o| o.terrain_aspect))
        .field_opt("tilt", surface.map(|s| s.tilt))
        .field_opt("azimuth", surface.map(|s| s.azimuth))
        .field_opt("albedo", surface.map(|s| s.albedo))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sunpath_data::testing::FixedEngine;

    fn request(json: &str) -> CalculationRequest {
        serde_json::from_str(json).unwrap()
    }

    fn calculator(engine: Arc<FixedEngine>, cache: Cache) -> Calculator {
        Calculator::new(engine, cache, RequestDefaults::default(), 3600)
    }

    #[test]
    fn second_call_is_served_from_cache() {
        let engine = Arc::new(FixedEngine::daylight());
        let calc = calculator(engine.clone(), Cache::in_memory().unwrap());
        let req = request(r#"{"location": {"lat": 37.5665, "lon": 126.978}, "datetime": {"date": "2025-06-21"}}"#);

        let first = calc.calculate(&req).unwrap();
        let second = calc.calculate(&req).unwrap();
        assert_eq!(engine.position_calls(), 1);
        assert_eq!(first.metadata.request_id, second.metadata.request_id);
        assert_eq!(first.series.len(), second.series.len());

        let stats = calc.cache().stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn infinite_shadows_survive_the_cache() {
        let engine = Arc::new(FixedEngine::daylight());
        let calc = calculator(engine.clone(), Cache::in_memory().unwrap());
        let req = request(
            r#"{"location": {"lat": 37.5665, "lon": 126.978}, "datetime": {"date": "2025-06-21"},
                "object": {"height": 10}}"#,
        );
        let fresh = calc.calculate(&req).unwrap();
        let cached = calc.calculate(&req).unwrap();
        assert_eq!(engine.position_calls(), 1);
        assert!(cached.series[0].shadow.as_ref().unwrap().length.is_infinite());
        assert_eq!(fresh.series.len(), cached.series.len());
    }

    #[test]
    fn disabled_cache_always_computes() {
        let engine = Arc::new(FixedEngine::daylight());
        let calc = calculator(engine.clone(), Cache::disabled());
        let req = request(r#"{"location": {"lat": 10, "lon": 20}, "datetime": {"date": "2025-03-01"}}"#);
        calc.calculate(&req).unwrap();
        calc.calculate(&req).unwrap();
        assert_eq!(engine.position_calls(), 2);
    }

    #[test]
    fn invalid_request_is_rejected_before_the_cache() {
        let calc = calculator(Arc::new(FixedEngine::daylight()), Cache::in_memory().unwrap());
        let req = request(r#"{"location": {"lat": 91, "lon": 0}, "datetime": {"date": "2025-06-21"}}"#);
        assert!(calc.calculate(&req).unwrap_err().is_client_error());
        assert_eq!(calc.cache().stats().misses, 0);
    }

    #[test]
    fn key_tracks_every_parameter() {
        let defaults = RequestDefaults::default();
        let base = request(r#"{"location": {"lat": 37.5665, "lon": 126.978}, "datetime": {"date": "2025-06-21"}}"#);
        let with_object = request(
            r#"{"location": {"lat": 37.5665, "lon": 126.978}, "datetime": {"date": "2025-06-21"},
                "object": {"height": 10}}"#,
        );
        let other_model = request(
            r#"{"location": {"lat": 37.5665, "lon": 126.978}, "datetime": {"date": "2025-06-21"},
                "options": {"model": "haurwitz"}}"#,
        );
        let base_key = calculation_key(&base.validate(&defaults).unwrap());
        assert!(base_key.starts_with("integrated_"));
        assert!(base_key.contains("lat:37.5665"));
        assert!(!base_key.contains("height"));
        assert_ne!(base_key, calculation_key(&with_object.validate(&defaults).unwrap()));
        assert_ne!(base_key, calculation_key(&other_model.validate(&defaults).unwrap()));
        assert_eq!(base_key, calculation_key(&base.validate(&defaults).unwrap()));
    }

    #[test]
    fn sun_times_report() {
        let engine = Arc::new(FixedEngine::daylight());
        let calc = calculator(engine, Cache::in_memory().unwrap());
        let location = Location::new(37.5665, 126.978, 0.0).unwrap();
        let report = calc.sun_times(&location, "2025-06-21", ClearSkyModel::Ineichen).unwrap();
        assert_eq!(report.day_length, 14.0);
        assert!(report.solar_noon.is_some());
        assert!(!report.conditions.is_polar_region);
        // the fixed sun sits exactly on the horizon at 05:00 and 19:00
        assert_eq!(report.sunrise_irradiance.unwrap().ghi, 0.0);
        assert_eq!(report.sunset_irradiance.unwrap().ghi, 0.0);
        assert_eq!(calc.sun_times(&location, "2025-06-21", ClearSkyModel::Ineichen).unwrap(), report);
        assert_eq!(calc.cache().stats().hits, 1);
        // the model is part of the key
        calc.sun_times(&location, "2025-06-21", ClearSkyModel::Haurwitz).unwrap();
        assert_eq!(calc.cache().stats().misses, 2);
        assert!(calc
            .sun_times(&location, "2025-13-01", ClearSkyModel::Ineichen)
            .unwrap_err()
            .is_client_error());
    }

    #[test]
    fn polar_night_has_no_edge_irradiance() {
        let calc = calculator(Arc::new(FixedEngine::polar_night()), Cache::in_memory().unwrap());
        let location = Location::new(78.22, 15.65, 0.0).unwrap();
        let report = calc.sun_times(&location, "2025-12-21", ClearSkyModel::Ineichen).unwrap();
        assert!(report.sunrise.is_none() && report.sunset.is_none());
        assert!(report.sunrise_irradiance.is_none());
        assert!(report.sunset_irradiance.is_none());
        assert!(report.conditions.is_polar_night);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["sunriseIrradiance"].is_null());
    }

    #[test]
    fn sun_times_without_a_cache() {
        let calc = calculator(Arc::new(FixedEngine::daylight()), Cache::disabled());
        let location = Location::new(-33.9, 18.4, 0.0).unwrap();
        let first = calc.sun_times(&location, "2025-06-21", ClearSkyModel::Ineichen).unwrap();
        let second = calc.sun_times(&location, "2025-06-21", ClearSkyModel::Ineichen).unwrap();
        assert_eq!(first, second);
        assert_eq!(calc.cache().stats().entries, 0);
    }

    #[test]
    fn sunrise_and_sunset_irradiance_with_spa() {
        let calc = Calculator::new(
            Arc::new(SpaEngine::new()),
            Cache::disabled(),
            RequestDefaults::default(),
            60,
        );
        let location = Location::new(37.5665, 126.978, 38.0).unwrap();
        let report = calc.sun_times(&location, "2025-06-21", ClearSkyModel::Ineichen).unwrap();
        let sunrise = report.sunrise_irradiance.unwrap();
        let sunset = report.sunset_irradiance.unwrap();
        // sun sits on the horizon, so almost nothing arrives
        assert!(sunrise.ghi >= 0.0 && sunrise.ghi < 50.0, "sunrise ghi {}", sunrise.ghi);
        assert!(sunset.ghi >= 0.0 && sunset.ghi < 50.0, "sunset ghi {}", sunset.ghi);
    }
}
