//! One integrated calculation: positions, irradiance and shadows for a
//! validated request, assembled into a response.

use crate::{irradiance, position, shadow};
use log::{info, warn};
use sunpath_core::error::Result;
use sunpath_core::{
    AstronomicalEngine, CalculationParams, CalculationResponse, DailySummary, Metadata, SeriesPoint,
};
use sunpath_utils::numbers::finite;

pub fn calculate(engine: &dyn AstronomicalEngine, params: &CalculationParams) -> Result<CalculationResponse> {
    let location = &params.location;
    let window = &params.window;

    let conditions = position::validate_extreme_conditions(location.latitude, window.date);
    if let Some(warning) = &conditions.warning {
        warn!("({}, {}) on {}: {}", location.latitude, location.longitude, window.date, warning);
    }

    let positions = position::build(engine, location, window, &params.atmosphere)?;
    let irradiance = irradiance::build(
        engine,
        location,
        &positions,
        params.model,
        params.include_par,
        params.surface.as_ref(),
        window.interval_hours(),
    )?;

    let series: Vec<SeriesPoint> = positions
        .timestamps
        .iter()
        .zip(&positions.positions)
        .zip(&irradiance.samples)
        .map(|((timestamp, sun), sample)| SeriesPoint {
            timestamp: *timestamp,
            sun: *sun,
            irradiance: Some(*sample),
            shadow: params
                .object
                .as_ref()
                .map(|object| shadow::sample_at(object, location, sun)),
        })
        .collect();

    let summary = DailySummary {
        sunrise: positions.sun_times.sunrise,
        sunset: positions.sun_times.sunset,
        solar_noon: positions.sun_times.transit,
        day_length: position::day_length(&positions.sun_times),
        max_altitude: positions.max_altitude(),
        total_irradiance: finite(irradiance.total_irradiance()),
    };
    info!(
        "calculated {} points for ({}, {}) on {}",
        series.len(),
        location.latitude,
        location.longitude,
        window.date
    );

    Ok(CalculationResponse {
        metadata: Metadata::generate(),
        summary,
        conditions,
        statistics: Some(irradiance.statistics),
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer;
    use crate::testing::FixedEngine;
    use sunpath_core::{CalculationRequest, RequestDefaults, ShadowStatus, SpaEngine};

    fn params(json: &str) -> CalculationParams {
        let req: CalculationRequest = serde_json::from_str(json).unwrap();
        req.validate(&RequestDefaults::default()).unwrap()
    }

    #[test]
    fn test_full_day_with_object() {
        let p = params(
            r#"{"location": {"lat": 37.5665, "lon": 126.978, "altitude": 38},
                "datetime": {"date": "2025-06-21", "startTime": "04:00", "endTime": "20:00"},
                "object": {"height": 10, "width": 3}}"#,
        );
        let response = calculate(&FixedEngine::daylight(), &p).unwrap();
        assert_eq!(response.series.len(), 17);
        assert_eq!(response.summary.day_length, 14.0);
        assert_eq!(response.summary.max_altitude, Some(70.0));
        assert!(response.summary.total_irradiance.unwrap() > 0.0);
        assert!(!response.conditions.is_polar_region);

        let dawn = response.series[0].shadow.as_ref().unwrap();
        assert_eq!(dawn.status, ShadowStatus::NoSun);
        assert!(dawn.endpoint_coordinates.is_none());

        let noon = response.series[8].shadow.as_ref().unwrap();
        assert_eq!(noon.status, ShadowStatus::Normal);
        assert!((noon.length - 10.0 / 70.0_f64.to_radians().tan()).abs() < 1e-9);
        assert_eq!(noon.endpoint_coordinates.unwrap()[0], [126.978, 37.5665]);
        assert_eq!(noon.polygon.as_ref().map(Vec::len), Some(4));
        assert_eq!(response.series[8].sun.hour_angle, 0.0);
    }

    #[test]
    fn test_no_object_means_no_shadow() {
        let p = params(r#"{"location": {"lat": 10, "lon": 20}, "datetime": {"date": "2025-03-01"}}"#);
        let response = calculate(&FixedEngine::daylight(), &p).unwrap();
        assert_eq!(response.series.len(), 24);
        assert!(response.series.iter().all(|p| p.shadow.is_none()));
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["series"][0]["shadow"].is_null());
        assert!(json["summary"]["solarNoon"].is_string());
        assert!(json["metadata"]["requestId"].is_string());
    }

    #[test]
    fn test_polar_day_summary() {
        let p = params(r#"{"location": {"lat": 78.22, "lon": 15.65}, "datetime": {"date": "2025-06-21"}}"#);
        let response = calculate(&FixedEngine::polar_day(), &p).unwrap();
        assert!(response.summary.sunrise.is_none());
        assert_eq!(response.summary.day_length, 24.0);
        assert!(response.conditions.is_polar_day);
        assert!(response.conditions.warning.is_some());
    }

    #[test]
    fn test_polar_night_has_no_irradiance() {
        let p = params(
            r#"{"location": {"lat": 78.22, "lon": 15.65}, "datetime": {"date": "2025-12-21"},
                "object": {"height": 2}}"#,
        );
        let response = calculate(&FixedEngine::polar_night(), &p).unwrap();
        // missing sunrise reads as a full day even in polar night
        assert_eq!(response.summary.day_length, 24.0);
        assert!(response.conditions.is_polar_night);
        assert_eq!(response.summary.total_irradiance, Some(0.0));
        assert!(response
            .series
            .iter()
            .all(|p| p.shadow.as_ref().unwrap().status == ShadowStatus::NoSun));
        let result = optimizer::analyze(&response.series);
        assert!(result.max_irradiance.is_none());
        assert!(result.min_shadow.is_none());
    }

    #[test]
    fn test_reversed_window_yields_empty_series() {
        let p = params(
            r#"{"location": {"lat": 37.5, "lon": 127}, "datetime": {"date": "2025-06-21",
                "startTime": "20:00", "endTime": "06:00"}}"#,
        );
        let response = calculate(&FixedEngine::daylight(), &p).unwrap();
        assert!(response.series.is_empty());
        assert_eq!(response.summary.max_altitude, None);
        assert_eq!(response.summary.total_irradiance, Some(0.0));
        assert!(response.summary.sunrise.is_some());
    }

    #[test]
    fn test_seoul_solstice_with_spa() {
        let p = params(
            r#"{"location": {"lat": 37.5665, "lon": 126.978, "altitude": 38},
                "datetime": {"date": "2025-06-21", "startTime": "05:00", "endTime": "20:00", "interval": 1},
                "object": {"height": 10}}"#,
        );
        let response = calculate(&SpaEngine::new(), &p).unwrap();
        let max_altitude = response.summary.max_altitude.unwrap();
        assert!((max_altitude - 76.0).abs() <= 1.0, "max altitude {}", max_altitude);

        let result = optimizer::analyze(&response.series);
        let peak = result.max_irradiance.unwrap();
        let ghi = peak.ghi.unwrap();
        assert!((ghi - 1000.0).abs() <= 100.0, "ghi {}", ghi);
        assert!(!result.optimal_collection_periods.is_empty());
        let shortest = result.min_shadow.unwrap().shadow_length.unwrap();
        assert!(shortest > 2.0 && shortest < 3.0, "shortest shadow {}", shortest);
        assert!(response.summary.day_length > 14.0 && response.summary.day_length < 15.5);
    }
}
