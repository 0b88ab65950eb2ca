//! Command implementations for the sunpath CLI.
//!
//! Every subcommand reads its input from flags or a JSON file and writes
//! JSON (or CSV for `export`) to stdout or an output file.

use clap::{Args, Subcommand};
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sunpath_core::request::{DateTimeInput, LocationInput, ObjectInput};
use sunpath_core::{BatchRequest, CalculationRequest, ClearSkyModel, Location};
use sunpath_data::{optimizer, shadow};

pub mod batch;
pub mod calculate;
pub mod config;
pub mod export;

pub use calculate::Calculator;
pub use config::Settings;
use export::ExportFormat;

/// A calculation described either by a JSON request file or by flags.
#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    /// JSON file holding a full calculation request; other request flags are ignored
    #[arg(short = 'r', long)]
    pub request: Option<PathBuf>,

    /// Latitude, degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude, degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Altitude above sea level, meters
    #[arg(long, default_value_t = 0.0)]
    pub altitude: f64,

    /// Date as YYYY-MM-DD
    #[arg(long)]
    pub date: Option<String>,

    #[arg(long, default_value = sunpath_core::request::DEFAULT_START_TIME)]
    pub start: String,

    #[arg(long, default_value = sunpath_core::request::DEFAULT_END_TIME)]
    pub end: String,

    /// Sampling interval, minutes
    #[arg(long, default_value_t = sunpath_core::request::DEFAULT_INTERVAL_MINUTES)]
    pub interval: u32,

    /// Object height for shadow calculations, meters
    #[arg(long)]
    pub height: Option<f64>,

    /// Object width, meters
    #[arg(long)]
    pub width: Option<f64>,

    /// Terrain slope under the object, degrees
    #[arg(long, requires = "height")]
    pub terrain_slope: Option<f64>,

    /// Downhill-facing terrain direction, degrees from north
    #[arg(long, requires = "height", allow_hyphen_values = true)]
    pub terrain_aspect: Option<f64>,

    /// Clear-sky model: ineichen, haurwitz or simplified_solis
    #[arg(long, default_value = "ineichen")]
    pub model: String,
}

impl RequestArgs {
    pub fn to_request(&self) -> anyhow::Result<CalculationRequest> {
        if let Some(path) = &self.request {
            let raw = std::fs::read_to_string(path)?;
            return Ok(serde_json::from_str(&raw)?);
        }
        let (Some(lat), Some(lon), Some(date)) = (self.lat, self.lon, self.date.clone()) else {
            anyhow::bail!("either --request or all of --lat, --lon and --date are required");
        };
        let model: ClearSkyModel = self.model.parse()?;
        let mut request = CalculationRequest {
            location: LocationInput {
                lat,
                lon,
                altitude: self.altitude,
            },
            datetime: DateTimeInput {
                date,
                start_time: self.start.clone(),
                end_time: self.end.clone(),
                interval: self.interval,
            },
            object: self.height.map(|height| ObjectInput {
                height,
                width: self.width,
                terrain_slope: self.terrain_slope,
                terrain_aspect: self.terrain_aspect,
            }),
            options: Default::default(),
        };
        request.options.model = model;
        Ok(request)
    }
}

#[derive(Subcommand)]
pub enum ShadowCommand {
    /// Describe a shadow in words
    Describe {
        /// Shadow length, meters
        #[arg(long)]
        length: f64,
        /// Direction the shadow points to, degrees from north
        #[arg(long)]
        direction: f64,
        /// Object height, meters
        #[arg(long)]
        height: f64,
    },
    /// Compare height / tan(altitude) against a reference length
    Validate {
        #[arg(long)]
        height: f64,
        /// Sun altitude, degrees
        #[arg(long, allow_hyphen_values = true)]
        altitude: f64,
        /// Reference shadow length, meters
        #[arg(long)]
        expected: f64,
        /// Accepted error, percent
        #[arg(long, default_value_t = shadow::DEFAULT_TOLERANCE_PERCENT)]
        tolerance: f64,
    },
}

#[derive(Subcommand)]
pub enum Command {
    /// Sun positions, irradiance and shadows for one location and date
    Calculate {
        #[command(flatten)]
        request: RequestArgs,
        /// Write the JSON response here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Sunrise, sunset, solar noon and day length
    SunTimes {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, default_value_t = 0.0)]
        altitude: f64,
        #[arg(long)]
        date: String,
        /// Clear-sky model for the sunrise and sunset irradiance
        #[arg(long, default_value = "ineichen")]
        model: String,
    },

    /// Shadow helpers
    #[command(subcommand)]
    Shadow(ShadowCommand),

    /// Peak instants and best collection periods of a calculation
    Optimize {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Run many calculations from a JSON batch file
    Batch {
        /// JSON file holding `{requests: [...], parallel: bool}`
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Force sequential processing
        #[arg(long)]
        sequential: bool,
    },

    /// Cache availability, counters and entry count
    CacheStats,

    /// Delete cache entries whose key matches a glob
    CacheClear {
        /// Glob with `*` and `?`, 1 to 100 characters
        #[arg(short, long)]
        pattern: String,
    },

    /// Write the series of a calculation as CSV or JSON
    Export {
        #[command(flatten)]
        request: RequestArgs,
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub async fn run(command: Command, settings: Settings) -> anyhow::Result<()> {
    let calculator = Calculator::from_settings(&settings);
    match command {
        Command::Calculate { request, output } => {
            let response = calculator.calculate(&request.to_request()?)?;
            emit(output.as_deref(), &serde_json::to_string_pretty(&response)?)
        }
        Command::SunTimes {
            lat,
            lon,
            altitude,
            date,
            model,
        } => {
            let location = Location::new(lat, lon, altitude)?;
            let report = calculator.sun_times(&location, &date, model.parse()?)?;
            emit(None, &serde_json::to_string_pretty(&report)?)
        }
        Command::Shadow(ShadowCommand::Describe {
            length,
            direction,
            height,
        }) => emit(None, &shadow::describe(length, direction, height)),
        Command::Shadow(ShadowCommand::Validate {
            height,
            altitude,
            expected,
            tolerance,
        }) => {
            let report = shadow::validate(height, altitude, expected, tolerance)?;
            emit(None, &serde_json::to_string_pretty(&report)?)
        }
        Command::Optimize { request } => {
            let response = calculator.calculate(&request.to_request()?)?;
            let result = optimizer::analyze(&response.series);
            emit(None, &serde_json::to_string_pretty(&result)?)
        }
        Command::Batch {
            input,
            output,
            sequential,
        } => {
            let raw = std::fs::read_to_string(&input)?;
            let mut batch: BatchRequest = serde_json::from_str(&raw)?;
            if sequential {
                batch.parallel = false;
            }
            info!("running batch of {} from {}", batch.requests.len(), input.display());
            let response = batch::run_batch(Arc::new(calculator), batch, settings.batch_workers).await;
            emit(output.as_deref(), &serde_json::to_string_pretty(&response)?)
        }
        Command::CacheStats => emit(None, &serde_json::to_string_pretty(&calculator.cache().stats())?),
        Command::CacheClear { pattern } => {
            let removed = calculator.cache().clear_pattern(&pattern)?;
            emit(None, &serde_json::json!({ "pattern": pattern, "deleted": removed }).to_string())
        }
        Command::Export {
            request,
            format,
            output,
        } => {
            let response = calculator.calculate(&request.to_request()?)?;
            emit(output.as_deref(), &export::render(&response.series, format)?)
        }
    }
}

fn emit(output: Option<&Path>, contents: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, contents)?;
            info!("wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(contents.as_bytes())?;
            if !contents.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use sunpath_core::RequestDefaults;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        settings: Settings,
        #[command(subcommand)]
        command: Command,
    }

    fn parse(args: &[&str]) -> Command {
        TestCli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn request_from_flags() {
        let Command::Calculate { request, .. } = parse(&[
            "sunpath", "calculate", "--lat", "-33.9", "--lon", "18.4", "--date", "2025-06-21", "--height", "10",
            "--model", "haurwitz",
        ]) else {
            panic!("expected calculate");
        };
        let req = request.to_request().unwrap();
        assert_eq!(req.location.lat, -33.9);
        assert_eq!(req.datetime.start_time, "00:00");
        assert_eq!(req.datetime.interval, 60);
        assert_eq!(req.object.unwrap().height, 10.0);
        assert_eq!(req.options.model, ClearSkyModel::Haurwitz);
        assert!(req.options.atmosphere);
    }

    #[test]
    fn terrain_flags_reach_the_object() {
        let Command::Calculate { request, .. } = parse(&[
            "sunpath", "calculate", "--lat", "37.5665", "--lon", "126.978", "--date", "2025-06-21", "--height",
            "10", "--terrain-slope", "15", "--terrain-aspect", "180",
        ]) else {
            panic!("expected calculate");
        };
        let object = request.to_request().unwrap().object.unwrap();
        assert_eq!(object.terrain_slope, Some(15.0));
        assert_eq!(object.terrain_aspect, Some(180.0));

        let Command::Calculate { request, .. } = parse(&[
            "sunpath", "calculate", "--lat", "10", "--lon", "20", "--date", "2025-06-21", "--height", "10",
            "--terrain-slope", "95",
        ]) else {
            panic!("expected calculate");
        };
        let defaults = RequestDefaults::default();
        assert!(request.to_request().unwrap().validate(&defaults).unwrap_err().is_client_error());
    }

    #[test]
    fn terrain_needs_an_object() {
        assert!(TestCli::try_parse_from([
            "sunpath", "calculate", "--lat", "10", "--lon", "20", "--date", "2025-06-21", "--terrain-slope", "15",
        ])
        .is_err());
    }

    #[test]
    fn request_needs_location_and_date() {
        let Command::Optimize { request } = parse(&["sunpath", "optimize", "--lat", "10"]) else {
            panic!("expected optimize");
        };
        assert!(request.to_request().is_err());
    }

    #[test]
    fn unknown_model_is_rejected() {
        let Command::Export { request, format, .. } = parse(&[
            "sunpath", "export", "--lat", "1", "--lon", "2", "--date", "2025-01-01", "--model", "bird", "-f", "json",
        ]) else {
            panic!("expected export");
        };
        assert_eq!(format, ExportFormat::Json);
        assert!(request.to_request().is_err());
    }

    #[test]
    fn request_from_file() {
        let path = std::env::temp_dir().join(format!("sunpath-request-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"location": {"lat": 37.5665, "lon": 126.978}, "datetime": {"date": "2025-06-21", "interval": 30}}"#,
        )
        .unwrap();
        let Command::Calculate { request, .. } = parse(&["sunpath", "calculate", "-r", path.to_str().unwrap()])
        else {
            panic!("expected calculate");
        };
        let req = request.to_request().unwrap();
        assert_eq!(req.datetime.interval, 30);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn global_settings_after_subcommand() {
        let cli = TestCli::try_parse_from(["sunpath", "cache-clear", "--pattern", "integrated_*", "--no-cache"]).unwrap();
        assert!(cli.settings.no_cache);
        assert!(matches!(cli.command, Command::CacheClear { .. }));
    }
}
