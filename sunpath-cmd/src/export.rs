//! Series export as CSV or JSON.

use clap::ValueEnum;
use csv::Writer;
use std::io::Write;
use sunpath_core::SeriesPoint;

pub const CSV_HEADER: [&str; 10] = [
    "timestamp",
    "altitude",
    "azimuth",
    "zenith",
    "ghi",
    "dni",
    "dhi",
    "par",
    "shadow_length",
    "shadow_direction",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

fn number(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => String::new(),
    }
}

fn shadow_length(point: &SeriesPoint) -> String {
    match &point.shadow {
        Some(shadow) if shadow.length.is_infinite() => "Infinite".to_string(),
        Some(shadow) => number(Some(shadow.length)),
        None => String::new(),
    }
}

/// One row per instant; missing and non-finite values are empty fields.
pub fn write_csv<W: Write>(series: &[SeriesPoint], writer: W) -> anyhow::Result<()> {
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for point in series {
        let irradiance = point.irradiance.as_ref();
        wtr.write_record([
            point.timestamp.to_rfc3339(),
            number(Some(point.sun.altitude)),
            number(Some(point.sun.azimuth)),
            number(Some(point.sun.zenith)),
            number(irradiance.map(|i| i.ghi)),
            number(irradiance.map(|i| i.dni)),
            number(irradiance.map(|i| i.dhi)),
            number(irradiance.and_then(|i| i.par)),
            shadow_length(point),
            number(point.shadow.as_ref().and_then(|s| s.direction)),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn render(series: &[SeriesPoint], format: ExportFormat) -> anyhow::Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(series)?),
        ExportFormat::Csv => {
            let mut buf = Vec::new();
            write_csv(series, &mut buf)?;
            Ok(String::from_utf8(buf)?)
        }
    }
}
