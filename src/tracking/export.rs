use crate::domain::ports::Storage;
use crate::tracking::recorder::TrackPoint;
use crate::utils::error::{MarinexError, Result};
use chrono::SecondsFormat;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;
use std::str::FromStr;
use zip::write::{FileOptions, ZipWriter};

const DEFAULT_NAME: &str = "Route";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Gpx,
    Kml,
    Csv,
    Zip,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Gpx => "gpx",
            ExportFormat::Kml => "kml",
            ExportFormat::Csv => "csv",
            ExportFormat::Zip => "zip",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = MarinexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gpx" => Ok(ExportFormat::Gpx),
            "kml" => Ok(ExportFormat::Kml),
            "csv" => Ok(ExportFormat::Csv),
            "zip" => Ok(ExportFormat::Zip),
            other => Err(MarinexError::Validation {
                message: format!("Unsupported export format '{}'", other),
            }),
        }
    }
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn route_name(name: Option<&str>) -> String {
    xml_escape(
        name.map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_NAME),
    )
}

fn valid(points: &[TrackPoint]) -> impl Iterator<Item = &TrackPoint> {
    points.iter().filter(|p| p.position().is_valid())
}

/// GPX 1.1 track, one `trkpt` per point with its time and speed.
pub fn to_gpx(name: Option<&str>, points: &[TrackPoint]) -> String {
    let mut gpx = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <gpx version=\"1.1\" creator=\"Marinex\" xmlns=\"http://www.topografix.com/GPX/1/1\">\n",
    );
    let _ = writeln!(gpx, "  <trk>\n    <name>{}</name>\n    <trkseg>", route_name(name));
    for p in valid(points) {
        let _ = writeln!(
            gpx,
            "      <trkpt lat=\"{}\" lon=\"{}\"><time>{}</time><extensions><speed>{:.2}</speed></extensions></trkpt>",
            p.lat,
            p.lng,
            p.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            p.speed
        );
    }
    gpx.push_str("    </trkseg>\n  </trk>\n</gpx>\n");
    gpx
}

/// KML 2.2 placemark with a single LineString.
pub fn to_kml(name: Option<&str>, points: &[TrackPoint]) -> String {
    let mut kml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <kml xmlns=\"http://www.opengis.net/kml/2.2\">\n<Document>\n",
    );
    let _ = writeln!(
        kml,
        "  <Placemark>\n    <name>{}</name>\n    <LineString>\n      <coordinates>",
        route_name(name)
    );
    for p in valid(points) {
        let _ = writeln!(kml, "        {},{},0", p.lng, p.lat);
    }
    kml.push_str("      </coordinates>\n    </LineString>\n  </Placemark>\n</Document>\n</kml>\n");
    kml
}

#[derive(Serialize)]
struct CsvRow<'a> {
    index: usize,
    lat: f64,
    lng: f64,
    speed: f64,
    #[serde(rename = "type")]
    kind: &'a str,
    recorded_at: String,
}

pub fn to_csv(points: &[TrackPoint]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for (index, p) in valid(points).enumerate() {
        writer.serialize(CsvRow {
            index,
            lat: p.lat,
            lng: p.lng,
            speed: p.speed,
            kind: p.kind.as_str(),
            recorded_at: p.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        })?;
    }
    writer
        .into_inner()
        .map_err(|e| MarinexError::Io(e.into_error()))
}

/// `route.gpx`, `route.kml` and `points.csv` in one archive.
pub fn to_zip(name: Option<&str>, points: &[TrackPoint]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>("route.gpx", FileOptions::default())?;
    zip.write_all(to_gpx(name, points).as_bytes())?;

    zip.start_file::<_, ()>("route.kml", FileOptions::default())?;
    zip.write_all(to_kml(name, points).as_bytes())?;

    zip.start_file::<_, ()>("points.csv", FileOptions::default())?;
    zip.write_all(&to_csv(points)?)?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

pub fn render(format: ExportFormat, name: Option<&str>, points: &[TrackPoint]) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Gpx => Ok(to_gpx(name, points).into_bytes()),
        ExportFormat::Kml => Ok(to_kml(name, points).into_bytes()),
        ExportFormat::Csv => to_csv(points),
        ExportFormat::Zip => to_zip(name, points),
    }
}

/// Renders the track and writes it through `storage`; returns the file name.
pub async fn export_to<S: Storage>(
    storage: &S,
    file_stem: &str,
    format: ExportFormat,
    name: Option<&str>,
    points: &[TrackPoint],
) -> Result<String> {
    let data = render(format, name, points)?;
    let file_name = format!("{}.{}", file_stem, format.extension());
    tracing::debug!("Writing {} ({} bytes)", file_name, data.len());
    storage.write_file(&file_name, &data).await?;
    tracing::info!("📦 Exported {} points to {}", points.len(), file_name);
    Ok(file_name)
}
