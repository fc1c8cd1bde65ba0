//! Coordinate precision rounding for GPX files.
//!
//! Latitude and longitude are rounded to 6 decimals (~0.1 m), standalone
//! waypoint elevation to 6 decimals, and track point elevation to 2.

use crate::pipeline::{Result, read_gpx};
use gpx::{Gpx, GpxVersion, Waypoint};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const COORD_DECIMALS: i32 = 6;
const TRACK_ELEVATION_DECIMALS: i32 = 2;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Rebuild a waypoint with rounded coordinates and elevation. The point
/// itself is only reachable through a constructor, so every other field is
/// carried over explicitly.
fn rounded(waypoint: &Waypoint, elevation_decimals: i32) -> Waypoint {
    let point = waypoint.point();
    let mut out = Waypoint::new(geo::Point::new(
        round_to(point.x(), COORD_DECIMALS),
        round_to(point.y(), COORD_DECIMALS),
    ));
    out.elevation = waypoint.elevation.map(|e| round_to(e, elevation_decimals));
    out.speed = waypoint.speed;
    out.time = waypoint.time.clone();
    out.name = waypoint.name.clone();
    out.comment = waypoint.comment.clone();
    out.description = waypoint.description.clone();
    out.source = waypoint.source.clone();
    out.links = waypoint.links.clone();
    out.symbol = waypoint.symbol.clone();
    out.type_ = waypoint.type_.clone();
    out.geoidheight = waypoint.geoidheight;
    out.fix = waypoint.fix.clone();
    out.sat = waypoint.sat;
    out.hdop = waypoint.hdop;
    out.vdop = waypoint.vdop;
    out.pdop = waypoint.pdop;
    out.dgps_age = waypoint.dgps_age;
    out.dgpsid = waypoint.dgpsid;
    out
}

/// Round coordinate precision across all waypoints and track points.
pub fn round_coordinates(doc: &mut Gpx) {
    for waypoint in &mut doc.waypoints {
        *waypoint = rounded(waypoint, COORD_DECIMALS);
    }
    for track in &mut doc.tracks {
        for segment in &mut track.segments {
            for point in &mut segment.points {
                *point = rounded(point, TRACK_ELEVATION_DECIMALS);
            }
        }
    }
}

/// Read `input`, round its coordinates, and write the result to `output`
/// as GPX 1.1.
pub fn truncate_file(input: &Path, output: &Path) -> Result<()> {
    let mut doc = read_gpx(input)?;
    round_coordinates(&mut doc);
    doc.version = GpxVersion::Gpx11;
    gpx::write(&doc, BufWriter::new(File::create(output)?))?;
    tracing::info!(input = %input.display(), output = %output.display(), "truncated GPX");
    Ok(())
}
