//! Trail aggregation: walks color-named subdirectories, derives per-trail
//! metadata, and merges the renamed tracks into the accumulator.

use crate::pipeline::{PipelineError, Result, park_slug, read_gpx};
use geo::{Distance, Haversine};
use gpx::{Gpx, Track};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// International mile, matching the imperial definition used upstream.
const METERS_PER_MILE: f64 = 1_609.344;

/// The closed set of recognized trail colors. Subdirectory names are
/// matched case-insensitively against these tokens; anything else is
/// skipped entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailColor {
    Black,
    Blue,
    Brown,
    DarkGreen,
    Grass,
    Green,
    Orange,
    Pink,
    Purple,
    Red,
    Sky,
    Teal,
    White,
    Yellow,
}

impl TrailColor {
    pub fn as_str(self) -> &'static str {
        match self {
            TrailColor::Black => "black",
            TrailColor::Blue => "blue",
            TrailColor::Brown => "brown",
            TrailColor::DarkGreen => "dark_green",
            TrailColor::Grass => "grass",
            TrailColor::Green => "green",
            TrailColor::Orange => "orange",
            TrailColor::Pink => "pink",
            TrailColor::Purple => "purple",
            TrailColor::Red => "red",
            TrailColor::Sky => "sky",
            TrailColor::Teal => "teal",
            TrailColor::White => "white",
            TrailColor::Yellow => "yellow",
        }
    }
}

impl FromStr for TrailColor {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "black" => Ok(TrailColor::Black),
            "blue" => Ok(TrailColor::Blue),
            "brown" => Ok(TrailColor::Brown),
            "dark_green" => Ok(TrailColor::DarkGreen),
            "grass" => Ok(TrailColor::Grass),
            "green" => Ok(TrailColor::Green),
            "orange" => Ok(TrailColor::Orange),
            "pink" => Ok(TrailColor::Pink),
            "purple" => Ok(TrailColor::Purple),
            "red" => Ok(TrailColor::Red),
            "sky" => Ok(TrailColor::Sky),
            "teal" => Ok(TrailColor::Teal),
            "white" => Ok(TrailColor::White),
            "yellow" => Ok(TrailColor::Yellow),
            _ => Err(()),
        }
    }
}

/// Derived per-trail metadata as it appears in the output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trail {
    pub name: String,
    pub color: TrailColor,
    /// 2D length in miles, ceiling-rounded to 2 decimals.
    pub length: f64,
    /// Southwest corner as `[latitude, longitude]`.
    #[serde(rename = "SW")]
    pub sw: [f64; 2],
    /// Northeast corner as `[latitude, longitude]`.
    #[serde(rename = "NE")]
    pub ne: [f64; 2],
    #[serde(rename = "parentID")]
    pub parent_id: String,
    pub url: String,
}

/// Derive a trail's slug from its display name: when the name contains a
/// hyphen, take the segment between the first and second hyphen, trimmed.
/// Either way, lowercase and replace spaces with underscores.
pub fn trail_slug(name: &str) -> String {
    let base = match name.split('-').nth(1) {
        Some(segment) => segment.trim(),
        None => name,
    };
    base.replace(' ', "_").to_lowercase()
}

/// Sum of consecutive-point great-circle distances in meters, ignoring
/// elevation. Segments do not chain into each other.
pub fn track_length_2d(track: &Track) -> f64 {
    let mut total = 0.0;
    for segment in &track.segments {
        for pair in segment.points.windows(2) {
            total += Haversine.distance(pair[0].point(), pair[1].point());
        }
    }
    total
}

/// Min/max latitude and longitude across every point in the track, as
/// `(SW, NE)` corners. `None` when the track has no points.
pub fn track_bounds(track: &Track) -> Option<([f64; 2], [f64; 2])> {
    let mut min_lat = f64::INFINITY;
    let mut min_lon = f64::INFINITY;
    let mut max_lat = f64::NEG_INFINITY;
    let mut max_lon = f64::NEG_INFINITY;
    let mut found = false;

    for segment in &track.segments {
        for waypoint in &segment.points {
            let point = waypoint.point();
            min_lat = min_lat.min(point.y());
            min_lon = min_lon.min(point.x());
            max_lat = max_lat.max(point.y());
            max_lon = max_lon.max(point.x());
            found = true;
        }
    }

    found.then_some(([min_lat, min_lon], [max_lat, max_lon]))
}

/// Smallest multiple of 0.01 that is >= the input.
fn ceil_hundredths(value: f64) -> f64 {
    (value * 100.0).ceil() / 100.0
}

/// Every merged track gets a unique, parseable name encoding its trail id
/// and 32 random bits, so downstream consumers can disambiguate tracks
/// while tracing them back to their trail.
fn segment_tag<R: Rng>(trail_id: &str, rng: &mut R) -> String {
    format!("seg:{trail_id}:{:08x}", rng.random::<u32>())
}

/// Walk the park directory's color subdirectories, record a [`Trail`] per
/// track, rename each track with a segment tag, and append all tracks and
/// waypoints to the accumulator.
///
/// Two tracks normalizing to the same trail id overwrite each other in the
/// returned mapping; each overwrite is logged rather than rejected.
pub fn aggregate_trails<R: Rng>(
    dir: &Path,
    url: &str,
    merged: &mut Gpx,
    rng: &mut R,
) -> Result<BTreeMap<String, Trail>> {
    let park = park_slug(dir)?;
    let mut trails = BTreeMap::new();
    let mut collisions = 0usize;

    for (color_dir, color) in color_dirs(dir)? {
        for file in gpx_files(&color_dir)? {
            let mut doc = read_gpx(&file)?;
            for track in &mut doc.tracks {
                let name = track.name.clone().unwrap_or_default();
                let id = format!("trails-{park}-{}", trail_slug(&name));
                let (sw, ne) =
                    track_bounds(track).ok_or_else(|| PipelineError::EmptyTrack(name.clone()))?;
                let trail = Trail {
                    name,
                    color,
                    length: ceil_hundredths(track_length_2d(track) / METERS_PER_MILE),
                    sw,
                    ne,
                    parent_id: format!("park-{park}"),
                    url: url.to_string(),
                };
                if trails.insert(id.clone(), trail).is_some() {
                    collisions += 1;
                    tracing::warn!(trail = %id, "trail id collision, overwriting earlier entry");
                }
                // Rename before the append below so the tag lands in the
                // merged copy.
                track.name = Some(segment_tag(&id, rng));
            }
            merged.tracks.append(&mut doc.tracks);
            merged.waypoints.append(&mut doc.waypoints);
        }
    }

    if collisions > 0 {
        tracing::warn!(collisions, park = %park, "overwrote colliding trail ids");
    }
    Ok(trails)
}

/// Immediate subdirectories whose name parses as a [`TrailColor`], sorted
/// by name for deterministic output order.
fn color_dirs(dir: &Path) -> Result<Vec<(std::path::PathBuf, TrailColor)>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Ok(color) = name.parse::<TrailColor>() {
            dirs.push((path, color));
        }
    }
    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(dirs)
}

/// `*.gpx` files directly inside a color directory (not recursive), sorted.
fn gpx_files(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_gpx = path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("gpx"));
        if is_gpx {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpx::{TrackSegment, Waypoint};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn track_with_points(points: &[(f64, f64)]) -> Track {
        let mut segment = TrackSegment::default();
        for &(lat, lon) in points {
            segment.points.push(Waypoint::new(geo::Point::new(lon, lat)));
        }
        let mut track = Track::default();
        track.segments.push(segment);
        track
    }

    #[test]
    fn test_trail_slug_hyphenated_name() {
        assert_eq!(trail_slug("Trail - Loop A"), "loop_a");
    }

    #[test]
    fn test_trail_slug_takes_segment_between_first_and_second_hyphen() {
        assert_eq!(trail_slug("Tryon - East Rim - upper"), "east_rim");
    }

    #[test]
    fn test_trail_slug_without_hyphen() {
        assert_eq!(trail_slug("North Meadow"), "north_meadow");
    }

    #[test]
    fn test_color_parsing_is_case_insensitive() {
        assert_eq!("Red".parse::<TrailColor>(), Ok(TrailColor::Red));
        assert_eq!("DARK_GREEN".parse::<TrailColor>(), Ok(TrailColor::DarkGreen));
        assert!("Striped".parse::<TrailColor>().is_err());
    }

    #[test]
    fn test_color_serializes_to_lowercase_token() {
        let json = serde_json::to_string(&TrailColor::DarkGreen).unwrap();
        assert_eq!(json, "\"dark_green\"");
    }

    #[test]
    fn test_ceil_hundredths_rounds_up() {
        assert_eq!(ceil_hundredths(1.001), 1.01);
        assert_eq!(ceil_hundredths(2.0), 2.0);
        assert_eq!(ceil_hundredths(0.111), 0.12);
    }

    #[test]
    fn test_track_length_monotonic() {
        let short = track_with_points(&[(43.0, -77.6), (43.01, -77.6)]);
        let long = track_with_points(&[(43.0, -77.6), (43.01, -77.6), (43.03, -77.6)]);
        assert!(track_length_2d(&long) > track_length_2d(&short));
        assert!(track_length_2d(&short) > 0.0);
    }

    #[test]
    fn test_track_length_ignores_elevation() {
        let mut track = track_with_points(&[(43.0, -77.6), (43.01, -77.6)]);
        let flat = track_length_2d(&track);
        for point in &mut track.segments[0].points {
            point.elevation = Some(500.0);
        }
        assert_eq!(track_length_2d(&track), flat);
    }

    #[test]
    fn test_track_bounds_min_max_corners() {
        let track = track_with_points(&[(43.1, -77.5), (43.0, -77.6)]);
        let (sw, ne) = track_bounds(&track).unwrap();
        assert_eq!(sw, [43.0, -77.6]);
        assert_eq!(ne, [43.1, -77.5]);
    }

    #[test]
    fn test_track_bounds_single_point() {
        let track = track_with_points(&[(43.05, -77.55)]);
        let (sw, ne) = track_bounds(&track).unwrap();
        assert_eq!(sw, ne);
        assert_eq!(sw, [43.05, -77.55]);
    }

    #[test]
    fn test_track_bounds_empty_track() {
        assert!(track_bounds(&Track::default()).is_none());
    }

    #[test]
    fn test_segment_tag_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let tag = segment_tag("trails-tryon-loop_a", &mut rng);
        let parts: Vec<&str> = tag.split(':').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "seg");
        assert_eq!(parts[1], "trails-tryon-loop_a");
        assert_eq!(parts[2].len(), 8);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_segment_tag_seeded_determinism() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(segment_tag("trails-x-y", &mut a), segment_tag("trails-x-y", &mut b));
    }
}
