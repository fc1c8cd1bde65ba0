//! Per-park GPX merge pipeline.
//!
//! One invocation processes one park directory to completion, strictly
//! sequentially and fully in memory:
//!
//! 1. [`park`] loads `park.json` and `Boundary.gpx` and extracts the park's
//!    public url, then appends the `POI.gpx` waypoints.
//! 2. [`trails`] walks the color-named subdirectories, derives per-trail
//!    metadata, renames every trail track with a collision-resistant
//!    segment tag, and appends the tracks and waypoints.
//! 3. [`strip_elevation`] removes elevation from every point.
//! 4. [`output`] writes `{name}.json` and `{name}.gpx`.
//!
//! There is no partial-output or rollback guarantee: any error aborts the
//! whole per-park run.

mod output;
mod park;
mod trails;

pub use output::{Metadata, SCHEMA_VERSION, write_outputs};
pub use park::{ParkSource, load_park, merge_poi};
pub use trails::{Trail, TrailColor, aggregate_trails, track_bounds, track_length_2d, trail_slug};

pub(crate) use park::read_gpx;

use gpx::{Gpx, GpxVersion};
use rand::Rng;
use std::path::Path;

/// Error types for the merge pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("missing required file: {}", .0.display())]
    MissingFile(std::path::PathBuf),

    #[error("park metadata: {0}")]
    Schema(String),

    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("track {0:?} has no points")]
    EmptyTrack(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Derive a park's slug from its directory name (lowercased).
pub fn park_slug(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| {
            PipelineError::Schema(format!(
                "park path {} has no usable directory name",
                path.display()
            ))
        })
}

/// Run every in-memory stage for one park directory.
///
/// Returns the merged track collection and the metadata document, ready for
/// [`write_outputs`]. The caller owns the random source so that segment tag
/// generation is seedable.
pub fn gather<R: Rng>(park_dir: &Path, rng: &mut R) -> Result<(Gpx, Metadata)> {
    let ParkSource {
        boundary: mut merged,
        metadata: parks,
        url,
    } = load_park(park_dir)?;
    merge_poi(park_dir, &mut merged)?;
    let trails = aggregate_trails(park_dir, &url, &mut merged, rng)?;
    strip_elevation(&mut merged);
    merged.version = GpxVersion::Gpx11;
    tracing::debug!(
        park = %park_dir.display(),
        tracks = merged.tracks.len(),
        waypoints = merged.waypoints.len(),
        trails = trails.len(),
        "gathered park data"
    );
    Ok((merged, Metadata::new(parks, trails)))
}

/// Remove elevation from every point in the collection.
///
/// A no-op on points that already lack elevation.
pub fn strip_elevation(gpx: &mut Gpx) {
    for waypoint in &mut gpx.waypoints {
        waypoint.elevation = None;
    }
    for route in &mut gpx.routes {
        for point in &mut route.points {
            point.elevation = None;
        }
    }
    for track in &mut gpx.tracks {
        for segment in &mut track.segments {
            for point in &mut segment.points {
                point.elevation = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpx::{Track, TrackSegment, Waypoint};

    fn waypoint_with_elevation(lat: f64, lon: f64, ele: f64) -> Waypoint {
        let mut waypoint = Waypoint::new(geo::Point::new(lon, lat));
        waypoint.elevation = Some(ele);
        waypoint
    }

    #[test]
    fn test_park_slug_lowercases_directory_name() {
        let slug = park_slug(Path::new("/data/parks/Tryon")).unwrap();
        assert_eq!(slug, "tryon");
    }

    #[test]
    fn test_park_slug_rejects_bare_root() {
        assert!(park_slug(Path::new("/")).is_err());
    }

    #[test]
    fn test_strip_elevation_clears_all_points() {
        let mut gpx = Gpx::default();
        gpx.waypoints.push(waypoint_with_elevation(43.0, -77.6, 120.0));

        let mut segment = TrackSegment::default();
        segment.points.push(waypoint_with_elevation(43.1, -77.5, 150.0));
        segment.points.push(Waypoint::new(geo::Point::new(-77.4, 43.2)));
        let mut track = Track::default();
        track.segments.push(segment);
        gpx.tracks.push(track);

        strip_elevation(&mut gpx);

        assert!(gpx.waypoints[0].elevation.is_none());
        for point in &gpx.tracks[0].segments[0].points {
            assert!(point.elevation.is_none());
        }
    }
}
