//! Batch tools for per-park GPX track packs.
//!
//! A park directory holds `park.json`, `Boundary.gpx`, `POI.gpx`, and one
//! subdirectory per trail color containing the trail GPX files. The
//! [`pipeline`] module merges all of it into a single GPX document plus a
//! JSON sidecar describing every trail. [`compare`] diffs two derived
//! GeoJSON feature collections while ignoring noise, and [`truncate`]
//! rounds coordinate precision in a GPX file.

pub mod cli;
pub mod compare;
pub mod pipeline;
pub mod truncate;
