// Ingestion caps for imported data and interactive sessions

pub const MAX_IMPORT_FEATURES: usize = 250_000;
pub const MAX_GEOMETRY_VERTICES: usize = 100_000;
pub const MAX_IMPORT_VERTICES_TOTAL: usize = 5_000_000;

// Clicks accumulated by one drawing, lasso or measure session
pub const MAX_SESSION_POINTS: usize = 10_000;

#[inline]
pub fn finite_pair(lon: f64, lat: f64) -> bool {
    lon.is_finite() && lat.is_finite()
}
