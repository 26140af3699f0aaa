use glam::DVec3;

/// Queries against the full level geometry, used to seed visibility with
/// traced rays
pub trait World {
    /// Index of the leaf containing `point`
    fn what_leaf(&self, point: DVec3) -> usize;

    /// Traces the segment `origin .. origin + direction` and returns the
    /// fraction of it that is unobstructed, `1.0` meaning a clear line.
    fn clip_line(&self, origin: DVec3, direction: DVec3) -> f64;

    /// Coarse leaf visibility computed upstream, if any. Pairs reported as
    /// not visible here are not traced.
    fn leaves_in_base_pvs(&self, _leaf_a: usize, _leaf_b: usize) -> bool {
        true
    }
}
