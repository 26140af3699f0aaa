#[cfg(feature = "hprof")]
use coarse_prof::profile;
use math::{Plane, Polygon, Side};

/// Polygons below this area are slivers that cannot bound a frustum
const MIN_FRUSTUM_POLYGON_AREA: f64 = 1e-6;

fn spans_area(poly: &Polygon) -> bool {
    poly.vertices.len() >= 3 && poly.plane.is_valid() && poly.area() >= MIN_FRUSTUM_POLYGON_AREA
}

/// Builds the planes bounding all light that `light_source` can throw
/// through `hole`. The common front half-space of the planes contains every
/// such line.
///
/// `light_source` shines against its normal and `hole` lets light pass
/// against its normal, which matches portals whose normals point into their
/// own region. The hole has to lie entirely behind the light source and the
/// light source entirely in front of the hole, otherwise (and for degenerate
/// polygons) the result is empty.
///
/// Each edge of either polygon contributes at most one plane, the first
/// candidate through the edge and a vertex of the other polygon that
/// separates the two.
pub fn build_frustum(light_source: &Polygon, hole: &Polygon, epsilon: f64) -> Vec<Plane> {
    #[cfg(feature = "hprof")]
    profile!("build_frustum");
    let mut frustum = Vec::new();

    if !spans_area(light_source) || !spans_area(hole) {
        return frustum;
    }
    if hole.what_side_simple(&light_source.plane, epsilon) != Side::Back {
        return frustum;
    }
    if light_source.what_side_simple(&hole.plane, epsilon) != Side::Front {
        return frustum;
    }

    // Planes through the edges of the hole, light source behind or in them
    sweep_edges(hole, light_source, epsilon, &mut frustum, |side| {
        matches!(side, Side::Back | Side::InMirrored)
    });
    // With the roles swapped the planes through the light source edges come
    // out with the same orientation, so the hole must be in front of them
    sweep_edges(light_source, hole, epsilon, &mut frustum, |side| {
        matches!(side, Side::Front | Side::InMirrored)
    });

    frustum
}

fn sweep_edges(
    edges: &Polygon,
    apexes: &Polygon,
    epsilon: f64,
    frustum: &mut Vec<Plane>,
    accept: impl Fn(Side) -> bool,
) {
    let mut v2 = edges.vertices.len() - 1;

    for v3 in 0..edges.vertices.len() {
        let from = edges.vertices[v2];
        let edge = edges.vertices[v3] - from;

        for apex in &apexes.vertices {
            let normal = edge.cross(*apex - from);
            let length = normal.length();
            if length < epsilon {
                continue;
            }
            let normal = normal / length;
            let plane = Plane::new(normal, from.dot(normal));

            if accept(apexes.what_side_simple(&plane, epsilon)) {
                frustum.push(plane);
                break;
            }
        }

        v2 = v3;
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use super::*;

    /// Rectangle in the plane `x == at`, facing `facing` along X
    fn window(at: f64, y0: f64, y1: f64, z0: f64, z1: f64, facing: f64) -> Polygon {
        let poly = Polygon::from_vertices(vec![
            DVec3::new(at, y0, z0),
            DVec3::new(at, y1, z0),
            DVec3::new(at, y1, z1),
            DVec3::new(at, y0, z1),
        ]);
        if poly.plane.normal.x * facing < 0.0 {
            poly.mirror()
        } else {
            poly
        }
    }

    #[test]
    fn test_frustum_between_aligned_windows() {
        let light = window(0.0, 0.0, 100.0, 0.0, 100.0, -1.0);
        let hole = window(200.0, 0.0, 100.0, 0.0, 100.0, -1.0);

        let frustum = build_frustum(&light, &hole, 2.0);
        assert_eq!(frustum.len(), 8);

        // The straight line through both centers is inside
        let beyond = DVec3::new(300.0, 50.0, 50.0);
        for plane in &frustum {
            assert!(plane.distance_to_point(beyond) > 0.0);
        }
        // Far off to the side is not
        let aside = DVec3::new(300.0, 1000.0, 50.0);
        assert!(frustum.iter().any(|p| p.distance_to_point(aside) < 0.0));
    }

    #[test]
    fn test_frustum_between_offset_windows() {
        let light = window(256.0, 0.0, 64.0, 0.0, 256.0, -1.0);
        let hole = window(512.0, 960.0, 1024.0, 0.0, 256.0, -1.0);

        let frustum = build_frustum(&light, &hole, 2.0);
        assert!(!frustum.is_empty());

        // Behind the near wall, below the steepest sight line
        let shadowed = DVec3::new(768.0, 32.0, 128.0);
        assert!(frustum.iter().any(|p| p.distance_to_point(shadowed) < 0.0));
        // Continuing the sight line from (256, 32) through (512, 992)
        let lit = DVec3::new(640.0, 1472.0, 128.0);
        assert!(frustum.iter().all(|p| p.distance_to_point(lit) > 0.0));
    }

    #[test]
    fn test_frustum_requires_hole_behind_light() {
        let light = window(0.0, 0.0, 100.0, 0.0, 100.0, -1.0);
        // Hole on the wrong side of the light source
        let hole = window(-200.0, 0.0, 100.0, 0.0, 100.0, -1.0);
        assert!(build_frustum(&light, &hole, 2.0).is_empty());

        // Hole facing away from the light source
        let hole = window(200.0, 0.0, 100.0, 0.0, 100.0, 1.0);
        assert!(build_frustum(&light, &hole, 2.0).is_empty());

        // Coplanar polygons
        let hole = window(0.0, 200.0, 300.0, 0.0, 100.0, -1.0);
        assert!(build_frustum(&light, &hole, 2.0).is_empty());
    }

    #[test]
    fn test_degenerate_hole_gives_empty_frustum() {
        let light = window(0.0, 0.0, 100.0, 0.0, 100.0, -1.0);

        let collinear = Polygon::from_vertices(vec![
            DVec3::new(200.0, 0.0, 0.0),
            DVec3::new(200.0, 50.0, 0.0),
            DVec3::new(200.0, 100.0, 0.0),
        ]);
        assert!(build_frustum(&light, &collinear, 2.0).is_empty());
        assert!(build_frustum(&collinear, &light, 2.0).is_empty());

        let mut sliver = window(200.0, 0.0, 100.0, 0.0, 100.0, -1.0);
        for v in sliver.vertices.iter_mut() {
            v.z = v.z.min(1e-9);
        }
        assert!(build_frustum(&light, &sliver, 2.0).is_empty());

        let empty = Polygon::new(Vec::new(), light.plane);
        assert!(build_frustum(&light, &empty, 2.0).is_empty());
    }
}
