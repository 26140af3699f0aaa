use glam::DVec3;

/// Plane equation, `normal.dot(x) - dist == 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: DVec3,
    pub dist: f64,
}

impl Plane {
    #[inline]
    pub const fn new(normal: DVec3, dist: f64) -> Self {
        Self { normal, dist }
    }

    /// Create plane from three points. Seen from the front of the resulting
    /// plane the points run clockwise.
    ///
    /// Returns `None` if the points are too close to collinear, that is if the
    /// length of the unnormalized normal is not greater than `epsilon`.
    pub fn from_points(a: DVec3, b: DVec3, c: DVec3, epsilon: f64) -> Option<Self> {
        let normal = (c - a).cross(b - a);
        let length = normal.length();
        if length <= epsilon {
            return None;
        }
        let normal = normal / length;
        Some(Self {
            normal,
            dist: a.dot(normal),
        })
    }

    /// Create plane from point and normal
    #[inline]
    pub fn from_point_normal(point: DVec3, normal: DVec3) -> Self {
        Self {
            normal,
            dist: normal.dot(point),
        }
    }

    /// Signed distance of the point, positive in front
    #[inline]
    pub fn distance_to_point(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.dist
    }

    /// Classify point relative to plane with a plane thickness of `2 * epsilon`
    pub fn classify_point(&self, point: DVec3, epsilon: f64) -> PlaneClassification {
        let distance = self.distance_to_point(point);

        if distance > epsilon {
            PlaneClassification::Front
        } else if distance < -epsilon {
            PlaneClassification::Back
        } else {
            PlaneClassification::OnPlane
        }
    }

    /// Same plane with front and back swapped
    #[inline]
    pub fn mirror(&self) -> Self {
        Self {
            normal: -self.normal,
            dist: -self.dist,
        }
    }

    /// The normal must be finite and of (roughly) unit length.
    pub fn is_valid(&self) -> bool {
        if !self.normal.is_finite() || !self.dist.is_finite() {
            return false;
        }
        let len2 = self.normal.length_squared();
        len2 > 0.9 * 0.9 && len2 < 1.1 * 1.1
    }

    /// Point where the line through `a` and `b` crosses the plane.
    ///
    /// The caller must make sure the line is not parallel to the plane, the
    /// split routines only call this for points on strictly opposite sides.
    #[inline]
    pub fn intersection(&self, a: DVec3, b: DVec3) -> DVec3 {
        let ab = b - a;
        let cos_angle = self.normal.dot(ab);
        a + ab * ((self.dist - self.normal.dot(a)) / cos_angle)
    }
}

/// Point classification relative to plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneClassification {
    Front,
    Back,
    OnPlane,
}
