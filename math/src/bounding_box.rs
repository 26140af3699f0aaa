#[cfg(feature = "hprof")]
use coarse_prof::profile;
use glam::DVec3;

use crate::Plane;

/// Result of classifying a box against a plane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxSide {
    Front,
    Back,
    Both,
}

/// Pairs of corner indices, see `BoundingBox::corners`
const EDGES: [(usize, usize); 12] = [
    (0, 1),
    (0, 2),
    (0, 4),
    (7, 3),
    (7, 5),
    (7, 6),
    (1, 3),
    (1, 5),
    (6, 2),
    (6, 4),
    (4, 5),
    (2, 3),
];

/// Axis aligned box. A freshly created box is "uninitialized": it contains
/// nothing until the first point is inserted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBox {
    /// The uninitialized box
    pub const fn new() -> Self {
        Self {
            min: DVec3::splat(f64::MAX),
            max: DVec3::splat(-f64::MAX),
        }
    }

    pub fn from_corners(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box holding all points, uninitialized if `points` is empty
    pub fn from_points(points: &[DVec3]) -> Self {
        let mut bb = Self::new();
        bb.expand_to_include_points(points);
        bb
    }

    #[inline]
    pub fn is_inited(&self) -> bool {
        self.min.x <= self.max.x
    }

    #[inline]
    pub fn expand_to_include_point(&mut self, point: DVec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn expand_to_include_points(&mut self, points: &[DVec3]) {
        for point in points {
            self.expand_to_include_point(*point);
        }
    }

    pub fn expand_to_include_box(&mut self, other: &BoundingBox) {
        self.expand_to_include_point(other.min);
        self.expand_to_include_point(other.max);
    }

    /// Overlap with positive volume, boxes that merely touch do not intersect
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Box grown by `epsilon` on every side. A negative `epsilon` shrinks it,
    /// possibly past the point where min and max cross over.
    #[inline]
    pub fn epsilon_box(&self, epsilon: f64) -> Self {
        let e = DVec3::splat(epsilon);
        Self {
            min: self.min - e,
            max: self.max + e,
        }
    }

    /// The corner nearest to and the corner farthest from `plane`, measured
    /// along its normal.
    fn near_far(&self, plane: &Plane) -> (DVec3, DVec3) {
        let mut near = self.max;
        let mut far = self.min;
        if plane.normal.x > 0.0 {
            near.x = self.min.x;
            far.x = self.max.x;
        }
        if plane.normal.y > 0.0 {
            near.y = self.min.y;
            far.y = self.max.y;
        }
        if plane.normal.z > 0.0 {
            near.z = self.min.z;
            far.z = self.max.z;
        }
        (near, far)
    }

    pub fn what_side(&self, plane: &Plane, epsilon: f64) -> BoxSide {
        let (near, far) = self.near_far(plane);

        if plane.distance_to_point(near) >= epsilon {
            return BoxSide::Front;
        }
        if plane.distance_to_point(far) <= -epsilon {
            return BoxSide::Back;
        }
        BoxSide::Both
    }

    pub fn corners(&self) -> [DVec3; 8] {
        let (mi, ma) = (self.min, self.max);
        [
            mi,
            DVec3::new(mi.x, mi.y, ma.z),
            DVec3::new(mi.x, ma.y, mi.z),
            DVec3::new(mi.x, ma.y, ma.z),
            DVec3::new(ma.x, mi.y, mi.z),
            DVec3::new(ma.x, mi.y, ma.z),
            DVec3::new(ma.x, ma.y, mi.z),
            ma,
        ]
    }

    /// Splits the box along `plane` and returns `[front, back]`.
    ///
    /// Each part is the box over the corners on its side, the corners within
    /// `thickness` of the plane and the points where the box edges cross the
    /// plane. A part with no corner strictly on its side is uninitialized.
    pub fn splits(&self, plane: &Plane, thickness: f64) -> [BoundingBox; 2] {
        #[cfg(feature = "hprof")]
        profile!("bounding_box_splits");
        let corners = self.corners();
        let mut side = [0i8; 8];
        let mut front = BoundingBox::new();
        let mut back = BoundingBox::new();
        let mut on = Vec::with_capacity(8 + EDGES.len());

        for (nr, corner) in corners.iter().enumerate() {
            let dist = plane.distance_to_point(*corner);
            if dist > thickness {
                front.expand_to_include_point(*corner);
                side[nr] = 1;
            } else if dist < -thickness {
                back.expand_to_include_point(*corner);
                side[nr] = -1;
            } else {
                on.push(*corner);
            }
        }

        for (v1, v2) in EDGES {
            if side[v1] != 0 && side[v1] == -side[v2] {
                on.push(plane.intersection(corners[v1], corners[v2]));
            }
        }

        if front.is_inited() {
            front.expand_to_include_points(&on);
        }
        if back.is_inited() {
            back.expand_to_include_points(&on);
        }
        [front, back]
    }
}
