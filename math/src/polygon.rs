#[cfg(feature = "hprof")]
use coarse_prof::profile;
use glam::DVec3;

use crate::Plane;

const FLAG_ON: u8 = 1;
const FLAG_FRONT: u8 = 2;
const FLAG_BACK: u8 = 4;

/// Where a polygon lies relative to a plane.
///
/// The `...AndOn` variants report that some vertices are within the plane
/// thickness as well. A polygon entirely within the thickness is reported as
/// `InIdentical` or `InMirrored`, depending on whether its own normal agrees
/// with the plane normal, never as `On`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Empty,
    On,
    Front,
    FrontAndOn,
    Back,
    BackAndOn,
    Both,
    BothAndOn,
    InIdentical,
    InMirrored,
}

impl Side {
    const fn from_flags(flags: u8) -> Self {
        match flags {
            0 => Side::Empty,
            FLAG_ON => Side::On,
            FLAG_FRONT => Side::Front,
            3 => Side::FrontAndOn,
            FLAG_BACK => Side::Back,
            5 => Side::BackAndOn,
            6 => Side::Both,
            _ => Side::BothAndOn,
        }
    }

    /// True for both in-plane variants
    #[inline]
    pub const fn is_coplanar(self) -> bool {
        matches!(self, Side::InIdentical | Side::InMirrored)
    }
}

/// Convex planar polygon. The vertices run clockwise seen from the front of
/// `plane`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<DVec3>,
    pub plane: Plane,
}

impl Polygon {
    #[inline]
    pub const fn new(vertices: Vec<DVec3>, plane: Plane) -> Self {
        Self { vertices, plane }
    }

    /// Builds the polygon and derives its plane from the vertex winding.
    ///
    /// Vertices that enclose (next to) no area give a plane with a zero
    /// normal, which `Plane::is_valid` rejects.
    pub fn from_vertices(vertices: Vec<DVec3>) -> Self {
        let area = Self::area_vector(&vertices);
        let length = area.length();
        let plane = if length > 1e-9 && !vertices.is_empty() {
            let normal = -area / length;
            let center = vertices.iter().copied().sum::<DVec3>() / vertices.len() as f64;
            Plane::new(normal, normal.dot(center))
        } else {
            Plane::new(DVec3::ZERO, 0.0)
        };
        Self { vertices, plane }
    }

    /// Twice the area, pointing against the front of the polygon
    fn area_vector(vertices: &[DVec3]) -> DVec3 {
        if vertices.len() < 3 {
            return DVec3::ZERO;
        }
        let mut area = DVec3::ZERO;
        for (nr, vertex) in vertices.iter().enumerate() {
            let next = vertices[(nr + 1) % vertices.len()];
            area += vertex.cross(next);
        }
        area
    }

    /// The plane through edge `nr` (from vertex `nr` to its successor) that is
    /// perpendicular to the polygon and faces its interior.
    ///
    /// `None` if the edge is not longer than `epsilon`.
    #[inline]
    pub fn edge_plane(&self, nr: usize, epsilon: f64) -> Option<Plane> {
        let from = self.vertices[nr];
        let to = self.vertices[(nr + 1) % self.vertices.len()];
        Plane::from_points(from, to, from - self.plane.normal, epsilon)
    }

    /// Same polygon seen from the other side
    pub fn mirror(&self) -> Self {
        Self {
            vertices: self.vertices.iter().rev().copied().collect(),
            plane: self.plane.mirror(),
        }
    }

    pub fn area(&self) -> f64 {
        (self.plane.normal.dot(Self::area_vector(&self.vertices)) / 2.0).abs()
    }

    /// Average of the vertices. For the convex polygons used here this is
    /// always an interior point.
    pub fn centroid(&self) -> DVec3 {
        if self.vertices.is_empty() {
            return DVec3::ZERO;
        }
        self.vertices.iter().copied().sum::<DVec3>() / self.vertices.len() as f64
    }

    pub fn what_side(&self, plane: &Plane, half_thickness: f64) -> Side {
        let mut flags = 0u8;

        for vertex in &self.vertices {
            let dist = plane.distance_to_point(*vertex);
            if dist > half_thickness {
                flags |= FLAG_FRONT;
            } else if dist < -half_thickness {
                flags |= FLAG_BACK;
            } else {
                flags |= FLAG_ON;
            }
        }

        if flags == FLAG_ON {
            return if self.plane.normal.dot(plane.normal) > 0.0 {
                Side::InIdentical
            } else {
                Side::InMirrored
            };
        }
        Side::from_flags(flags)
    }

    /// Like `what_side`, with the `...AndOn` answers folded into their plain
    /// counterparts
    pub fn what_side_simple(&self, plane: &Plane, half_thickness: f64) -> Side {
        match self.what_side(plane, half_thickness) {
            Side::FrontAndOn => Side::Front,
            Side::BackAndOn => Side::Back,
            Side::BothAndOn => Side::Both,
            side => side,
        }
    }

    /// Splits the polygon along `split_plane` and returns `[front, back]`.
    ///
    /// Both parts keep the plane of `self`. Vertices within the plane
    /// thickness are attributed to the side the walk came from, so a part may
    /// come back with fewer than three vertices.
    pub fn splits(&self, split_plane: &Plane, half_thickness: f64) -> [Polygon; 2] {
        #[cfg(feature = "hprof")]
        profile!("polygon_splits");
        let mut front = Vec::with_capacity(self.vertices.len() + 1);
        let mut back = Vec::with_capacity(self.vertices.len() + 1);

        if let Some(&last) = self.vertices.last() {
            let mut last_vertex = last;
            let mut last_dist = split_plane.distance_to_point(last_vertex);

            for &this_vertex in &self.vertices {
                let this_dist = split_plane.distance_to_point(this_vertex);

                if this_dist > half_thickness {
                    if last_dist < -half_thickness {
                        let hit = split_plane.intersection(last_vertex, this_vertex);
                        back.push(hit);
                        front.push(hit);
                    } else if last_dist <= half_thickness {
                        front.push(last_vertex);
                    }
                    front.push(this_vertex);
                } else if this_dist < -half_thickness {
                    if last_dist > half_thickness {
                        let hit = split_plane.intersection(last_vertex, this_vertex);
                        front.push(hit);
                        back.push(hit);
                    } else if last_dist >= -half_thickness {
                        back.push(last_vertex);
                    }
                    back.push(this_vertex);
                } else if last_dist > half_thickness {
                    front.push(this_vertex);
                } else if last_dist < -half_thickness {
                    back.push(this_vertex);
                }

                last_vertex = this_vertex;
                last_dist = this_dist;
            }
        }

        [
            Polygon::new(front, self.plane),
            Polygon::new(back, self.plane),
        ]
    }

    /// True if `self` and `other` lie in the same (or mirrored) plane and
    /// share some area. With `report_touches` polygons that only touch within
    /// the edge thickness count as overlapping too.
    ///
    /// Edges too short to define an edge plane do not restrict the overlap.
    pub fn overlaps(&self, other: &Polygon, report_touches: bool, edge_thickness: f64) -> bool {
        if !other.what_side(&self.plane, edge_thickness).is_coplanar() {
            return false;
        }
        Self::inside_edges(self, other, report_touches, edge_thickness)
            && Self::inside_edges(other, self, report_touches, edge_thickness)
    }

    fn inside_edges(
        outline: &Polygon,
        test: &Polygon,
        report_touches: bool,
        edge_thickness: f64,
    ) -> bool {
        for nr in 0..outline.vertices.len() {
            let Some(edge) = outline.edge_plane(nr, edge_thickness) else {
                continue;
            };
            match test.what_side(&edge, edge_thickness) {
                Side::Back => return false,
                Side::BackAndOn if !report_touches => return false,
                _ => {}
            }
        }
        true
    }

    /// Cuts `self` along the edge planes of `splitter`.
    ///
    /// All pieces outside of `splitter` come first, the last piece is the
    /// part of `self` that overlaps `splitter`.
    pub fn chopped_up_along(&self, splitter: &Polygon, edge_thickness: f64) -> Vec<Polygon> {
        let mut fragment = self.clone();
        let mut pieces = Vec::new();

        for nr in 0..splitter.vertices.len() {
            let Some(edge) = splitter.edge_plane(nr, edge_thickness) else {
                continue;
            };
            if fragment.what_side_simple(&edge, edge_thickness) != Side::Both {
                continue;
            }
            let [inside, outside] = fragment.splits(&edge, edge_thickness);
            fragment = inside;
            pieces.push(outside);
        }

        pieces.push(fragment);
        pieces
    }

    /// Full structural check: at least three vertices, a unit normal, all
    /// vertices in the plane, no two vertices closer than `min_vertex_dist`,
    /// strictly convex and wound clockwise seen from the front.
    pub fn is_valid(&self, round_epsilon: f64, min_vertex_dist: f64) -> bool {
        let count = self.vertices.len();
        if count < 3 || !self.plane.is_valid() {
            return false;
        }

        if self
            .vertices
            .iter()
            .any(|v| self.plane.distance_to_point(*v).abs() > round_epsilon)
        {
            return false;
        }

        for (nr, a) in self.vertices.iter().enumerate() {
            if self.vertices[nr + 1..]
                .iter()
                .any(|b| (*a - *b).length() < min_vertex_dist)
            {
                return false;
            }
        }

        for nr in 0..count {
            let next = (nr + 1) % count;
            let Some(edge) = self.edge_plane(nr, 0.00001) else {
                return false;
            };
            for (other, vertex) in self.vertices.iter().enumerate() {
                if other != nr && other != next && edge.distance_to_point(*vertex) < round_epsilon {
                    return false;
                }
            }
        }

        let turn = (self.vertices[1] - self.vertices[0]).cross(self.vertices[2] - self.vertices[1]);
        let length = turn.length();
        if length == 0.0 {
            return false;
        }
        let projection = -(turn / length).dot(self.plane.normal);
        projection <= 1.0 + round_epsilon && projection >= 1.0 - round_epsilon
    }
}
