// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Random primitive pairs with a known separation.
//!
//! Triangle pairs are built in a known configuration that uses the YZ plane
//! as separator, then moved by rigid transforms that do not change their
//! distance, and finally centred in a target cell.

use clash_geom::{Bounds, Line, Matrix, Triangle, Vector3};

use crate::random::{Range, RandomGenerator};

/// Two segments and their constructed distance.
#[derive(Debug, Copy, Clone)]
pub struct LinePair {
    /// First segment.
    pub a: Line,
    /// Second segment.
    pub b: Line,
    /// Distance the pair was built with.
    pub distance: f64,
}

/// Two triangles and their constructed distance.
#[derive(Debug, Copy, Clone)]
pub struct TrianglePair {
    /// First triangle.
    pub a: Triangle,
    /// Second triangle.
    pub b: Triangle,
    /// Distance the pair was built with.
    pub distance: f64,
}

/// Contact topology of a generated triangle pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Topology {
    /// Vertex to vertex.
    VertexVertex,
    /// Vertex to edge.
    VertexEdge,
    /// Edge to edge.
    EdgeEdge,
    /// Vertex to face.
    VertexFace,
    /// Edge through face; the distance is always zero.
    FaceEdge,
}

impl Topology {
    /// Every topology.
    pub const ALL: [Self; 5] = [
        Self::VertexVertex,
        Self::VertexEdge,
        Self::EdgeEdge,
        Self::VertexFace,
        Self::FaceEdge,
    ];
}

/// Generates primitive pairs with a distance drawn from `distance`.
#[derive(Debug, Clone)]
pub struct ClashGenerator {
    /// Sampler.
    pub random: RandomGenerator,
    /// Range of constructed distances.
    pub distance: Range,
    /// Size range of the first primitive.
    pub size1: Range,
    /// Size range of the second primitive.
    pub size2: Range,
    /// Round generated vertices to f32, as stored meshes are.
    pub downcast: bool,
}

fn downcast(v: Vector3) -> Vector3 {
    #[allow(clippy::cast_possible_truncation)]
    let f = v.to_array().map(|c| c as f32);
    Vector3::from_f32(f)
}

fn shifted(t: Triangle, n: usize) -> Triangle {
    (0..n).fold(t, |t, _| t.shifted())
}

impl ClashGenerator {
    /// Creates a generator with unit sizes and the given distance range.
    pub fn new(seed: u64, distance: Range) -> Self {
        Self {
            random: RandomGenerator::new(seed),
            distance,
            size1: (1.0, 1.0),
            size2: (1.0, 1.0),
            downcast: false,
        }
    }

    /// Sets the size ranges of both primitives.
    pub fn with_sizes(mut self, size1: Range, size2: Range) -> Self {
        self.size1 = size1;
        self.size2 = size2;
        self
    }

    /// Enables rounding of the output to f32.
    pub fn with_downcast(mut self, downcast: bool) -> Self {
        self.downcast = downcast;
        self
    }

    /// A tolerance proportional to the shortest edge of `triangles`.
    pub fn suggest_tolerance(triangles: &[Triangle]) -> f64 {
        triangles
            .iter()
            .flat_map(|t| t.edges())
            .map(|(p, q)| (q - p).norm())
            .fold(f64::MAX, f64::min)
            * 0.001
    }

    fn upper(range: Range) -> f64 {
        range.0.max(range.1)
    }

    fn lower(range: Range) -> f64 {
        range.0.min(range.1)
    }

    /// Two random segments `distance` apart, centred in `bounds`.
    ///
    /// Both segments are moved until they meet at a random interior point,
    /// then pushed apart along the common normal.
    pub fn lines(&mut self, bounds: &Bounds) -> LinePair {
        let h1 = Self::upper(self.size1) * 0.5;
        let h2 = Self::upper(self.size2) * 0.5;
        let ra = self.random.rigid_transform((0.0, 0.0));
        let rb = self.random.rigid_transform((0.0, 0.0));
        let a = Line::new(
            ra * self.random.vector((-h1, h1)),
            ra * self.random.vector((-h1, h1)),
        );
        let b = Line::new(
            rb * self.random.vector((-h2, h2)),
            rb * self.random.vector((-h2, h2)),
        );

        let p1 = a.at(self.random.scalar());
        let p2 = b.at(self.random.scalar());
        let half = (p2 - p1) * 0.5;
        let meet = p1 + half;
        let distance = self.random.number(self.distance);
        let normal = (a.end + half - meet).cross(&(b.end - half - meet)).normalize() * distance;

        let ta = half + normal * 0.5;
        let tb = -half - normal * 0.5;
        let a = Line::new(a.start + ta, a.end + ta);
        let b = Line::new(b.start + tb, b.end + tb);

        let centre = Bounds::from_points(&[a.start, a.end, b.start, b.end]).center();
        let offset = bounds.center() - centre;
        let mut a = Line::new(a.start + offset, a.end + offset);
        let mut b = Line::new(b.start + offset, b.end + offset);
        if self.downcast {
            a = Line::new(downcast(a.start), downcast(a.end));
            b = Line::new(downcast(b.start), downcast(b.end));
        }
        LinePair { a, b, distance }
    }

    /// A triangle pair of a random topology. When the distance range
    /// excludes zero, edge-through-face pairs are not generated.
    pub fn triangles(&mut self, bounds: &Bounds) -> TrianglePair {
        let n = if Self::lower(self.distance) > 0.0 { 4 } else { 5 };
        let topology = Topology::ALL[self.random.index(n)];
        self.triangles_of(topology, bounds)
    }

    /// A triangle pair of the given topology, centred in `bounds`.
    pub fn triangles_of(&mut self, topology: Topology, bounds: &Bounds) -> TrianglePair {
        let (a, b, distance) = match topology {
            Topology::VertexVertex => self.vertex_vertex(),
            Topology::VertexEdge => self.vertex_edge(),
            Topology::EdgeEdge => self.edge_edge(),
            Topology::VertexFace => self.vertex_face(),
            Topology::FaceEdge => self.face_edge(),
        };
        self.finish(a, b, distance, bounds)
    }

    fn finish(&mut self, a: Triangle, b: Triangle, distance: f64, bounds: &Bounds) -> TrianglePair {
        let m = self.random.rigid_transform(self.size2);
        let (a, b) = (a.transformed(&m), b.transformed(&m));
        let centre = Bounds::from_points(&[a.a(), a.b(), a.c(), b.a(), b.b(), b.c()]).center();
        let offset = Matrix::translation(bounds.center() - centre);
        let (mut a, mut b) = (a.transformed(&offset), b.transformed(&offset));
        if self.downcast {
            a = Triangle::from(a.vertices.map(downcast));
            b = Triangle::from(b.vertices.map(downcast));
        }
        TrianglePair { a, b, distance }
    }

    fn margin(&self, d: f64) -> f64 {
        d + d * Self::lower(self.size1).min(Self::lower(self.size2))
    }

    fn behind(&mut self, margin: f64) -> Vector3 {
        let s = Self::upper(self.size1);
        self.random.vector_in((-s, -margin), (-s, s), (-s, s))
    }

    fn ahead(&mut self, margin: f64) -> Vector3 {
        let s = Self::upper(self.size2);
        self.random
            .vector_in((margin, s - margin), (-s, s - margin), (-s, s - margin))
    }

    fn shift_randomly(&mut self, t: Triangle) -> Triangle {
        let n = self.random.index(3);
        shifted(t, n)
    }

    fn vertex_vertex(&mut self) -> (Triangle, Triangle, f64) {
        let d = self.random.number(self.distance);
        let margin = self.margin(d);
        let a = Triangle::new(Vector3::ZERO, self.behind(margin), self.behind(margin));
        let b = Triangle::new(Vector3::ZERO, self.ahead(margin), self.ahead(margin))
            .translated(Vector3::new(d, 0.0, 0.0));
        let a = self.shift_randomly(a);
        let b = self.shift_randomly(b);
        (a, b, d)
    }

    fn vertex_edge(&mut self) -> (Triangle, Triangle, f64) {
        let d = self.random.number(self.distance);
        let margin = self.margin(d);
        let s1 = Self::upper(self.size1);
        let dir = self.random.direction();
        let mut edge = Vector3::new(0.0, dir.y(), dir.z()).normalize();
        if edge == Vector3::ZERO {
            edge = Vector3::UNIT_Y;
        }
        let a = Triangle::new(
            edge * self.random.number((margin, s1)),
            edge * self.random.number((-margin, -s1)),
            self.behind(margin),
        );
        let b = Triangle::new(Vector3::ZERO, self.ahead(margin), self.ahead(margin));
        let a = self.shift_randomly(a);
        let b = self.shift_randomly(b).translated(Vector3::new(d, 0.0, 0.0));
        (a, b, d)
    }

    fn edge_edge(&mut self) -> (Triangle, Triangle, f64) {
        let d = self.random.number(self.distance);
        let margin = self.margin(d);
        let s1 = Self::upper(self.size1);
        let s2 = Self::upper(self.size2);
        let a = Triangle::new(
            Vector3::new(0.0, self.random.number((margin, s1)), 0.0),
            Vector3::new(0.0, self.random.number((-margin, -s1)), 0.0),
            self.behind(margin),
        );
        let b = Triangle::new(
            Vector3::new(0.0, self.random.number((margin, s2 - margin)), 0.0),
            Vector3::new(0.0, self.random.number((-margin, -s2 + margin)), 0.0),
            self.ahead(margin),
        );
        let spin = self.random.rotation(Vector3::UNIT_X, (0.01, core::f64::consts::PI - 0.01));
        let b = b.transformed(&spin).translated(Vector3::new(d, 0.0, 0.0));
        let b = self.shift_randomly(b);
        (a, b, d)
    }

    fn vertex_face(&mut self) -> (Triangle, Triangle, f64) {
        let d = self.random.number(self.distance);
        let s1 = Self::upper(self.size1);
        let a = Triangle::new(
            self.random.vector((-s1, s1)),
            self.random.vector((-s1, s1)),
            self.random.vector((-s1, s1)),
        );
        let w = self.random.barycentric();
        let n = a.normal();
        let p = a.a() * w.x() + a.b() * w.y() + a.c() * w.z() + n * d;
        let b = Triangle::new(p, p + self.tilted(n), p + self.tilted(n));
        let b = self.shift_randomly(b);
        (a, b, d)
    }

    fn face_edge(&mut self) -> (Triangle, Triangle, f64) {
        let s1 = Self::upper(self.size1);
        let s2 = Self::upper(self.size2);
        let a = Triangle::new(
            self.random.vector((-s1, s1)),
            self.random.vector((-s1, s1)),
            self.random.vector((-s1, s1)),
        );
        let w = self.random.barycentric();
        let p = a.a() * w.x() + a.b() * w.y() + a.c() * w.z();
        let edge = self.tilted(a.normal());
        let b = Triangle::new(
            p + edge * self.random.number((0.1, 1.0)),
            p - edge * self.random.number((0.1, 1.0)),
            self.random.vector((-s2, s2)),
        );
        let b = self.shift_randomly(b);
        (a, b, 0.0)
    }

    /// `n` tilted by less than a right angle, scaled by half a random size.
    fn tilted(&mut self, n: Vector3) -> Vector3 {
        let axis = self.random.direction();
        let r = self.random.rotation(axis, (0.0, 1.57));
        r.transform_direction(&n) * (0.5 * self.random.number(self.size2))
    }
}

/// Unique cells of a cubic grid, sampled at random so generated problems
/// never overlap.
#[derive(Debug, Clone)]
pub struct CellDistribution {
    random: RandomGenerator,
    cell_size: f64,
    cells_per_axis: usize,
    start: Vector3,
    used: std::collections::BTreeSet<usize>,
}

impl CellDistribution {
    /// Grid of `cell_size` cells spanning `[-space_size, space_size]` on
    /// each axis.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(seed: u64, cell_size: f64, space_size: f64) -> Self {
        let cells_per_axis = ((space_size / cell_size).floor() as usize).max(1) * 2;
        Self {
            random: RandomGenerator::new(seed),
            cell_size,
            cells_per_axis,
            start: Vector3::splat(-space_size),
            used: std::collections::BTreeSet::new(),
        }
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.cells_per_axis.pow(3)
    }

    /// Returns `true` if the grid has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bounds of cell `cell`.
    #[allow(clippy::cast_precision_loss)]
    pub fn bounds(&self, cell: usize) -> Bounds {
        let n = self.cells_per_axis;
        let (x, y, z) = (cell % n, (cell / n) % n, cell / (n * n));
        let lo = Vector3::new(x as f64, y as f64, z as f64) * self.cell_size + self.start;
        Bounds::new(lo, lo + Vector3::splat(self.cell_size))
    }

    /// A cell not returned before. Returns `None` once the grid is used up.
    pub fn sample(&mut self) -> Option<Bounds> {
        if self.used.len() >= self.len() {
            return None;
        }
        loop {
            let cell = self.random.index(self.len());
            if self.used.insert(cell) {
                return Some(self.bounds(cell));
            }
        }
    }
}
