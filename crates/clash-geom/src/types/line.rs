// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::math::Vector3;

/// A segment between two points, typically a closest-point result.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Line {
    /// First endpoint.
    pub start: Vector3,
    /// Second endpoint.
    pub end: Vector3,
}

impl Line {
    /// Creates a segment from two endpoints.
    pub const fn new(start: Vector3, end: Vector3) -> Self {
        Self { start, end }
    }

    /// Zero-length segment at `p`.
    pub const fn point(p: Vector3) -> Self {
        Self { start: p, end: p }
    }

    /// Segment length.
    pub fn magnitude(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Squared segment length.
    pub fn magnitude_squared(&self) -> f64 {
        (self.end - self.start).norm_squared()
    }

    /// Direction vector `end - start`.
    pub fn direction(&self) -> Vector3 {
        self.end - self.start
    }

    /// Returns the segment with its endpoints swapped.
    pub fn reversed(&self) -> Self {
        Self::new(self.end, self.start)
    }

    /// Point at parameter `t` along the segment.
    pub fn at(&self, t: f64) -> Vector3 {
        self.start + self.direction() * t
    }
}
