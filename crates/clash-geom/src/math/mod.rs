// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Double precision linear algebra for project-space geometry.
//!
//! Source vertices arrive as `f32` and transforms as `f64`; everything is
//! promoted to `f64` here before any predicate sees it.

mod matrix;
mod vector;

pub use matrix::Matrix;
pub use vector::Vector3;
