// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Core geometry types used by the kernel (bounds, triangle, line).
//!
//! Overlap semantics are inclusive on faces so that touching geometry is
//! never culled before the narrowphase sees it.

#[doc = "Axis-aligned bounds (project space)."]
pub mod bounds;
#[doc = "Line segments."]
pub mod line;
#[doc = "Triangles."]
pub mod triangle;
