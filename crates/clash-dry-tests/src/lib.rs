// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared generators, fixtures and test doubles for the clash crates.
#![forbid(unsafe_code)]
//!
//! Everything here is deterministic: generators and scenes are seeded, so a
//! failing trial can be replayed from its seed.
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`fixtures`] - Unit cube, cones and the [`Mesh`] container
//! - [`generator`] - Primitive pairs with a known separation, and unique cells
//! - [`prng`] - xoroshiro128+ generator
//! - [`random`] - Numbers, vectors, rotations and ids on top of [`Prng`]
//! - [`scene`] - Mock scene builder over the in-memory database

pub mod config;
pub mod fixtures;
pub mod generator;
pub mod prng;
pub mod random;
pub mod scene;

pub use config::InMemoryConfigStore;
pub use fixtures::{cone, unit_cube, Mesh};
pub use generator::{CellDistribution, ClashGenerator, LinePair, Topology, TrianglePair};
pub use prng::Prng;
pub use random::{Range, RandomGenerator};
pub use scene::MockScene;
