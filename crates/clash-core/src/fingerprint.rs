// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stable clash fingerprints.
//!
//! A fingerprint identifies a clash across runs. It depends only on the
//! clash geometry, never on composite ids, set order or traversal order.

use clash_geom::{Line, Vector3};

const DOMAIN_CLEARANCE: &[u8] = b"clash:clearance:v1";
const DOMAIN_HARD: &[u8] = b"clash:hard:v1";

fn canonical(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x
    }
}

fn canonical_point(p: &Vector3) -> Vector3 {
    p.to_array().map(canonical).into()
}

fn hash_points(domain: &[u8], points: &[Vector3]) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain);
    for p in points {
        for c in p.to_array() {
            hasher.update(&c.to_le_bytes());
        }
    }
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Fingerprint of a clearance clash: the unordered pair of closest points.
pub fn clearance(line: &Line) -> u64 {
    let (start, end) = (canonical_point(&line.start), canonical_point(&line.end));
    let (lo, hi) = if start.total_cmp(&end).is_le() {
        (start, end)
    } else {
        (end, start)
    };
    hash_points(DOMAIN_CLEARANCE, &[lo, hi])
}

/// Fingerprint of a hard clash: the penetration vector and its anchor.
pub fn hard(penetration: &Vector3, anchor: &Vector3) -> u64 {
    hash_points(DOMAIN_HARD, &[canonical_point(penetration), canonical_point(anchor)])
}
