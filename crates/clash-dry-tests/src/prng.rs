// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Seeded `xoroshiro128+` generator behind the test samplers.
/// Stateful `xoroshiro128+` pseudo-random number generator for reproducible
/// test scenes.
///
/// * Not cryptographically secure.
/// * Matching seeds yield identical sequences across supported platforms, so
///   a failing trial can be replayed from its seed.
#[derive(Debug, Clone, Copy)]
pub struct Prng {
    state: [u64; 2],
}

impl Prng {
    /// Constructs a PRNG from two 64-bit seeds.
    pub fn from_seed(seed0: u64, seed1: u64) -> Self {
        let mut state = [seed0, seed1];
        if state[0] == 0 && state[1] == 0 {
            state[0] = 0x9e37_79b9_7f4a_7c15;
        }
        Self { state }
    }

    /// Constructs a PRNG from a single 64-bit seed via SplitMix64 expansion.
    pub fn from_seed_u64(seed: u64) -> Self {
        fn splitmix64(state: &mut u64) -> u64 {
            *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
            let mut z = *state;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            z ^ (z >> 31)
        }

        let mut sm_state = seed;
        Self::from_seed(splitmix64(&mut sm_state), splitmix64(&mut sm_state))
    }

    /// Returns the next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(55) ^ s1 ^ (s1 << 14);
        self.state[1] = s1.rotate_left(36);

        result
    }

    /// Returns the next double in `[0, 1)`.
    ///
    /// Uses the high 52 bits of the output to fill the mantissa.
    pub fn next_f64(&mut self) -> f64 {
        let bits = (self.next_u64() >> 12) | 0x3ff0_0000_0000_0000;
        f64::from_bits(bits) - 1.0
    }

    /// Returns the next index in `[0, n)`; `n` must be non-zero.
    ///
    /// Uses rejection sampling to avoid modulo bias.
    pub fn next_index(&mut self, n: usize) -> usize {
        let span = n.max(1) as u64;
        let bound = u64::MAX - u64::MAX % span;
        loop {
            let candidate = self.next_u64();
            if candidate < bound {
                #[allow(clippy::cast_possible_truncation)]
                return (candidate % span) as usize;
            }
        }
    }
}
