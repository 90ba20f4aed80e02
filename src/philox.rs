// Copyright 2018-2023 Developers of the Rand project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The Philox pseudo-random functions.
//!
//! Philox mixes with double-width unsigned multiplications instead of
//! Threefry's add-rotate-xor rounds, which makes it the faster choice on
//! hardware with a cheap `N x N -> 2N` multiplier. The multipliers and the
//! Weyl key increments are fixed by the reference implementation; the key is
//! half the width of the counter.

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::word::Word;
use crate::Prf;

const MUL_2X32: u32 = 0xD256_D193;
const MUL_4X32: [u32; 2] = [0xD251_1F53, 0xCD9E_8D57];
const MUL_2X64: u64 = 0xD2B7_4407_B1CE_6E93;
const MUL_4X64: [u64; 2] = [0xD2E7_470E_E14C_6C93, 0xCA5A_8263_9512_1157];

/// Weyl sequence increments: the golden ratio and sqrt(3) - 1 fractions.
const WEYL_32: [u32; 2] = [0x9E37_79B9, 0xBB67_AE85];
const WEYL_64: [u64; 2] = [0x9E37_79B9_7F4A_7C15, 0xBB67_AE85_84CA_A73B];

fn philox2<W: Word>(key: &[W; 1], counter: [W; 2], rounds: usize, multiplier: W, weyl: W) -> [W; 2] {
    let mut k = key[0];
    let mut x = counter;
    for _ in 0..rounds {
        let (lo, hi) = x[0].widemul(multiplier);
        x = [hi ^ k ^ x[1], lo];
        k = k.wrapping_add(weyl);
    }
    x
}

fn philox4<W: Word>(
    key: &[W; 2],
    counter: [W; 4],
    rounds: usize,
    multipliers: [W; 2],
    weyl: [W; 2],
) -> [W; 4] {
    let mut k = *key;
    let mut x = counter;
    for _ in 0..rounds {
        let (lo0, hi0) = x[0].widemul(multipliers[0]);
        let (lo1, hi1) = x[2].widemul(multipliers[1]);
        x = [hi1 ^ x[1] ^ k[0], lo1, hi0 ^ x[3] ^ k[1], lo0];
        k[0] = k[0].wrapping_add(weyl[0]);
        k[1] = k[1].wrapping_add(weyl[1]);
    }
    x
}

macro_rules! philox_prf {
    ($name:ident, $word:ty, $lanes:expr, $key_lanes:expr, $seed_bytes:expr,
     $eval:ident, $multiplier:expr, $weyl:expr, $doc:expr) => {
        #[doc = $doc]
        ///
        /// The round count is a type parameter defaulting to the recommended
        /// 10 rounds.
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
        pub struct $name<const ROUNDS: usize = 10> {
            key: [$word; $key_lanes],
        }

        impl<const ROUNDS: usize> $name<ROUNDS> {
            /// Create the function from its key.
            pub fn new(key: [$word; $key_lanes]) -> Self {
                Self { key }
            }
        }

        impl<const ROUNDS: usize> Prf for $name<ROUNDS> {
            type Word = $word;
            type Domain = [$word; $lanes];
            type Range = [$word; $lanes];
            type Key = [$word; $key_lanes];
            type Seed = [u8; $seed_bytes];

            const ROUNDS: usize = ROUNDS;

            fn with_key(key: Self::Key) -> Self {
                Self { key }
            }

            fn key(&self) -> Self::Key {
                self.key
            }

            fn set_key(&mut self, key: Self::Key) {
                self.key = key;
            }

            #[inline]
            fn evaluate(&self, counter: Self::Domain) -> Self::Range {
                $eval(&self.key, counter, ROUNDS, $multiplier, $weyl)
            }
        }
    };
}

philox_prf!(
    Philox2x32,
    u32,
    2,
    1,
    4,
    philox2,
    MUL_2X32,
    WEYL_32[0],
    "Philox over two 32-bit lanes (philox2x32)."
);
philox_prf!(
    Philox4x32,
    u32,
    4,
    2,
    8,
    philox4,
    MUL_4X32,
    WEYL_32,
    "Philox over four 32-bit lanes (philox4x32)."
);
philox_prf!(
    Philox2x64,
    u64,
    2,
    1,
    8,
    philox2,
    MUL_2X64,
    WEYL_64[0],
    "Philox over two 64-bit lanes (philox2x64)."
);
philox_prf!(
    Philox4x64,
    u64,
    4,
    2,
    16,
    philox4,
    MUL_4X64,
    WEYL_64,
    "Philox over four 64-bit lanes (philox4x64)."
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_4x32() {
        // Zero-key, zero-counter vector from the Random123 distribution.
        let prf = Philox4x32::<10>::new([0, 0]);
        assert_eq!(
            prf.evaluate([0; 4]),
            [0x6627E8D5, 0xE169C58D, 0xBC57AC4C, 0x9B00DBD8]
        );
    }

    #[test]
    fn counter_words_all_matter() {
        let prf = Philox4x64::<10>::new([1, 2]);
        let base = prf.evaluate([0; 4]);
        for lane in 0..4 {
            let mut counter = [0u64; 4];
            counter[lane] = 1;
            assert_ne!(prf.evaluate(counter), base);
        }
    }

    #[test]
    fn extended_rounds_accepted() {
        let prf = Philox4x32::<16>::new([7, 11]);
        assert_eq!(prf.evaluate([1, 2, 3, 4]), prf.evaluate([1, 2, 3, 4]));
        assert_ne!(
            prf.evaluate([1, 2, 3, 4]),
            Philox4x32::<10>::new([7, 11]).evaluate([1, 2, 3, 4])
        );
    }
}
