// Copyright 2018-2023 Developers of the Rand project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The Threefry pseudo-random functions.
//!
//! Threefry is the add-rotate-xor member of the Salmon et al. PRF family,
//! derived from the Threefish block cipher with the tweak removed. Each
//! variant mixes an `N`-word counter under an `N`-word key; the per-round
//! rotation constants and the subkey schedule are fixed by the reference
//! implementation, and the output is bit-exact with it.

#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::word::Word;
use crate::Prf;

/// Skein parity constant, 32-bit truncation.
const PARITY_32: u32 = 0x1BD1_1BDA;
/// Skein parity constant.
const PARITY_64: u64 = 0x1BD1_1BDA_A9FC_1A22;

/// Rotation schedule for two 32-bit lanes, cycled mod 8.
const ROTATION_2X32: [u32; 8] = [13, 15, 26, 6, 17, 29, 16, 24];
/// Rotation schedule for four 32-bit lanes, cycled mod 8.
const ROTATION_4X32: [[u32; 2]; 8] = [
    [10, 26],
    [11, 21],
    [13, 27],
    [23, 5],
    [6, 20],
    [17, 11],
    [25, 10],
    [18, 20],
];
/// Rotation schedule for two 64-bit lanes, cycled mod 8.
const ROTATION_2X64: [u32; 8] = [16, 42, 12, 31, 16, 32, 24, 21];
/// Rotation schedule for four 64-bit lanes, cycled mod 8.
const ROTATION_4X64: [[u32; 2]; 8] = [
    [14, 16],
    [52, 57],
    [23, 40],
    [5, 37],
    [25, 33],
    [46, 12],
    [58, 22],
    [32, 32],
];

/// Two-lane Threefry: the extended key is `[k0, k1, parity ^ k0 ^ k1]` and a
/// subkey is injected before round 0 and after every fourth round.
fn threefry2<W: Word>(
    key: &[W; 2],
    counter: [W; 2],
    rounds: usize,
    rotations: &[u32; 8],
    parity: W,
) -> [W; 2] {
    let ks = [key[0], key[1], parity ^ key[0] ^ key[1]];
    let mut x = [
        counter[0].wrapping_add(ks[0]),
        counter[1].wrapping_add(ks[1]),
    ];
    for round in 0..rounds {
        x[0] = x[0].wrapping_add(x[1]);
        x[1] = x[1].rotate_left(rotations[round % 8]) ^ x[0];
        if round % 4 == 3 {
            let s = round / 4 + 1;
            x[0] = x[0].wrapping_add(ks[s % 3]);
            x[1] = x[1].wrapping_add(ks[(s + 1) % 3]).wrapping_add(W::from_usize(s));
        }
    }
    x
}

/// Four-lane Threefry. Lanes are mixed pairwise and the odd lanes swapped
/// each round, which is equivalent to the reference pairing
/// `(0,1),(2,3) / (0,3),(2,1)` on alternating rounds.
fn threefry4<W: Word>(
    key: &[W; 4],
    counter: [W; 4],
    rounds: usize,
    rotations: &[[u32; 2]; 8],
    parity: W,
) -> [W; 4] {
    let ks = [
        key[0],
        key[1],
        key[2],
        key[3],
        parity ^ key[0] ^ key[1] ^ key[2] ^ key[3],
    ];
    let mut x = counter;
    for i in 0..4 {
        x[i] = x[i].wrapping_add(ks[i]);
    }
    for round in 0..rounds {
        let [r0, r1] = rotations[round % 8];
        x[0] = x[0].wrapping_add(x[1]);
        x[1] = x[1].rotate_left(r0) ^ x[0];
        x[2] = x[2].wrapping_add(x[3]);
        x[3] = x[3].rotate_left(r1) ^ x[2];
        x.swap(1, 3);
        if round % 4 == 3 {
            let s = round / 4 + 1;
            for i in 0..4 {
                x[i] = x[i].wrapping_add(ks[(s + i) % 5]);
            }
            x[3] = x[3].wrapping_add(W::from_usize(s));
        }
    }
    x
}

macro_rules! threefry_prf {
    ($name:ident, $word:ty, $lanes:expr, $seed_bytes:expr, $eval:ident,
     $rotations:expr, $parity:expr, $doc:expr) => {
        #[doc = $doc]
        ///
        /// The round count is a type parameter with the recommended default
        /// of 20; any count from 0 upwards is accepted, with 72 matching the
        /// full Threefish schedule.
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        #[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
        pub struct $name<const ROUNDS: usize = 20> {
            key: [$word; $lanes],
        }

        impl<const ROUNDS: usize> $name<ROUNDS> {
            /// Create the function from its key.
            pub fn new(key: [$word; $lanes]) -> Self {
                Self { key }
            }
        }

        impl<const ROUNDS: usize> Prf for $name<ROUNDS> {
            type Word = $word;
            type Domain = [$word; $lanes];
            type Range = [$word; $lanes];
            type Key = [$word; $lanes];
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
                $eval(&self.key, counter, ROUNDS, &$rotations, $parity)
            }
        }
    };
}

threefry_prf!(
    Threefry2x32,
    u32,
    2,
    8,
    threefry2,
    ROTATION_2X32,
    PARITY_32,
    "Threefry over two 32-bit lanes (threefry2x32)."
);
threefry_prf!(
    Threefry4x32,
    u32,
    4,
    16,
    threefry4,
    ROTATION_4X32,
    PARITY_32,
    "Threefry over four 32-bit lanes (threefry4x32)."
);
threefry_prf!(
    Threefry2x64,
    u64,
    2,
    16,
    threefry2,
    ROTATION_2X64,
    PARITY_64,
    "Threefry over two 64-bit lanes (threefry2x64)."
);
threefry_prf!(
    Threefry4x64,
    u64,
    4,
    32,
    threefry4,
    ROTATION_4X64,
    PARITY_64,
    "Threefry over four 64-bit lanes (threefry4x64)."
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_4x64() {
        // Zero-key, zero-counter vector from the Random123 distribution.
        let prf = Threefry4x64::<20>::new([0; 4]);
        assert_eq!(
            prf.evaluate([0; 4]),
            [
                0x09218EBDE6C85537,
                0x55941F5266D86105,
                0x4BD25E16282434DC,
                0xEE29EC846BD2E40B
            ]
        );
    }

    #[test]
    fn reference_2x64() {
        // Ten consecutive counters under a fixed key, checked against the
        // reference implementation.
        let expected: [u64; 20] = [
            0x3c956fe5e3e09745,
            0x911f953cce0c0674,
            0xbf307d9a09b8e517,
            0x21255fa6b494c50e,
            0x36767323a0f90211,
            0xb5912b450fc89b38,
            0x2d5703abf89c5424,
            0xa0c7471ae60d0622,
            0x24a9f70a44338b6d,
            0xd1396ce94674b224,
            0x0a30049ea40bfed1,
            0xec7400474a7fe8f0,
            0x37fa17b7c8b37514,
            0x07d38e5e4f0eb3a1,
            0x1e176ae521a2c8c6,
            0x88f7022bae92e50d,
            0x19ce7fbd095eb0f8,
            0x65eaf3fc558b735c,
            0xfad725f62c08e780,
            0x1e91764c67bc64e6,
        ];
        let prf = Threefry2x64::<20>::new([0xdeadbeef12345678, 0xdecafbadbeadfeed]);
        for i in 0..10 {
            let out = prf.evaluate([i as u64, 0]);
            assert_eq!(out[0], expected[2 * i]);
            assert_eq!(out[1], expected[2 * i + 1]);
        }
    }

    #[test]
    fn reference_2x32() {
        // Random123 vectors: zeros, ones, and the pi-digits pattern.
        let prf = Threefry2x32::<20>::new([0, 0]);
        assert_eq!(prf.evaluate([0, 0]), [0x6B200159, 0x99BA4EFE]);

        let prf = Threefry2x32::<20>::new([0xFFFFFFFF, 0xFFFFFFFF]);
        assert_eq!(prf.evaluate([0xFFFFFFFF, 0xFFFFFFFF]), [0x1CB996FC, 0xBB002BE7]);

        let prf = Threefry2x32::<20>::new([0x13198A2E, 0x03707344]);
        assert_eq!(prf.evaluate([0x243F6A88, 0x85A308D3]), [0xC4923A9C, 0x483DF7A0]);
    }

    #[test]
    fn zero_rounds_is_key_injection() {
        let prf = Threefry2x64::<0>::new([3, 5]);
        assert_eq!(prf.evaluate([10, 20]), [13, 25]);

        let prf = Threefry4x32::<0>::new([1, 2, 3, 4]);
        assert_eq!(prf.evaluate([10, 20, 30, 40]), [11, 22, 33, 44]);
    }
}
