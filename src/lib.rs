// Copyright 2018-2023 Developers of the Rand project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! This crate implements counter-based random number engines built on the
//! Threefry and Philox pseudo-random functions of Salmon, Moraes, Dror and
//! Shaw, ["Parallel Random Numbers: As Easy as 1, 2, 3"] (SC'11).
//!
//! Unlike a conventional generator, a counter-based engine carries no hidden
//! evolving state: the output at every position is a keyed block function of
//! an explicit counter. That makes streams trivially parallel. A caller
//! partitions the counter space by handing each task a distinct *base
//! counter* (a task id, a timestep, a grid coordinate); each task then owns
//! an independent, non-overlapping stream and may jump to any position in it
//! in constant time.
//!
//! The PRFs are statistically strong — both families pass BigCrush — but
//! not cryptographically secure, and none of the engines implement
//! `CryptoRng`.
//!
//! Eight engines are provided, one per PRF variant:
//!
//! - [`Threefry2x32Rng`], [`Threefry4x32Rng`], [`Threefry2x64Rng`],
//!   [`Threefry4x64Rng`]: add-rotate-xor mixing, 20 rounds. The conservative
//!   choice, and the faster family on hardware without a fast wide
//!   multiplier.
//! - [`Philox2x32Rng`], [`Philox4x32Rng`], [`Philox2x64Rng`],
//!   [`Philox4x64Rng`]: wide-multiply mixing, 10 rounds. Usually the fastest
//!   choice on 64-bit CPUs.
//!
//! All of them implement [`RngCore`] and [`SeedableRng`]; the underlying
//! [`CounterBasedEngine`] can also be instantiated directly to pick a
//! different round count or a different `COUNTER_BITS` split.
//!
//! ```
//! use rand_core::{RngCore, SeedableRng};
//! use rand_counter::Philox4x32Rng;
//!
//! let mut rng = Philox4x32Rng::seed_from_u64(1);
//! let x = rng.next_u32();
//! # let _ = x;
//! ```
//!
//! Output is reproducible and checked against the reference test vectors of
//! the Random123 distribution.
//!
//! ["Parallel Random Numbers: As Easy as 1, 2, 3"]:
//!     https://www.thesalmons.org/john/random123/papers/random123sc11.pdf
//! [`RngCore`]: rand_core::RngCore
//! [`SeedableRng`]: rand_core::SeedableRng

#![doc(
    html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128-blk.png",
    html_favicon_url = "https://www.rust-lang.org/favicon.ico",
    html_root_url = "https://rust-random.github.io/rand/"
)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![allow(clippy::unreadable_literal)]
#![no_std]

#[cfg(feature = "std")]
extern crate std;

mod engine;
mod error;
mod philox;
mod threefry;
mod word;

use core::fmt;

pub use rand_core;

pub use crate::engine::CounterBasedEngine;
pub use crate::error::{Error, ParseEngineError};
pub use crate::philox::{Philox2x32, Philox2x64, Philox4x32, Philox4x64};
pub use crate::threefry::{Threefry2x32, Threefry2x64, Threefry4x32, Threefry4x64};
pub use crate::word::{Word, WordBlock};

/// A keyed pseudo-random function on fixed-width word tuples.
///
/// A `Prf` maps an `N`-word counter (the domain) to an `N`-word block (the
/// range) under a key, deterministically. It is a plain value: cheap to
/// copy, compared by key, with no state beyond the key itself. The
/// [`CounterBasedEngine`] turns any `Prf` into a stream generator.
pub trait Prf: Clone + PartialEq + Eq + fmt::Debug {
    /// The word type of all tuples: `u32` or `u64`.
    type Word: Word;
    /// The input block, an `N`-word tuple.
    type Domain: WordBlock<Self::Word>;
    /// The output block, an `N`-word tuple.
    type Range: WordBlock<Self::Word>;
    /// The key tuple. `N` words for Threefry, `N/2` for Philox.
    type Key: WordBlock<Self::Word>;
    /// The key as a byte array, for [`rand_core::SeedableRng`] seeding.
    type Seed: Sized + Default + AsMut<[u8]>;

    /// The number of mixing rounds applied per evaluation.
    const ROUNDS: usize;

    /// Create the function from its key.
    fn with_key(key: Self::Key) -> Self;

    /// The key.
    fn key(&self) -> Self::Key;

    /// Replace the key.
    fn set_key(&mut self, key: Self::Key);

    /// Apply the function to one counter block.
    fn evaluate(&self, counter: Self::Domain) -> Self::Range;
}

/// Threefry-2x32 engine with a 32-bit sequence counter.
pub type Threefry2x32Rng = CounterBasedEngine<Threefry2x32, 32>;
/// Threefry-4x32 engine with a 32-bit sequence counter.
pub type Threefry4x32Rng = CounterBasedEngine<Threefry4x32, 32>;
/// Threefry-2x64 engine with a 64-bit sequence counter.
pub type Threefry2x64Rng = CounterBasedEngine<Threefry2x64, 64>;
/// Threefry-4x64 engine with a 64-bit sequence counter.
pub type Threefry4x64Rng = CounterBasedEngine<Threefry4x64, 64>;
/// Philox-2x32 engine with a 32-bit sequence counter.
pub type Philox2x32Rng = CounterBasedEngine<Philox2x32, 32>;
/// Philox-4x32 engine with a 32-bit sequence counter.
pub type Philox4x32Rng = CounterBasedEngine<Philox4x32, 32>;
/// Philox-2x64 engine with a 64-bit sequence counter.
pub type Philox2x64Rng = CounterBasedEngine<Philox2x64, 64>;
/// Philox-4x64 engine with a 64-bit sequence counter.
pub type Philox4x64Rng = CounterBasedEngine<Philox4x64, 64>;
