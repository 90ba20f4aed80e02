// Copyright 2018-2023 Developers of the Rand project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The counter-based engine.
//!
//! [`CounterBasedEngine`] adapts a keyed [`Prf`] into a conventional stream
//! generator. The PRF's input space is split in two: the caller owns the
//! *base counter* (the low bits, used to label independent streams) and the
//! engine owns the *sequence counter* (the top `COUNTER_BITS`, incremented
//! once per generated block). Each block of `N` output words is buffered and
//! handed out one word at a time.
//!
//! Because the whole state is a handful of words, engines are cheap enough
//! to construct (or [`restart`]) inside an inner loop, one per work item.
//! Two engines sharing a key but given distinct base counters produce
//! non-overlapping streams, which is the intended parallel idiom: encode the
//! task identity in the base counter and let every task draw independently.
//!
//! [`restart`]: CounterBasedEngine::restart

use core::fmt;
use core::str::FromStr;

use rand_core::{impls, RngCore, SeedableRng};
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, ParseEngineError};
use crate::word::{Word, WordBlock};
use crate::Prf;

/// A uniform random number engine over a pseudo-random function `P`.
///
/// `COUNTER_BITS` selects how many of the domain's most significant bits
/// belong to the engine-managed sequence counter; the stream is exhausted
/// after `N * 2^COUNTER_BITS` words. The remaining low bits form the base
/// counter supplied at construction or [`restart`]. `COUNTER_BITS` must lie
/// in `1 ..= min(N * bits(W), 125)`; this is checked at compile time.
///
/// The engine reserves the top `ceil(log2(N * bits(W)))` bits of the key's
/// highest word; keys with any of those bits set are rejected with
/// [`Error::OutOfRange`].
///
/// # Example
///
/// ```
/// use rand_counter::{CounterBasedEngine, Threefry4x32};
///
/// // One stream per work item, all derived from the same key.
/// let prf = Threefry4x32::<20>::new([7, 0, 0, 0]);
/// let mut rng = CounterBasedEngine::<_, 32>::with_counter(prf, [42, 0, 0, 0]).unwrap();
/// let first = rng.try_next().unwrap();
///
/// // Restarting with the same base counter replays the stream.
/// rng.restart([42, 0, 0, 0]).unwrap();
/// assert_eq!(rng.try_next().unwrap(), first);
/// ```
///
/// [`restart`]: CounterBasedEngine::restart
#[derive(Clone)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde1",
    serde(bound(
        serialize = "P: Serialize, P::Domain: Serialize, P::Range: Serialize",
        deserialize = "P: serde::de::DeserializeOwned, \
                       P::Domain: serde::de::DeserializeOwned, \
                       P::Range: serde::de::DeserializeOwned"
    ))
)]
pub struct CounterBasedEngine<P: Prf, const COUNTER_BITS: u32> {
    prf: P,
    base: P::Domain,
    /// Blocks generated so far; `2^COUNTER_BITS` marks exhaustion.
    sequence: u128,
    buffer: P::Range,
    /// Next unread buffer word; `N` forces regeneration.
    index: usize,
}

impl<P: Prf, const COUNTER_BITS: u32> CounterBasedEngine<P, COUNTER_BITS> {
    const WORD_BITS: u32 = <P::Word as Word>::BITS;
    const DOMAIN_WORDS: usize = <P::Domain as WordBlock<P::Word>>::LEN;
    const DOMAIN_BITS: u32 = Self::DOMAIN_WORDS as u32 * Self::WORD_BITS;
    /// Bit position of the sequence counter within the domain.
    const SHIFT: u32 = Self::DOMAIN_BITS - COUNTER_BITS;
    const SEQ_LIMIT: u128 = 1u128 << COUNTER_BITS;
    /// Key bits reserved by the engine: `ceil(log2(DOMAIN_BITS))`.
    const RESERVED_KEY_BITS: u32 = u32::BITS - (Self::DOMAIN_BITS - 1).leading_zeros();

    const VALID: () = {
        assert!(COUNTER_BITS >= 1, "COUNTER_BITS must be at least 1");
        assert!(
            COUNTER_BITS <= Self::DOMAIN_BITS,
            "COUNTER_BITS cannot exceed the domain width"
        );
        assert!(
            COUNTER_BITS <= 125,
            "COUNTER_BITS above 125 would overflow u128 position arithmetic"
        );
        assert!(
            <P::Domain as WordBlock<P::Word>>::LEN == <P::Range as WordBlock<P::Word>>::LEN,
            "PRF domain and range must have the same width"
        );
    };

    /// The smallest value a draw can return.
    pub const MIN: P::Word = <P::Word as Word>::ZERO;
    /// The largest value a draw can return.
    pub const MAX: P::Word = <P::Word as Word>::MAX;

    /// Create an engine from a keyed PRF, with an all-zero base counter.
    pub fn new(prf: P) -> Result<Self, Error> {
        let () = Self::VALID;
        Self::check_key(&prf.key())?;
        Ok(CounterBasedEngine {
            prf,
            base: P::Domain::default(),
            sequence: 0,
            buffer: P::Range::default(),
            index: Self::DOMAIN_WORDS,
        })
    }

    /// Create an engine from a keyed PRF and a base counter.
    ///
    /// The top `COUNTER_BITS` of the counter must be zero.
    pub fn with_counter(prf: P, counter: P::Domain) -> Result<Self, Error> {
        Self::check_counter(&counter)?;
        let mut engine = Self::new(prf)?;
        engine.base = counter;
        Ok(engine)
    }

    /// Create an engine from a PRF key.
    pub fn from_key(key: P::Key) -> Result<Self, Error> {
        Self::new(P::with_key(key))
    }

    /// Create an engine from a PRF key and a base counter.
    pub fn from_key_and_counter(key: P::Key, counter: P::Domain) -> Result<Self, Error> {
        Self::with_counter(P::with_key(key), counter)
    }

    /// Create an engine from a single word.
    ///
    /// The word becomes the least significant key word; all other key words
    /// and the base counter are zero.
    pub fn from_seed_word(seed: P::Word) -> Result<Self, Error> {
        let mut key = P::Key::default();
        key.as_mut()[0] = seed;
        Self::from_key(key)
    }

    /// Replace the PRF and reset all state, as if newly constructed.
    ///
    /// On error the engine is unchanged.
    pub fn reseed(&mut self, prf: P) -> Result<(), Error> {
        Self::check_key(&prf.key())?;
        *self = Self::new(prf)?;
        Ok(())
    }

    /// Replace the PRF and base counter and reset all other state.
    ///
    /// On error the engine is unchanged.
    pub fn reseed_with_counter(&mut self, prf: P, counter: P::Domain) -> Result<(), Error> {
        Self::check_key(&prf.key())?;
        Self::check_counter(&counter)?;
        *self = Self::with_counter(prf, counter)?;
        Ok(())
    }

    /// Replace the key and reset all state.
    pub fn reseed_key(&mut self, key: P::Key) -> Result<(), Error> {
        self.reseed(P::with_key(key))
    }

    /// Reset all state from a single seed word, as [`from_seed_word`] does.
    ///
    /// [`from_seed_word`]: CounterBasedEngine::from_seed_word
    pub fn reseed_word(&mut self, seed: P::Word) -> Result<(), Error> {
        let mut key = P::Key::default();
        key.as_mut()[0] = seed;
        self.reseed_key(key)
    }

    /// Replace the base counter, rewinding the stream to its start.
    ///
    /// The key is kept. On error the engine is unchanged.
    pub fn restart(&mut self, counter: P::Domain) -> Result<(), Error> {
        Self::check_counter(&counter)?;
        self.base = counter;
        self.sequence = 0;
        self.index = Self::DOMAIN_WORDS;
        Ok(())
    }

    /// Draw the next word of the stream.
    ///
    /// Fails with [`Error::Exhausted`] once all `N * 2^COUNTER_BITS` words
    /// have been produced.
    #[inline]
    pub fn try_next(&mut self) -> Result<P::Word, Error> {
        if self.index == Self::DOMAIN_WORDS {
            if self.sequence == Self::SEQ_LIMIT {
                return Err(Error::Exhausted);
            }
            self.buffer = self.prf.evaluate(self.input_for(self.sequence));
            self.sequence += 1;
            self.index = 0;
        }
        let word = self.buffer.as_ref()[self.index];
        self.index += 1;
        Ok(word)
    }

    /// Advance the stream position by `delta` draws in constant time.
    ///
    /// Equivalent to `delta` calls of [`try_next`] as far as subsequent
    /// output is concerned, without evaluating the PRF along the way.
    /// Advancing to or past the end of the stream succeeds and leaves the
    /// engine exhausted; the failure surfaces on the next draw.
    ///
    /// [`try_next`]: CounterBasedEngine::try_next
    pub fn advance(&mut self, delta: u128) {
        let lanes = Self::DOMAIN_WORDS as u128;
        let total = Self::SEQ_LIMIT * lanes;
        let consumed = self.sequence * lanes - (lanes - self.index as u128);
        let target = match consumed.checked_add(delta) {
            Some(position) if position < total => position,
            _ => total,
        };
        let blocks = target / lanes;
        let offset = (target % lanes) as usize;
        if offset == 0 {
            self.sequence = blocks;
            self.index = Self::DOMAIN_WORDS;
        } else {
            self.buffer = self.prf.evaluate(self.input_for(blocks));
            self.sequence = blocks + 1;
            self.index = offset;
        }
    }

    /// Whether every word of the stream has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.sequence == Self::SEQ_LIMIT && self.index == Self::DOMAIN_WORDS
    }

    /// The PRF key.
    pub fn key(&self) -> P::Key {
        self.prf.key()
    }

    /// The base counter.
    pub fn counter(&self) -> P::Domain {
        self.base
    }

    /// The base counter with `block` packed into the top `COUNTER_BITS`.
    ///
    /// The domain is treated as a little-endian multi-word integer; the
    /// packing is explicit mask-and-shift and independent of host
    /// endianness.
    fn input_for(&self, block: u128) -> P::Domain {
        let mut combined = self.base;
        for (position, word) in combined.as_mut().iter_mut().enumerate() {
            let bit = position as u32 * Self::WORD_BITS;
            if bit + Self::WORD_BITS <= Self::SHIFT {
                continue;
            }
            let piece = if bit >= Self::SHIFT {
                block >> (bit - Self::SHIFT)
            } else {
                block << (Self::SHIFT - bit)
            };
            *word = *word | P::Word::from_u128(piece);
        }
        combined
    }

    /// Mask of the key bits the engine reserves.
    fn reserved_key_mask() -> P::Word {
        P::Word::MAX << (Self::WORD_BITS - Self::RESERVED_KEY_BITS)
    }

    fn check_key(key: &P::Key) -> Result<(), Error> {
        let words = key.as_ref();
        if words[words.len() - 1] & Self::reserved_key_mask() != P::Word::ZERO {
            return Err(Error::OutOfRange);
        }
        Ok(())
    }

    fn check_counter(counter: &P::Domain) -> Result<(), Error> {
        for (position, &word) in counter.as_ref().iter().enumerate() {
            let bit = position as u32 * Self::WORD_BITS;
            if bit + Self::WORD_BITS <= Self::SHIFT {
                continue;
            }
            let mask = if bit >= Self::SHIFT {
                P::Word::MAX
            } else {
                P::Word::MAX << (Self::SHIFT - bit)
            };
            if word & mask != P::Word::ZERO {
                return Err(Error::OutOfRange);
            }
        }
        Ok(())
    }

    #[inline]
    fn draw(&mut self) -> P::Word {
        match self.try_next() {
            Ok(word) => word,
            Err(_) => panic!("counter-based engine exhausted; restart or reseed it"),
        }
    }
}

/// Engines compare equal iff key, base counter, sequence counter and buffer
/// index agree; the buffer itself is a function of those fields.
impl<P: Prf, const COUNTER_BITS: u32> PartialEq for CounterBasedEngine<P, COUNTER_BITS> {
    fn eq(&self, other: &Self) -> bool {
        self.prf == other.prf
            && self.base == other.base
            && self.sequence == other.sequence
            && self.index == other.index
    }
}

impl<P: Prf, const COUNTER_BITS: u32> Eq for CounterBasedEngine<P, COUNTER_BITS> {}

// Custom Debug implementation that does not expose the key or the buffered
// output.
impl<P: Prf, const COUNTER_BITS: u32> fmt::Debug for CounterBasedEngine<P, COUNTER_BITS> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "CounterBasedEngine {{}}")
    }
}

/// The textual form: key words, base-counter words, sequence counter and
/// buffer index as space-separated unsigned decimals.
impl<P: Prf, const COUNTER_BITS: u32> fmt::Display for CounterBasedEngine<P, COUNTER_BITS> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let key = self.prf.key();
        for &word in key.as_ref().iter().chain(self.base.as_ref().iter()) {
            write!(f, "{} ", word)?;
        }
        write!(f, "{} {}", self.sequence, self.index)
    }
}

/// Parse the textual form produced by `Display`.
///
/// Reading skips whitespace between fields and validates every field,
/// including the reserved key and counter bits. A mid-block buffer is
/// reconstructed by re-evaluating the PRF.
impl<P: Prf, const COUNTER_BITS: u32> FromStr for CounterBasedEngine<P, COUNTER_BITS> {
    type Err = ParseEngineError;

    fn from_str(s: &str) -> Result<Self, ParseEngineError> {
        let mut tokens = s.split_whitespace();
        let mut word = |what| {
            tokens
                .next()
                .ok_or(ParseEngineError::new(what))
                .and_then(|token| {
                    token.parse().map_err(|_| ParseEngineError::new(what))
                })
        };

        let mut key = P::Key::default();
        for slot in key.as_mut() {
            *slot = word("key word")?;
        }
        let mut counter = P::Domain::default();
        for slot in counter.as_mut() {
            *slot = word("base counter word")?;
        }

        let sequence: u128 = tokens
            .next()
            .ok_or(ParseEngineError::new("sequence counter"))
            .and_then(|token| {
                token
                    .parse()
                    .map_err(|_| ParseEngineError::new("sequence counter"))
            })?;
        let index: usize = tokens
            .next()
            .ok_or(ParseEngineError::new("buffer index"))
            .and_then(|token| {
                token
                    .parse()
                    .map_err(|_| ParseEngineError::new("buffer index"))
            })?;
        if tokens.next().is_some() {
            return Err(ParseEngineError::new("trailing input"));
        }

        let mut engine = Self::from_key_and_counter(key, counter)
            .map_err(|_| ParseEngineError::new("reserved bits set"))?;
        if sequence > Self::SEQ_LIMIT {
            return Err(ParseEngineError::new("sequence counter out of range"));
        }
        let lanes = Self::DOMAIN_WORDS;
        if index > lanes
            || (index < lanes && sequence == 0)
            || (index < lanes && sequence == Self::SEQ_LIMIT)
        {
            return Err(ParseEngineError::new("buffer index out of range"));
        }
        engine.sequence = sequence;
        engine.index = index;
        if index < lanes {
            engine.buffer = engine.prf.evaluate(engine.input_for(sequence - 1));
        }
        Ok(engine)
    }
}

impl<P: Prf, const COUNTER_BITS: u32> RngCore for CounterBasedEngine<P, COUNTER_BITS> {
    /// A 64-bit engine truncates one draw; a 32-bit engine returns one draw.
    ///
    /// # Panics
    ///
    /// If the stream is exhausted.
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.draw().into_u128() as u32
    }

    /// A 32-bit engine combines two draws, least significant first.
    ///
    /// # Panics
    ///
    /// If the stream is exhausted.
    #[inline]
    fn next_u64(&mut self) -> u64 {
        if <P::Word as Word>::BITS >= 64 {
            self.draw().into_u128() as u64
        } else {
            let x = self.draw().into_u128() as u64;
            let y = self.draw().into_u128() as u64;
            (y << 32) | x
        }
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl<P: Prf, const COUNTER_BITS: u32> SeedableRng for CounterBasedEngine<P, COUNTER_BITS> {
    type Seed = P::Seed;

    /// Create an engine from key bytes, read little-endian.
    ///
    /// `from_seed` cannot fail, so the reserved top bits of the key are
    /// cleared rather than rejected; use [`from_key`] to detect them.
    ///
    /// [`from_key`]: CounterBasedEngine::from_key
    fn from_seed(seed: Self::Seed) -> Self {
        let () = Self::VALID;
        let mut seed = seed;
        let mut key = P::Key::default();
        P::Word::read_words(seed.as_mut(), key.as_mut());
        let last = key.as_ref().len() - 1;
        key.as_mut()[last] = key.as_ref()[last] & !Self::reserved_key_mask();
        CounterBasedEngine {
            prf: P::with_key(key),
            base: P::Domain::default(),
            sequence: 0,
            buffer: P::Range::default(),
            index: Self::DOMAIN_WORDS,
        }
    }
}
