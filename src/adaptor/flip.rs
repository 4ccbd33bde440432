//! Flip adaptors for discrete parameter types.
//!
//! Flip adaptors carry no shape parameters, so the self-adaptation slot
//! of the shared state machine is a no-op for them; only the adaption
//! probability gates their effect.

use super::{AdaptionControl, DEFAULT_BIT_ADAPTION_PROBABILITY};
use crate::error::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The default symbol set for character parameters and flips.
pub(crate) const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Flips a boolean with an inner probability (default 1).
///
/// The outer adaption probability defaults to 0.05: flipping bits on
/// every adaption call would randomize boolean genomes instead of
/// mutating them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoolFlipAdaptor {
    control: AdaptionControl,
    flip_probability: f64,
}

impl BoolFlipAdaptor {
    /// Creates an adaptor with the default bit adaption probability.
    pub fn new() -> Self {
        BoolFlipAdaptor::default()
    }

    /// Sets the adaption probability (`0 < p <= 1`).
    pub fn set_adaption_probability(&mut self, p: f64) -> Result<()> {
        self.control.set_probability(p)
    }

    /// Sets the inner flip probability (`0 < p <= 1`).
    pub fn set_flip_probability(&mut self, p: f64) -> Result<()> {
        if !(p > 0.0 && p <= 1.0) {
            return Err(Error::invalid(format!(
                "flip probability must lie in (0, 1], got {p}"
            )));
        }
        self.flip_probability = p;
        Ok(())
    }

    /// Flips `value` with the configured probabilities.
    pub fn adapt<R: Rng>(&mut self, value: &mut bool, rng: &mut R) {
        if !self.control.roll(rng) {
            return;
        }
        if self.flip_probability >= 1.0 || rng.random_bool(self.flip_probability) {
            *value = !*value;
        }
    }

    /// Structural equality with a tolerance on floating-point fields.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        self.control.approx_eq(&other.control, tol)
            && (self.flip_probability - other.flip_probability).abs() <= tol
    }
}

impl Default for BoolFlipAdaptor {
    fn default() -> Self {
        BoolFlipAdaptor {
            control: AdaptionControl::from_parts(
                DEFAULT_BIT_ADAPTION_PROBABILITY,
                super::DEFAULT_ADAPTION_THRESHOLD,
            ),
            flip_probability: 1.0,
        }
    }
}

/// Shifts an integer by ±1 with equal probability, wrapping at the
/// type's range.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IntFlipAdaptor {
    control: AdaptionControl,
}

impl IntFlipAdaptor {
    /// Creates an adaptor with the default adaption probability.
    pub fn new() -> Self {
        IntFlipAdaptor::default()
    }

    /// Sets the adaption probability (`0 < p <= 1`).
    pub fn set_adaption_probability(&mut self, p: f64) -> Result<()> {
        self.control.set_probability(p)
    }

    /// Shifts `value` by ±1 with the configured probability.
    pub fn adapt<R: Rng>(&mut self, value: &mut i32, rng: &mut R) {
        if !self.control.roll(rng) {
            return;
        }
        if rng.random_bool(0.5) {
            *value = value.wrapping_add(1);
        } else {
            *value = value.wrapping_sub(1);
        }
    }

    /// Structural equality with a tolerance on floating-point fields.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        self.control.approx_eq(&other.control, tol)
    }
}

/// Replaces a character with a uniform pick among the alphabet's other
/// symbols.
///
/// The adaptor owns its alphabet; a value outside the alphabet is
/// replaced by an arbitrary alphabet symbol.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CharFlipAdaptor {
    control: AdaptionControl,
    alphabet: Vec<char>,
}

impl CharFlipAdaptor {
    /// Creates an adaptor over the default lowercase alphabet.
    pub fn new() -> Self {
        CharFlipAdaptor::default()
    }

    /// Creates an adaptor over a custom alphabet.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when the alphabet has fewer than two
    /// symbols (nothing to flip to).
    pub fn with_alphabet(alphabet: impl IntoIterator<Item = char>) -> Result<Self> {
        let alphabet: Vec<char> = alphabet.into_iter().collect();
        if alphabet.len() < 2 {
            return Err(Error::invalid(
                "character alphabet needs at least two symbols",
            ));
        }
        Ok(CharFlipAdaptor {
            control: AdaptionControl::default(),
            alphabet,
        })
    }

    /// Sets the adaption probability (`0 < p <= 1`).
    pub fn set_adaption_probability(&mut self, p: f64) -> Result<()> {
        self.control.set_probability(p)
    }

    /// The symbols this adaptor draws from.
    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// Replaces `value` by another alphabet symbol with the configured
    /// probability.
    pub fn adapt<R: Rng>(&mut self, value: &mut char, rng: &mut R) {
        if !self.control.roll(rng) {
            return;
        }
        let current = self
            .alphabet
            .iter()
            .position(|&c| c == *value);
        match current {
            Some(pos) => {
                // Uniform among the remaining symbols: draw an index in
                // the shortened range and skip over the current one.
                let idx = rng.random_range(0..self.alphabet.len() - 1);
                let idx = if idx >= pos { idx + 1 } else { idx };
                *value = self.alphabet[idx];
            }
            None => {
                *value = self.alphabet[rng.random_range(0..self.alphabet.len())];
            }
        }
    }

    /// Structural equality with a tolerance on floating-point fields.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        self.control.approx_eq(&other.control, tol) && self.alphabet == other.alphabet
    }
}

impl Default for CharFlipAdaptor {
    fn default() -> Self {
        CharFlipAdaptor {
            control: AdaptionControl::default(),
            alphabet: DEFAULT_ALPHABET.chars().collect(),
        }
    }
}
