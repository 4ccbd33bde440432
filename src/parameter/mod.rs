//! Typed decision variables and their ordered container.
//!
//! A [`Parameter`] is a closed tagged variant over the supported value
//! types (real, bounded-real, integer, bounded-integer, boolean,
//! character), each holding its value and an ordered list of adaptors.
//! Bounded variants keep an unbounded internal representative and apply
//! the [`transfer`] mapping on every external read, so the observed
//! value always lies in `[lo, hi]` no matter how far adaptors push the
//! representative.
//!
//! [`ParameterSet`] is the ordered, possibly heterogeneous collection an
//! individual owns; its adapt order is deterministic (position 0 first)
//! and serialization preserves order and kind.

pub mod transfer;

use crate::adaptor::{BoolAdaptor, CharAdaptor, IntAdaptor, RealAdaptor};
use crate::error::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use transfer::{transfer_int, transfer_real};

/// Discriminates the parameter variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterKind {
    Real,
    BoundedReal,
    Int,
    BoundedInt,
    Bool,
    Char,
}

/// An externally observed parameter value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Real(f64),
    Int(i32),
    Bool(bool),
    Char(char),
}

/// Unbounded real-valued parameter.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RealParameter {
    value: f64,
    adaptors: Vec<RealAdaptor>,
}

impl RealParameter {
    pub fn new(value: f64) -> Self {
        RealParameter {
            value,
            adaptors: Vec::new(),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    /// Appends an adaptor; adaptors run in insertion order.
    pub fn add_adaptor(&mut self, adaptor: RealAdaptor) {
        self.adaptors.push(adaptor);
    }
}

/// Real-valued parameter constrained to `[lower, upper]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoundedRealParameter {
    internal: f64,
    lower: f64,
    upper: f64,
    adaptors: Vec<RealAdaptor>,
}

impl BoundedRealParameter {
    /// Creates a bounded parameter with an initial value.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] unless `lower < upper`;
    /// [`Error::OutOfRange`] when `value` lies outside the boundaries.
    pub fn new(value: f64, lower: f64, upper: f64) -> Result<Self> {
        check_real_bounds(lower, upper)?;
        if value < lower || value > upper {
            return Err(Error::out_of_range(value, lower, upper));
        }
        Ok(BoundedRealParameter {
            internal: value,
            lower,
            upper,
            adaptors: Vec::new(),
        })
    }

    /// The externally observed value: the internal representative folded
    /// into the fundamental domain on every read.
    pub fn value(&self) -> f64 {
        transfer_real(self.internal, self.lower, self.upper)
    }

    /// Assigns a value, repositioning the representative inside the
    /// fundamental domain.
    ///
    /// # Errors
    /// [`Error::OutOfRange`] when `value` lies outside the boundaries.
    pub fn set_value(&mut self, value: f64) -> Result<()> {
        if value < self.lower || value > self.upper {
            return Err(Error::out_of_range(value, self.lower, self.upper));
        }
        self.internal = value;
        Ok(())
    }

    /// Sets the unbounded internal representative directly.
    pub fn set_internal(&mut self, internal: f64) {
        self.internal = internal;
    }

    /// The unbounded internal representative.
    pub fn internal(&self) -> f64 {
        self.internal
    }

    pub fn boundaries(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    /// Moves the boundaries, keeping the current external value.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] unless `lower < upper`;
    /// [`Error::OutOfRange`] when the current external value falls
    /// outside the new boundaries (use [`reset_boundaries`] to fold it
    /// instead).
    ///
    /// [`reset_boundaries`]: BoundedRealParameter::reset_boundaries
    pub fn set_boundaries(&mut self, lower: f64, upper: f64) -> Result<()> {
        check_real_bounds(lower, upper)?;
        let current = self.value();
        if current < lower || current > upper {
            return Err(Error::out_of_range(current, lower, upper));
        }
        self.internal = current;
        self.lower = lower;
        self.upper = upper;
        Ok(())
    }

    /// Moves the boundaries and folds the current external value into
    /// the new fundamental domain, repositioning the representative.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] unless `lower < upper`.
    pub fn reset_boundaries(&mut self, lower: f64, upper: f64) -> Result<()> {
        check_real_bounds(lower, upper)?;
        self.internal = transfer_real(self.value(), lower, upper);
        self.lower = lower;
        self.upper = upper;
        Ok(())
    }

    /// Appends an adaptor; adaptors run in insertion order.
    pub fn add_adaptor(&mut self, adaptor: RealAdaptor) {
        self.adaptors.push(adaptor);
    }
}

/// Unbounded integer parameter.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IntParameter {
    value: i32,
    adaptors: Vec<IntAdaptor>,
}

impl IntParameter {
    pub fn new(value: i32) -> Self {
        IntParameter {
            value,
            adaptors: Vec::new(),
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn set_value(&mut self, value: i32) {
        self.value = value;
    }

    /// Appends an adaptor; adaptors run in insertion order.
    pub fn add_adaptor(&mut self, adaptor: IntAdaptor) {
        self.adaptors.push(adaptor);
    }
}

/// Integer parameter constrained to `[lower, upper]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoundedIntParameter {
    internal: i32,
    lower: i32,
    upper: i32,
    adaptors: Vec<IntAdaptor>,
}

impl BoundedIntParameter {
    /// Creates a bounded parameter with an initial value.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] unless `lower < upper`;
    /// [`Error::OutOfRange`] when `value` lies outside the boundaries.
    pub fn new(value: i32, lower: i32, upper: i32) -> Result<Self> {
        check_int_bounds(lower, upper)?;
        if value < lower || value > upper {
            return Err(Error::out_of_range(value, lower, upper));
        }
        Ok(BoundedIntParameter {
            internal: value,
            lower,
            upper,
            adaptors: Vec::new(),
        })
    }

    /// The externally observed value, folded on every read.
    pub fn value(&self) -> i32 {
        transfer_int(self.internal, self.lower, self.upper)
    }

    /// Assigns a value, repositioning the representative inside the
    /// fundamental domain.
    ///
    /// # Errors
    /// [`Error::OutOfRange`] when `value` lies outside the boundaries.
    pub fn set_value(&mut self, value: i32) -> Result<()> {
        if value < self.lower || value > self.upper {
            return Err(Error::out_of_range(value, self.lower, self.upper));
        }
        self.internal = value;
        Ok(())
    }

    /// Sets the unbounded internal representative directly.
    pub fn set_internal(&mut self, internal: i32) {
        self.internal = internal;
    }

    pub fn boundaries(&self) -> (i32, i32) {
        (self.lower, self.upper)
    }

    /// Moves the boundaries, keeping the current external value.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] unless `lower < upper`;
    /// [`Error::OutOfRange`] when the current external value falls
    /// outside the new boundaries.
    pub fn set_boundaries(&mut self, lower: i32, upper: i32) -> Result<()> {
        check_int_bounds(lower, upper)?;
        let current = self.value();
        if current < lower || current > upper {
            return Err(Error::out_of_range(current, lower, upper));
        }
        self.internal = current;
        self.lower = lower;
        self.upper = upper;
        Ok(())
    }

    /// Moves the boundaries and folds the current external value into
    /// the new fundamental domain.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] unless `lower < upper`.
    pub fn reset_boundaries(&mut self, lower: i32, upper: i32) -> Result<()> {
        check_int_bounds(lower, upper)?;
        self.internal = transfer_int(self.value(), lower, upper);
        self.lower = lower;
        self.upper = upper;
        Ok(())
    }

    /// Appends an adaptor; adaptors run in insertion order.
    pub fn add_adaptor(&mut self, adaptor: IntAdaptor) {
        self.adaptors.push(adaptor);
    }
}

/// Boolean parameter.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BoolParameter {
    value: bool,
    adaptors: Vec<BoolAdaptor>,
}

impl BoolParameter {
    pub fn new(value: bool) -> Self {
        BoolParameter {
            value,
            adaptors: Vec::new(),
        }
    }

    pub fn value(&self) -> bool {
        self.value
    }

    pub fn set_value(&mut self, value: bool) {
        self.value = value;
    }

    /// Appends an adaptor; adaptors run in insertion order.
    pub fn add_adaptor(&mut self, adaptor: BoolAdaptor) {
        self.adaptors.push(adaptor);
    }
}

/// Character parameter drawing from an alphabet.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CharParameter {
    value: char,
    alphabet: Vec<char>,
    adaptors: Vec<CharAdaptor>,
}

impl CharParameter {
    /// Creates a parameter over the default lowercase alphabet.
    pub fn new(value: char) -> Self {
        CharParameter {
            value,
            alphabet: crate::adaptor::default_alphabet(),
            adaptors: Vec::new(),
        }
    }

    /// Creates a parameter over a custom alphabet.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] when the alphabet is empty or does not
    /// contain `value`.
    pub fn with_alphabet(value: char, alphabet: impl IntoIterator<Item = char>) -> Result<Self> {
        let alphabet: Vec<char> = alphabet.into_iter().collect();
        if alphabet.is_empty() {
            return Err(Error::invalid("character alphabet must not be empty"));
        }
        if !alphabet.contains(&value) {
            return Err(Error::invalid(format!(
                "initial value {value:?} not in the alphabet"
            )));
        }
        Ok(CharParameter {
            value,
            alphabet,
            adaptors: Vec::new(),
        })
    }

    pub fn value(&self) -> char {
        self.value
    }

    pub fn set_value(&mut self, value: char) -> Result<()> {
        if !self.alphabet.contains(&value) {
            return Err(Error::invalid(format!(
                "value {value:?} not in the alphabet"
            )));
        }
        self.value = value;
        Ok(())
    }

    /// Appends an adaptor; adaptors run in insertion order.
    pub fn add_adaptor(&mut self, adaptor: CharAdaptor) {
        self.adaptors.push(adaptor);
    }
}

fn check_real_bounds(lower: f64, upper: f64) -> Result<()> {
    if !lower.is_finite() || !upper.is_finite() {
        return Err(Error::invalid(format!(
            "boundaries must be finite, got [{lower}, {upper}]"
        )));
    }
    if !(lower < upper) {
        return Err(Error::invalid(format!(
            "lower boundary {lower} must be strictly below upper boundary {upper}"
        )));
    }
    Ok(())
}

fn check_int_bounds(lower: i32, upper: i32) -> Result<()> {
    if lower >= upper {
        return Err(Error::invalid(format!(
            "lower boundary {lower} must be strictly below upper boundary {upper}"
        )));
    }
    Ok(())
}

/// A single typed decision variable.
///
/// The closed set of variants keeps dispatch for `adapt`, `random_init`
/// and serialization in one place each, and spares downstream code any
/// downcasting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Parameter {
    Real(RealParameter),
    BoundedReal(BoundedRealParameter),
    Int(IntParameter),
    BoundedInt(BoundedIntParameter),
    Bool(BoolParameter),
    Char(CharParameter),
}

impl Parameter {
    /// Shorthand for an unbounded real parameter.
    pub fn real(value: f64) -> Self {
        Parameter::Real(RealParameter::new(value))
    }

    /// Shorthand for a bounded real parameter.
    pub fn bounded_real(value: f64, lower: f64, upper: f64) -> Result<Self> {
        Ok(Parameter::BoundedReal(BoundedRealParameter::new(
            value, lower, upper,
        )?))
    }

    /// Shorthand for an unbounded integer parameter.
    pub fn int(value: i32) -> Self {
        Parameter::Int(IntParameter::new(value))
    }

    /// Shorthand for a bounded integer parameter.
    pub fn bounded_int(value: i32, lower: i32, upper: i32) -> Result<Self> {
        Ok(Parameter::BoundedInt(BoundedIntParameter::new(
            value, lower, upper,
        )?))
    }

    /// Shorthand for a boolean parameter.
    pub fn boolean(value: bool) -> Self {
        Parameter::Bool(BoolParameter::new(value))
    }

    /// Shorthand for a character parameter over the default alphabet.
    pub fn character(value: char) -> Self {
        Parameter::Char(CharParameter::new(value))
    }

    /// The variant this parameter belongs to.
    pub fn kind(&self) -> ParameterKind {
        match self {
            Parameter::Real(_) => ParameterKind::Real,
            Parameter::BoundedReal(_) => ParameterKind::BoundedReal,
            Parameter::Int(_) => ParameterKind::Int,
            Parameter::BoundedInt(_) => ParameterKind::BoundedInt,
            Parameter::Bool(_) => ParameterKind::Bool,
            Parameter::Char(_) => ParameterKind::Char,
        }
    }

    /// The externally observed value (transfer applied for bounded
    /// variants).
    pub fn value(&self) -> Value {
        match self {
            Parameter::Real(p) => Value::Real(p.value()),
            Parameter::BoundedReal(p) => Value::Real(p.value()),
            Parameter::Int(p) => Value::Int(p.value()),
            Parameter::BoundedInt(p) => Value::Int(p.value()),
            Parameter::Bool(p) => Value::Bool(p.value()),
            Parameter::Char(p) => Value::Char(p.value()),
        }
    }

    /// The observed value of a real-typed variant.
    pub fn as_real(&self) -> Option<f64> {
        match self.value() {
            Value::Real(v) => Some(v),
            _ => None,
        }
    }

    /// The observed value of an integer-typed variant.
    pub fn as_int(&self) -> Option<i32> {
        match self.value() {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }

    /// The observed value of a boolean variant.
    pub fn as_bool(&self) -> Option<bool> {
        match self.value() {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// The observed value of a character variant.
    pub fn as_char(&self) -> Option<char> {
        match self.value() {
            Value::Char(v) => Some(v),
            _ => None,
        }
    }

    /// Applies every adaptor to the internal representative, in order.
    ///
    /// Returns the number of adaptors applied. The owning individual is
    /// responsible for raising its dirty flag afterwards.
    pub fn adapt<R: Rng>(&mut self, rng: &mut R) -> usize {
        match self {
            Parameter::Real(p) => {
                for a in &mut p.adaptors {
                    a.adapt(&mut p.value, rng);
                }
                p.adaptors.len()
            }
            Parameter::BoundedReal(p) => {
                for a in &mut p.adaptors {
                    a.adapt(&mut p.internal, rng);
                }
                p.adaptors.len()
            }
            Parameter::Int(p) => {
                for a in &mut p.adaptors {
                    a.adapt(&mut p.value, rng);
                }
                p.adaptors.len()
            }
            Parameter::BoundedInt(p) => {
                for a in &mut p.adaptors {
                    a.adapt(&mut p.internal, rng);
                }
                p.adaptors.len()
            }
            Parameter::Bool(p) => {
                for a in &mut p.adaptors {
                    a.adapt(&mut p.value, rng);
                }
                p.adaptors.len()
            }
            Parameter::Char(p) => {
                for a in &mut p.adaptors {
                    a.adapt(&mut p.value, rng);
                }
                p.adaptors.len()
            }
        }
    }

    /// Draws a fresh value: uniform over `[lo, hi]` for bounded
    /// variants, a type-specific default distribution otherwise.
    pub fn random_init<R: Rng>(&mut self, rng: &mut R) {
        match self {
            Parameter::Real(p) => p.value = rng.random::<f64>(),
            Parameter::BoundedReal(p) => {
                p.internal = rng.random_range(p.lower..=p.upper);
            }
            Parameter::Int(p) => p.value = rng.random::<i32>(),
            Parameter::BoundedInt(p) => {
                p.internal = rng.random_range(p.lower..=p.upper);
            }
            Parameter::Bool(p) => p.value = rng.random_bool(0.5),
            Parameter::Char(p) => {
                p.value = p.alphabet[rng.random_range(0..p.alphabet.len())];
            }
        }
    }

    /// Structural equality with a tolerance on floating-point fields
    /// (values, boundaries and adaptor shape parameters alike).
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        match (self, other) {
            (Parameter::Real(a), Parameter::Real(b)) => {
                (a.value - b.value).abs() <= tol
                    && vecs_approx_eq(&a.adaptors, &b.adaptors, tol, RealAdaptor::approx_eq)
            }
            (Parameter::BoundedReal(a), Parameter::BoundedReal(b)) => {
                (a.internal - b.internal).abs() <= tol
                    && (a.lower - b.lower).abs() <= tol
                    && (a.upper - b.upper).abs() <= tol
                    && vecs_approx_eq(&a.adaptors, &b.adaptors, tol, RealAdaptor::approx_eq)
            }
            (Parameter::Int(a), Parameter::Int(b)) => {
                a.value == b.value
                    && vecs_approx_eq(&a.adaptors, &b.adaptors, tol, IntAdaptor::approx_eq)
            }
            (Parameter::BoundedInt(a), Parameter::BoundedInt(b)) => {
                a.internal == b.internal
                    && a.lower == b.lower
                    && a.upper == b.upper
                    && vecs_approx_eq(&a.adaptors, &b.adaptors, tol, IntAdaptor::approx_eq)
            }
            (Parameter::Bool(a), Parameter::Bool(b)) => {
                a.value == b.value
                    && vecs_approx_eq(&a.adaptors, &b.adaptors, tol, BoolAdaptor::approx_eq)
            }
            (Parameter::Char(a), Parameter::Char(b)) => {
                a.value == b.value
                    && a.alphabet == b.alphabet
                    && vecs_approx_eq(&a.adaptors, &b.adaptors, tol, CharAdaptor::approx_eq)
            }
            _ => false,
        }
    }
}

fn vecs_approx_eq<T>(a: &[T], b: &[T], tol: f64, eq: impl Fn(&T, &T, f64) -> bool) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| eq(x, y, tol))
}

/// Ordered, possibly heterogeneous collection of parameters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ParameterSet {
    params: Vec<Parameter>,
}

impl ParameterSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        ParameterSet::default()
    }

    /// Appends a parameter at the end of the adapt order.
    pub fn push(&mut self, parameter: Parameter) {
        self.params.push(parameter);
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Parameter> {
        self.params.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Parameter> {
        self.params.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.params.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Parameter> {
        self.params.iter_mut()
    }

    /// Applies every parameter's adaptors in position order (0 first).
    ///
    /// Returns the total number of adaptor applications.
    pub fn adapt_all<R: Rng>(&mut self, rng: &mut R) -> usize {
        self.params.iter_mut().map(|p| p.adapt(rng)).sum()
    }

    /// Re-initializes every parameter.
    pub fn random_init_all<R: Rng>(&mut self, rng: &mut R) {
        for p in &mut self.params {
            p.random_init(rng);
        }
    }

    /// Counts the parameters of one kind.
    pub fn count_by_kind(&self, kind: ParameterKind) -> usize {
        self.params.iter().filter(|p| p.kind() == kind).count()
    }

    /// The observed values in position order.
    pub fn values(&self) -> Vec<Value> {
        self.params.iter().map(Parameter::value).collect()
    }

    /// The observed values of all real-typed parameters, in position
    /// order. Convenience for objectives over real vectors.
    pub fn real_values(&self) -> Vec<f64> {
        self.params.iter().filter_map(Parameter::as_real).collect()
    }

    /// The observed real value at `index`, if that parameter is
    /// real-typed.
    pub fn real_value(&self, index: usize) -> Option<f64> {
        self.params.get(index).and_then(Parameter::as_real)
    }

    /// The observed integer value at `index`, if that parameter is
    /// integer-typed.
    pub fn int_value(&self, index: usize) -> Option<i32> {
        self.params.get(index).and_then(Parameter::as_int)
    }

    /// Structural equality with a tolerance on floating-point fields.
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(other.params.iter())
                .all(|(a, b)| a.approx_eq(b, tol))
    }
}

impl FromIterator<Parameter> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        ParameterSet {
            params: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adaptor::{GaussAdaptor, IntGaussAdaptor};
    use crate::random::create_rng;

    #[test]
    fn test_bounded_real_rejects_out_of_range_value() {
        let mut p = BoundedRealParameter::new(0.0, -1.0, 1.0).unwrap();
        assert!(matches!(
            p.set_value(1.5),
            Err(Error::OutOfRange { .. })
        ));
        assert!(p.set_value(0.25).is_ok());
        assert_eq!(p.value(), 0.25);
    }

    #[test]
    fn test_bounded_real_rejects_inverted_bounds() {
        assert!(BoundedRealParameter::new(0.0, 1.0, -1.0).is_err());
        assert!(BoundedRealParameter::new(0.0, 1.0, 1.0).is_err());
        assert!(BoundedRealParameter::new(2.0, -1.0, 1.0).is_err());
    }

    #[test]
    fn test_bounded_real_reads_through_transfer() {
        let mut p = BoundedRealParameter::new(0.0, -1.0, 1.0).unwrap();
        p.set_internal(2.5);
        // The representative 2.5 reflects at the upper boundary onto the
        // descending flank.
        assert!((p.value() - (-0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_bounded_real_set_boundaries_keeps_value() {
        let mut p = BoundedRealParameter::new(0.5, -1.0, 1.0).unwrap();
        p.set_boundaries(0.0, 2.0).unwrap();
        assert_eq!(p.value(), 0.5);
        assert!(matches!(
            p.set_boundaries(0.6, 2.0),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_bounded_real_reset_boundaries_folds() {
        let mut p = BoundedRealParameter::new(0.5, -1.0, 1.0).unwrap();
        // The current value 0.5 lies outside the new domain and gets
        // folded instead of rejected.
        p.reset_boundaries(0.6, 2.0).unwrap();
        let v = p.value();
        assert!((0.6..=2.0).contains(&v));
        assert!((v - 0.7).abs() < 1e-12, "0.5 reflects at 0.6 to 0.7, got {v}");
    }

    #[test]
    fn test_bounded_int_wanders_and_folds() {
        let mut p = BoundedIntParameter::new(2, 1, 5).unwrap();
        p.set_internal(7);
        assert_eq!(p.value(), 4);
        p.set_internal(1_000_000);
        assert!((1..=5).contains(&p.value()));
    }

    #[test]
    fn test_adapt_runs_adaptors_in_order() {
        let mut p = RealParameter::new(0.0);
        p.add_adaptor(RealAdaptor::Gauss(GaussAdaptor::new()));
        p.add_adaptor(RealAdaptor::Gauss(GaussAdaptor::new()));
        let mut param = Parameter::Real(p);
        let mut rng = create_rng(42);
        assert_eq!(param.adapt(&mut rng), 2);
        assert_ne!(param.as_real().unwrap(), 0.0);
    }

    #[test]
    fn test_bounded_adaption_never_escapes_range() {
        let mut inner = BoundedIntParameter::new(2, 1, 5).unwrap();
        inner.add_adaptor(IntAdaptor::Gauss(
            IntGaussAdaptor::with_shape(3.0, 0.001, 1e-7, 5.0).unwrap(),
        ));
        let mut p = Parameter::BoundedInt(inner);
        let mut rng = create_rng(42);
        for _ in 0..10_000 {
            p.adapt(&mut rng);
            let v = p.as_int().unwrap();
            assert!((1..=5).contains(&v), "observed {v}");
        }
    }

    #[test]
    fn test_random_init_bounded_uniform() {
        let mut p = Parameter::bounded_real(0.0, -2.0, 2.0).unwrap();
        let mut rng = create_rng(42);
        let mut sum = 0.0;
        let n = 10_000;
        for _ in 0..n {
            p.random_init(&mut rng);
            let v = p.as_real().unwrap();
            assert!((-2.0..=2.0).contains(&v));
            sum += v;
        }
        let mean = sum / f64::from(n);
        assert!(mean.abs() < 0.1, "uniform mean expected near 0, got {mean}");
    }

    #[test]
    fn test_char_parameter_alphabet_checks() {
        assert!(CharParameter::with_alphabet('z', ['a', 'b']).is_err());
        let mut p = CharParameter::with_alphabet('a', ['a', 'b']).unwrap();
        assert!(p.set_value('c').is_err());
        assert!(p.set_value('b').is_ok());
    }

    #[test]
    fn test_set_kinds_and_counts() {
        let set: ParameterSet = [
            Parameter::real(1.0),
            Parameter::bounded_real(0.0, -1.0, 1.0).unwrap(),
            Parameter::bounded_real(0.5, 0.0, 1.0).unwrap(),
            Parameter::int(3),
            Parameter::boolean(true),
            Parameter::character('x'),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 6);
        assert_eq!(set.count_by_kind(ParameterKind::BoundedReal), 2);
        assert_eq!(set.count_by_kind(ParameterKind::Real), 1);
        assert_eq!(set.count_by_kind(ParameterKind::BoundedInt), 0);
        assert_eq!(set.real_values(), vec![1.0, 0.0, 0.5]);
        assert_eq!(set.int_value(3), Some(3));
    }

    #[test]
    fn test_serde_preserves_order_and_kind() {
        let set: ParameterSet = [
            Parameter::bounded_real(0.25, -1.0, 1.0).unwrap(),
            Parameter::boolean(false),
            Parameter::bounded_int(4, 0, 9).unwrap(),
            Parameter::character('k'),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&set).unwrap();
        let back: ParameterSet = serde_json::from_str(&json).unwrap();
        let kinds: Vec<ParameterKind> = back.iter().map(Parameter::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ParameterKind::BoundedReal,
                ParameterKind::Bool,
                ParameterKind::BoundedInt,
                ParameterKind::Char
            ]
        );
        assert!(set.approx_eq(&back, 1e-12));
    }

    #[test]
    fn test_approx_eq_detects_value_drift() {
        let a: ParameterSet = [Parameter::real(1.0)].into_iter().collect();
        let b: ParameterSet = [Parameter::real(1.0 + 1e-6)].into_iter().collect();
        assert!(!a.approx_eq(&b, 1e-9));
        assert!(a.approx_eq(&b, 1e-3));
    }

    #[test]
    fn test_adapt_all_is_deterministic() {
        let build = || -> ParameterSet {
            let mut p = BoundedRealParameter::new(0.0, -5.0, 5.0).unwrap();
            p.add_adaptor(RealAdaptor::Gauss(GaussAdaptor::new()));
            [Parameter::BoundedReal(p), Parameter::real(1.0)]
                .into_iter()
                .collect()
        };
        let mut s1 = build();
        let mut s2 = build();
        let mut r1 = create_rng(11);
        let mut r2 = create_rng(11);
        s1.adapt_all(&mut r1);
        s2.adapt_all(&mut r2);
        assert!(s1.approx_eq(&s2, 0.0));
    }
}
