//! Bounded value mapping.
//!
//! Bounded parameters store an unbounded internal representative; the
//! externally visible value is obtained by folding the representative
//! into the fundamental domain `[lo, hi]` with a reflecting
//! triangle-wave. The mapping is continuous, the identity inside the
//! domain, reflects at each boundary and is idempotent, so adaptors can
//! push the representative arbitrarily far without ever producing an
//! out-of-range observation.

/// Folds an unbounded real into `[lo, hi]`.
///
/// `w = hi - lo`, `u = (x - lo)/w`, `u' = u - 2*floor((u+1)/2)`,
/// `ext = lo + w*|u'|`. Values already inside the domain pass through
/// unchanged.
pub fn transfer_real(x: f64, lo: f64, hi: f64) -> f64 {
    debug_assert!(lo < hi, "invalid boundaries [{lo}, {hi}]");
    if x >= lo && x <= hi {
        return x;
    }
    let w = hi - lo;
    let u = (x - lo) / w;
    let folded = u - 2.0 * ((u + 1.0) / 2.0).floor();
    // The clamp absorbs rounding at the fold points so the result is
    // always a fixed point of the mapping.
    (lo + w * folded.abs()).clamp(lo, hi)
}

/// Folds an unbounded integer into `[lo, hi]`.
///
/// With `M = hi - lo + 1` values in the domain, the residue of `x - lo`
/// modulo `2M` is reflected in its upper half. Drawing `x - lo`
/// uniformly from any interval whose length is a multiple of `2M` hits
/// every external value exactly twice per period, giving a uniform
/// marginal over `[lo, hi]`.
pub fn transfer_int(x: i32, lo: i32, hi: i32) -> i32 {
    debug_assert!(lo < hi, "invalid boundaries [{lo}, {hi}]");
    let (x, lo64, hi64) = (x as i64, lo as i64, hi as i64);
    let m = hi64 - lo64 + 1;
    let r = (x - lo64).rem_euclid(2 * m);
    let folded = if r < m { r } else { 2 * m - 1 - r };
    (lo64 + folded) as i32
}
