//! The arithmetic core: complement conversion and single/double precision
//! addition over [`Word`]s.
//!
//! Everything here is a pure function over words rather than a method on
//! [`crate::drum::Drum`] — the hardware describes these as transforms on
//! values, not state, so that's how they're modeled, and it makes them
//! trivially unit-testable without a drum in hand.

use crate::word::{Word, ABS_MASK, WORD_MASK};

/// Result of converting a word to the two's-complement form the adder
/// consumes, plus the bookkeeping a following double-precision operation
/// needs.
#[derive(Debug, Clone, Copy)]
pub struct ComplementResult {
    pub value: Word,
    /// Set iff the input was literally negative zero — the only case where
    /// negating the even half of a DP pair propagates a carry into the odd
    /// half.
    pub dp_carry: bool,
    /// The sign of the word this result came from, for use by
    /// [`complement_double_odd`] on the paired odd word.
    pub dp_even_sign: u32,
    /// True when the input was literally −0 (sign=1, magnitude=0).
    pub suppress_minus_0: bool,
}

/// Converts `w` into the two's-complement form the adder operates on.
/// Positive words (sign=0) pass through unchanged; negative words have their
/// magnitude replaced by its 28-bit two's complement.
pub fn complement_single(w: Word) -> ComplementResult {
    let sign = w.sign();
    let mag = w.magnitude();
    let suppress_minus_0 = sign != 0 && mag == 0;

    let complemented_mag = if sign == 0 {
        mag
    } else {
        // 2^28 - mag, wrapping (mag == 0 wraps to 0 and is the dp_carry case).
        (1u32 << 28).wrapping_sub(mag) & ((1u32 << 28) - 1)
    };

    ComplementResult {
        value: Word::from_sign_magnitude(sign, complemented_mag),
        dp_carry: suppress_minus_0,
        dp_even_sign: sign,
        suppress_minus_0,
    }
}

/// Converts the odd half of a double-precision value, given the sign and
/// carry produced by [`complement_single`] on the even half.
pub fn complement_double_odd(w: Word, dp_even_sign: u32, dp_carry: bool) -> Word {
    let carry_in = dp_carry as u32;
    let raw = if dp_even_sign != 0 {
        (WORD_MASK.wrapping_sub(w.raw())).wrapping_add(carry_in)
    } else {
        w.raw().wrapping_add(carry_in)
    };
    Word::new(raw)
}

/// Result of a single-precision add.
#[derive(Debug, Clone, Copy)]
pub struct AddResult {
    pub result: Word,
    pub overflow: bool,
}

/// Adds two 29-bit signed values in sign-and-magnitude form. Each operand is
/// converted to its two's-complement field (via its own sign bit, the same
/// conversion [`complement_single`] performs) before the 28-bit fields are
/// summed, so callers pass plain sign-magnitude words, not pre-complemented
/// ones. A negative-sign result has its magnitude converted back out of
/// complement form before it's returned, so the result is a normal
/// sign-magnitude word too. `suppress_minus_0` forces the end-carry to 1,
/// which is how the hardware avoids producing a literal −0 result.
pub fn add_single(a: Word, b: Word, suppress_minus_0: bool) -> AddResult {
    let a_sign = a.sign();
    let b_sign = b.sign();
    let a_mag = complement_single(a).value.magnitude();
    let b_mag = complement_single(b).value.magnitude();

    let raw_sum = a_mag + b_mag;
    let end_carry = if suppress_minus_0 {
        1
    } else {
        (raw_sum >> 28) & 1
    };
    let sum_mag = raw_sum & ((1 << 28) - 1);
    let result_sign = a_sign ^ b_sign ^ end_carry;
    // sum_mag is still in complement form; a negative result needs the same
    // back-conversion complement_single applies, to recover its true
    // magnitude before it's stored as a plain sign-magnitude word.
    let final_mag = if result_sign != 0 && sum_mag != 0 {
        (1u32 << 28) - sum_mag
    } else {
        sum_mag
    };
    let result = Word::from_sign_magnitude(result_sign, final_mag);

    let overflow = a_sign == b_sign
        && if end_carry != 0 {
            b_sign == 0 || sum_mag == 0
        } else {
            b_sign != 0
        };

    AddResult { result, overflow }
}

/// Even-word half of a double-precision addition. Zeroes the sign bits
/// before adding, so the two 29-bit fields combine as unsigned magnitudes;
/// the resulting carry-out and both operand signs feed the odd-word half.
#[derive(Debug, Clone, Copy)]
pub struct AddDoubleEvenResult {
    pub result: Word,
    pub pn_add_carry: bool,
    pub pn_augend_sign: u32,
    pub pn_addend_sign: u32,
}

pub fn add_double_even(pn_even: Word, src_even: Word) -> AddDoubleEvenResult {
    let a = pn_even.raw() & ABS_MASK;
    let b = src_even.raw() & ABS_MASK;
    let sum = a + b;

    AddDoubleEvenResult {
        result: Word::new(sum & WORD_MASK),
        pn_add_carry: (sum >> 29) & 1 != 0,
        pn_augend_sign: pn_even.sign(),
        pn_addend_sign: src_even.sign(),
    }
}

/// Odd-word half of a double-precision addition, completing the pair begun
/// by [`add_double_even`].
#[derive(Debug, Clone, Copy)]
pub struct AddDoubleOddResult {
    pub result: Word,
    /// Sign to deposit into PN-even bit-0 once the pair completes.
    pub pn_sign: u32,
    pub overflow: bool,
}

pub fn add_double_odd(
    pn_odd: Word,
    src_odd: Word,
    pn_add_carry: bool,
    pn_augend_sign: u32,
    pn_addend_sign: u32,
    suppress_minus_0: bool,
) -> AddDoubleOddResult {
    let sum = pn_odd.raw() + src_odd.raw() + pn_add_carry as u32;
    let end_carry = if suppress_minus_0 { 1 } else { (sum >> 29) & 1 };
    let result = Word::new(sum & WORD_MASK);
    let pn_sign = pn_augend_sign ^ pn_addend_sign ^ end_carry;

    let overflow = pn_augend_sign == pn_addend_sign
        && if end_carry != 0 {
            pn_addend_sign == 0 || result.is_zero()
        } else {
            pn_addend_sign != 0
        };

    AddDoubleOddResult {
        result,
        pn_sign,
        overflow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn complement_round_trips_except_minus_zero() {
        for raw in [0u32, 1, 0x1234_5678 & crate::word::WORD_MASK, WORD_MASK] {
            let w = Word::new(raw);
            if w.is_minus_zero() {
                continue;
            }
            let once = complement_single(w);
            let twice = complement_single(once.value);
            assert_eq!(twice.value, w, "round trip failed for {:?}", w);
        }
    }

    #[test]
    fn complement_round_trips_fuzzed() {
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let raw: u32 = rng.gen_range(0..=crate::word::WORD_MASK);
            let w = Word::new(raw);
            if w.is_minus_zero() {
                continue;
            }
            let once = complement_single(w);
            let twice = complement_single(once.value);
            assert_eq!(twice.value, w);
        }
    }

    #[test]
    fn add_single_identity() {
        for raw in [0u32, 1, 0x0ABC_DEF0, ABS_MASK] {
            let a = Word::new(raw);
            let sum = add_single(a, Word::ZERO, false);
            assert_eq!(sum.result, a);
            assert!(!sum.overflow);
        }
    }

    #[test]
    fn add_single_sign_reversal_yields_zero() {
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let raw: u32 = rng.gen_range(1..=crate::word::WORD_MASK);
            let a = Word::new(raw);
            if a.is_zero() {
                continue;
            }
            let flipped = Word::new(a.raw() ^ 1);
            let sum = add_single(a, flipped, false);
            assert_eq!(sum.result.raw() & ABS_MASK, 0, "a={:?}", a);
            assert!(!sum.overflow);
        }
    }

    #[test]
    fn overflow_matches_end_carry_rule() {
        // Two large positive magnitudes (sign=0) that overflow 28 bits.
        let a = Word::from_sign_magnitude(0, (1 << 28) - 1);
        let b = Word::from_sign_magnitude(0, 1);
        let sum = add_single(a, b, false);
        assert!(sum.overflow);
    }
}
