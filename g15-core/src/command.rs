//! Command word decode/encode.
//!
//! Layout, low bit to high: C1(1), D(5), S(5), C(2), BP(1), N(7), T(7), DI(1).

use crate::word::{bits, set_bits};

const C1_RANGE: std::ops::RangeInclusive<u32> = 0..=0;
const D_RANGE: std::ops::RangeInclusive<u32> = 1..=5;
const S_RANGE: std::ops::RangeInclusive<u32> = 6..=10;
const C_RANGE: std::ops::RangeInclusive<u32> = 11..=12;
const BP_RANGE: std::ops::RangeInclusive<u32> = 13..=13;
const N_RANGE: std::ops::RangeInclusive<u32> = 14..=20;
const T_RANGE: std::ops::RangeInclusive<u32> = 21..=27;
const DI_RANGE: std::ops::RangeInclusive<u32> = 28..=28;

/// A decoded command word. Fields are kept as plain `u32`s — there's no
/// value in newtyping a 1..7-bit field that's only ever compared or used as
/// an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// Double-precision flag.
    pub c1: u32,
    /// Destination line/register (0..31).
    pub d: u32,
    /// Source line/register (0..31).
    pub s: u32,
    /// Characteristic: 0=TR, 1=AD, 2=TVA/AV, 3=AVA/SU.
    pub c: u32,
    /// Breakpoint tag.
    pub bp: u32,
    /// Word-time count/target, low half.
    pub n: u32,
    /// Word-time count/target, high half (transfer end point).
    pub t: u32,
    /// Deferred-execution flag: 0 = immediate, 1 = deferred until T.
    pub di: u32,
    /// Via-AR characteristic, computed at decode time (not stored in the
    /// word itself).
    pub cs: bool,
}

impl Command {
    /// Decodes a raw 29-bit command word.
    pub fn decode(raw: u32) -> Command {
        let c1 = bits(raw, C1_RANGE);
        let d = bits(raw, D_RANGE);
        let s = bits(raw, S_RANGE);
        let c = bits(raw, C_RANGE);
        let bp = bits(raw, BP_RANGE);
        let n = bits(raw, N_RANGE);
        let t = bits(raw, T_RANGE);
        let di = bits(raw, DI_RANGE);
        let cs = via_ar(c, s, d);
        Command {
            c1,
            d,
            s,
            c,
            bp,
            n,
            t,
            di,
            cs,
        }
    }

    /// Re-encodes the field values into a raw 29-bit word. `cs` is derived,
    /// not stored, so it round-trips through `decode` rather than through
    /// `encode`.
    pub fn encode(&self) -> u32 {
        let mut raw = 0u32;
        raw = set_bits(raw, self.c1, C1_RANGE);
        raw = set_bits(raw, self.d, D_RANGE);
        raw = set_bits(raw, self.s, S_RANGE);
        raw = set_bits(raw, self.c, C_RANGE);
        raw = set_bits(raw, self.bp, BP_RANGE);
        raw = set_bits(raw, self.n, N_RANGE);
        raw = set_bits(raw, self.t, T_RANGE);
        raw = set_bits(raw, self.di, DI_RANGE);
        raw
    }

    /// Applies the legacy adjustment made when a command is fetched from
    /// L=107: subtract 20 (mod 108) from N, and from T unless D=31 and
    /// S∈24..27 (the multiword operations, which count T in word-times
    /// rather than as a target line and so don't get the same rebase).
    pub fn apply_l107_adjustment(&mut self) {
        self.n = (self.n as i32 - 20).rem_euclid(crate::drum::LONG_LINE_WORDS as i32) as u32;
        let skip_t = self.d == 31 && (24..=27).contains(&self.s);
        if !skip_t {
            self.t = (self.t as i32 - 20).rem_euclid(crate::drum::LONG_LINE_WORDS as i32) as u32;
        }
    }
}

/// Computes the "via-AR" characteristic CS: set when C has its high bit set
/// (C∈{2,3}) and both S and D address regular lines (below 28 — not MQ/ID
/// /PN/TEST/AR/etc.).
pub fn via_ar(c: u32, s: u32, d: u32) -> bool {
    (c & 2) != 0 && s < 24 && d < 24
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_field() {
        let cmd = Command {
            c1: 1,
            d: 28,
            s: 0,
            c: 1,
            bp: 1,
            n: 91,
            t: 107,
            di: 1,
            cs: false,
        };
        let raw = cmd.encode();
        let decoded = Command::decode(raw);
        assert_eq!(decoded.c1, cmd.c1);
        assert_eq!(decoded.d, cmd.d);
        assert_eq!(decoded.s, cmd.s);
        assert_eq!(decoded.c, cmd.c);
        assert_eq!(decoded.bp, cmd.bp);
        assert_eq!(decoded.n, cmd.n);
        assert_eq!(decoded.t, cmd.t);
        assert_eq!(decoded.di, cmd.di);
    }

    #[test]
    fn via_ar_requires_regular_lines_and_odd_characteristic() {
        assert!(via_ar(2, 0, 0));
        assert!(via_ar(3, 5, 10));
        assert!(!via_ar(0, 0, 0));
        assert!(!via_ar(2, 28, 0));
        assert!(!via_ar(2, 0, 29));
    }

    #[test]
    fn l107_adjustment_skips_t_for_multiword_ops() {
        let mut cmd = Command::decode(0);
        cmd.d = 31;
        cmd.s = 24;
        cmd.n = 5;
        cmd.t = 5;
        cmd.apply_l107_adjustment();
        assert_eq!(cmd.n, (5i32 - 20).rem_euclid(108) as u32);
        assert_eq!(cmd.t, 5, "T must be left alone for D=31 S in 24..=27");
    }

    #[test]
    fn l107_adjustment_applies_to_t_for_ordinary_commands() {
        let mut cmd = Command::decode(0);
        cmd.d = 0;
        cmd.n = 5;
        cmd.t = 5;
        cmd.apply_l107_adjustment();
        assert_eq!(cmd.t, (5i32 - 20).rem_euclid(108) as u32);
    }
}
