//! MQ (D=24), PN (D=26) and Add-to-PN (D=30) destinations.

use super::normal::{abs_word, destination_value};
use super::source::read_source;
use super::transfer::transfer_driver;
use super::Processor;
use crate::arithmetic::{add_double_even, add_double_odd, complement_single};
use crate::command::Command;
use crate::drum;
use crate::word::Word;

/// D=24: MQ.
pub fn run_mq(p: &mut Processor, cmd: Command) {
    transfer_driver(p, cmd.c1, cmd.di, cmd.t, |p| {
        let lb = read_source(p, cmd.s);
        let half = p.drum.l2() as usize;

        match cmd.c {
            0 => {
                if matches!(cmd.s, drum::ID | drum::MQ) {
                    let value = if half == 0 { abs_word(lb) } else { lb };
                    p.drum.set_mq(half, value);
                } else {
                    if half == 0 && lb.is_negative() {
                        let flipped = !p.ip.is_set();
                        p.ip.set(flipped, p.drum.word_time() as u32);
                    }
                    p.drum.set_mq(half, lb);
                }
            }
            2 => {
                if half == 0 {
                    p.drum.set_mq(0, Word::ZERO);
                    p.drum.set_ar(abs_word(lb));
                } else {
                    p.drum.set_mq(1, p.drum.ar());
                    p.drum.set_ar(lb);
                }
            }
            1 | 3 => {
                let value = destination_value(p, &cmd, lb);
                p.drum.set_mq(half, value);
            }
            _ => unreachable!("C is a 2-bit field"),
        }
    });
}

/// D=26: PN.
pub fn run_pn(p: &mut Processor, cmd: Command) {
    transfer_driver(p, cmd.c1, cmd.di, cmd.t, |p| {
        let half = p.drum.l2() as usize;

        match cmd.c {
            0 => {
                let lb = read_source(p, cmd.s);
                if cmd.s == drum::PN {
                    let value = complement_single(lb).value;
                    p.drum.set_pn(half, value);
                } else {
                    if half == 0 && lb.is_negative() {
                        let flipped = !p.ip.is_set();
                        p.ip.set(flipped, p.drum.word_time() as u32);
                    }
                    p.drum.set_pn(half, lb);
                }
            }
            2 => {
                let lb = read_source(p, cmd.s);
                if half == 0 {
                    p.drum.set_pn(0, Word::ZERO);
                    p.drum.set_ar(abs_word(lb));
                } else {
                    p.drum.set_pn(1, p.drum.ar());
                    p.drum.set_ar(lb);
                }
            }
            1 | 3 => add_to_pn_step(p, &cmd, half),
            _ => unreachable!("C is a 2-bit field"),
        }
    });
}

/// D=30: Add-to-PN. Always the double-precision add pipeline, regardless of
/// C — the characteristic field is only consulted by the D=26 delegation
/// path above.
pub fn run_add_to_pn(p: &mut Processor, cmd: Command) {
    transfer_driver(p, cmd.c1, cmd.di, cmd.t, |p| {
        let half = p.drum.l2() as usize;
        add_to_pn_step(p, &cmd, half);
    });
}

/// One word-time of the double-precision add-to-PN pipeline, shared by
/// D=30's own destination and D=26 C∈{1,3}'s delegation.
fn add_to_pn_step(p: &mut Processor, cmd: &Command, half: usize) {
    let src = read_source(p, cmd.s);
    let wt = p.drum.word_time() as u32;

    if half == 0 {
        let even = add_double_even(p.drum.pn(0), src);
        p.drum.set_pn(0, even.result);
        p.scratch.pn_add_carry = even.pn_add_carry;
        p.scratch.pn_augend_sign = even.pn_augend_sign;
        p.scratch.pn_addend_sign = even.pn_addend_sign;
    } else {
        let suppress = src.is_minus_zero();
        let odd = add_double_odd(
            p.drum.pn(1),
            src,
            p.scratch.pn_add_carry,
            p.scratch.pn_augend_sign,
            p.scratch.pn_addend_sign,
            suppress,
        );
        p.drum.set_pn(1, odd.result);
        if odd.overflow {
            p.fo.set(true, wt);
        }
        let even_word = p.drum.pn(0);
        p.drum
            .set_pn(0, Word::new((even_word.raw() & !1) | (odd.pn_sign & 1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mq_strip_sign_rule_for_id_source_on_even_word() {
        let mut p = Processor::new();
        p.drum.set_id_reg(0, Word::from_sign_magnitude(1, 9));
        let mut cmd = Command::decode(0);
        cmd.d = drum::MQ;
        cmd.s = drum::ID;
        cmd.c = 0;
        cmd.t = 1;
        run_mq(&mut p, cmd);
        assert_eq!(p.drum.mq(0), Word::from_sign_magnitude(0, 9));
    }

    #[test]
    fn add_to_pn_accumulates_across_even_odd_pair() {
        let mut p = Processor::new();
        p.drum.write(5, Word::new(3));
        let mut cmd = Command::decode(0);
        cmd.d = drum::ADD_TO_PN;
        cmd.s = 5;
        cmd.c = 0;
        cmd.t = 2;
        run_add_to_pn(&mut p, cmd);
        assert_eq!(p.drum.pn(0).raw() & !1, 3);
    }
}
