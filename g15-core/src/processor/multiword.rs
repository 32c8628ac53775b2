//! Multi-word special operations: multiply, divide, shift, normalize.
//! All four are dispatched from D=31 S∈{24..27}; all run as
//! a fixed-count loop over drum word-times rather than through
//! `transfer_driver`, since none of them move a single source→destination
//! value per word-time in the way the transfer engine expects.

use crate::arithmetic::{add_double_even, add_double_odd, complement_double_odd, complement_single};
use crate::command::Command;
use crate::word::{set_bits, Word, WORD_MASK};

use super::Processor;

const MAG_BITS: u32 = 28;
const MAG_TOP: u32 = MAG_BITS - 1;

fn shift_reg_left(w: Word, carry_in: bool) -> (Word, bool) {
    let carry_out = (w.magnitude() >> MAG_TOP) & 1 != 0;
    let new_mag = ((w.magnitude() << 1) | (carry_in as u32)) & ((1 << MAG_BITS) - 1);
    (Word::from_sign_magnitude(w.sign(), new_mag), carry_out)
}

/// D=31 S=24: multiply. Runs `2*T` word-times.
pub fn run_multiply(p: &mut Processor, cmd: Command) {
    if cmd.di == 1 {
        p.drum.wait_until(cmd.t);
    }
    let iterations = 2 * cmd.t;

    let mut mq_shift_carry = (p.drum.mq(0).magnitude() >> MAG_TOP) & 1 != 0;
    let mut pm = false;
    let mut pn_carry = false;
    let mut pn_augend_sign = 0u32;
    let mut pn_addend_sign = 0u32;

    for _ in 0..iterations {
        if p.drum.l2() == 0 {
            pm = (p.drum.mq(1).magnitude() >> MAG_TOP) & 1 != 0;

            let id_even = p.drum.id_reg(0);
            let id_odd = p.drum.id_reg(1);
            let feed_bit = id_odd.magnitude() & 1;
            let new_even_mag = (id_even.magnitude() >> 1) | (feed_bit << MAG_TOP);
            p.drum.set_id_reg(0, Word::from_sign_magnitude(0, new_even_mag));

            let (new_mq_even, carry_out) = shift_reg_left(p.drum.mq(0), mq_shift_carry);
            p.drum.set_mq(0, new_mq_even);
            mq_shift_carry = carry_out;

            if pm {
                let even = add_double_even(p.drum.pn(0), p.drum.id_reg(0));
                p.drum.set_pn(0, even.result);
                pn_carry = even.pn_add_carry;
                pn_augend_sign = even.pn_augend_sign;
                pn_addend_sign = even.pn_addend_sign;
            }
        } else {
            let id_odd = p.drum.id_reg(1);
            let new_odd_mag = id_odd.magnitude() >> 1;
            p.drum
                .set_id_reg(1, Word::from_sign_magnitude(id_odd.sign(), new_odd_mag));

            let (new_mq_odd, carry_out) = shift_reg_left(p.drum.mq(1), mq_shift_carry);
            p.drum.set_mq(1, new_mq_odd);
            mq_shift_carry = carry_out;

            if pm {
                let odd = add_double_odd(
                    p.drum.pn(1),
                    p.drum.id_reg(1),
                    pn_carry,
                    pn_augend_sign,
                    pn_addend_sign,
                    false,
                );
                p.drum.set_pn(1, odd.result);
                let even_word = p.drum.pn(0);
                p.drum
                    .set_pn(0, Word::new((even_word.raw() & !1) | (odd.pn_sign & 1)));
            }
        }
        p.drum.wait_for(1);
    }
}

/// D=31 S=25: restoring shift-add division. Runs `2*T` word-times.
pub fn run_divide(p: &mut Processor, cmd: Command) {
    if cmd.di == 1 {
        p.drum.wait_until(cmd.t);
    }
    let iterations = 2 * cmd.t;

    let mut mq_shift_carry = false;
    let mut q_bit = false;
    let mut r_sign = false;
    let mut pn_carry = false;
    let mut pn_augend_sign = 0u32;
    let mut pn_addend_sign = 0u32;
    let mut pn_shift_carry = false;
    let mut even_dp_sign = 0u32;
    let mut even_dp_carry = false;

    for _ in 0..iterations {
        if p.drum.l2() == 0 {
            let raw = set_bits(p.drum.mq(0).raw(), q_bit as u32, 1..=1);
            p.drum.set_mq(0, Word::new(raw));

            let (new_mq_even, carry_out) = shift_reg_left(p.drum.mq(0), false);
            p.drum.set_mq(0, new_mq_even);
            mq_shift_carry = carry_out;

            // Addend is ID complemented, with sign = ¬rSign (subtract when
            // the running remainder is currently positive).
            let id_even = p.drum.id_reg(0);
            let addend = Word::from_sign_magnitude((!r_sign) as u32, id_even.magnitude());
            let comp = complement_single(addend);
            even_dp_sign = comp.dp_even_sign;
            even_dp_carry = comp.dp_carry;

            let even = add_double_even(p.drum.pn(0), comp.value);
            p.drum.set_pn(0, even.result);
            pn_carry = even.pn_add_carry;
            pn_augend_sign = even.pn_augend_sign;
            pn_addend_sign = even.pn_addend_sign;

            let pn_even = p.drum.pn(0);
            pn_shift_carry = (pn_even.raw() >> 28) & 1 != 0;
            let shifted = (pn_even.raw() << 1) & WORD_MASK;
            p.drum.set_pn(0, Word::new(shifted));
        } else {
            let (new_mq_odd, carry_out) = shift_reg_left(p.drum.mq(1), mq_shift_carry);
            p.drum.set_mq(1, new_mq_odd);
            mq_shift_carry = carry_out;

            let id_odd = p.drum.id_reg(1);
            let comp_odd = complement_double_odd(id_odd, even_dp_sign, even_dp_carry);

            let odd = add_double_odd(
                p.drum.pn(1),
                comp_odd,
                pn_carry,
                pn_augend_sign,
                pn_addend_sign,
                false,
            );
            p.drum.set_pn(1, odd.result);
            r_sign = odd.pn_sign != 0;
            p.fo.set(false, p.drum.word_time() as u32);

            let pn_sign = (p.drum.pn(1).raw() >> 28) & 1;
            let shifted_odd = ((p.drum.pn(1).raw() << 1) | (pn_shift_carry as u32)) & WORD_MASK;
            p.drum.set_pn(1, Word::new(shifted_odd));
            let even_word = p.drum.pn(0);
            p.drum
                .set_pn(0, Word::new((even_word.raw() & !1) | (pn_sign & 1)));

            q_bit = !r_sign;
        }
        p.drum.wait_for(1);
    }

    if mq_shift_carry {
        p.fo.set(true, p.drum.word_time() as u32);
    }

    // Princeton rounding: force MQ-even bit-1 set.
    let raw = set_bits(p.drum.mq(0).raw(), 1, 1..=1);
    p.drum.set_mq(0, Word::new(raw));
}

/// D=31 S=26: shift MQ left / ID right. Runs while `count > 0`; on odd
/// words, if C=0, increments AR and stops early on overflow to 0.
pub fn run_shift(p: &mut Processor, cmd: Command) {
    if cmd.di == 1 {
        p.drum.wait_until(cmd.t);
    }
    let mut count = cmd.n;
    let mut mq_carry = false;

    while count > 0 {
        let (new_mq_even, carry) = shift_reg_left(p.drum.mq(0), mq_carry);
        if p.drum.l2() == 0 {
            p.drum.set_mq(0, new_mq_even);
            mq_carry = carry;
        } else {
            let (new_mq_odd, carry) = shift_reg_left(p.drum.mq(1), mq_carry);
            p.drum.set_mq(1, new_mq_odd);
            mq_carry = carry;

            if cmd.c == 0 {
                let next = add_single_ar_increment(p);
                if next == 0 {
                    p.drum.wait_for(1);
                    break;
                }
            }
        }
        p.drum.wait_for(1);
        count -= 1;
    }
}

fn add_single_ar_increment(p: &mut Processor) -> u32 {
    let sum = crate::arithmetic::add_single(p.drum.ar(), Word::from_sign_magnitude(0, 1), false);
    p.drum.set_ar(sum.result);
    sum.result.magnitude()
}

/// D=31 S=27: normalize MQ. Shifts left until the odd-word high bit is 1 or
/// `count` reaches 0; increments AR on every odd-word shift when C=0.
pub fn run_normalize(p: &mut Processor, cmd: Command) {
    if cmd.di == 1 {
        p.drum.wait_until(cmd.t);
    }
    let mut count = cmd.n;
    let mut mq_carry = false;

    loop {
        if count == 0 {
            break;
        }
        if p.drum.l2() == 0 {
            let (new_mq_even, carry) = shift_reg_left(p.drum.mq(0), mq_carry);
            p.drum.set_mq(0, new_mq_even);
            mq_carry = carry;
        } else {
            let (new_mq_odd, carry) = shift_reg_left(p.drum.mq(1), mq_carry);
            p.drum.set_mq(1, new_mq_odd);
            mq_carry = carry;

            if cmd.c == 0 {
                add_single_ar_increment(p);
            }

            if (new_mq_odd.magnitude() >> MAG_TOP) & 1 != 0 {
                p.drum.wait_for(1);
                break;
            }
            count -= 1;
        }
        p.drum.wait_for(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drum;

    fn cmd_for(s: u32, t: u32, n: u32, c: u32) -> Command {
        let mut cmd = Command::decode(0);
        cmd.d = drum::SPECIAL;
        cmd.s = s;
        cmd.t = t;
        cmd.n = n;
        cmd.c = c;
        cmd.di = 0;
        cmd
    }

    #[test]
    fn divide_sets_princeton_rounding_bit_regardless_of_quotient() {
        let mut p = Processor::new();
        p.drum.set_id_reg(0, Word::ZERO);
        p.drum.set_id_reg(1, Word::ZERO);
        let cmd = cmd_for(25, 2, 0, 1);
        run_divide(&mut p, cmd);
        assert_eq!(p.drum.mq(0).raw() & 0b10, 0b10);
    }

    #[test]
    fn divide_runs_exactly_two_t_word_times() {
        let mut p = Processor::new();
        let start = p.drum.word_time();
        let cmd = cmd_for(25, 4, 0, 1);
        run_divide(&mut p, cmd);
        assert_eq!(p.drum.word_time() - start, 8);
    }

    #[test]
    fn multiply_runs_exactly_two_t_word_times() {
        let mut p = Processor::new();
        let start = p.drum.word_time();
        let cmd = cmd_for(24, 4, 0, 0);
        run_multiply(&mut p, cmd);
        assert_eq!(p.drum.word_time() - start, 8);
    }
}
