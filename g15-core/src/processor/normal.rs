//! Normal-line (D=0..23), TEST (D=27), AR (D=28) and Add-to-AR (D=29)
//! destinations.

use super::source::read_source;
use super::transfer::transfer_driver;
use super::Processor;
use crate::arithmetic::{add_single, complement_single};
use crate::command::Command;
use crate::word::Word;

pub(super) fn abs_word(w: Word) -> Word {
    Word::from_sign_magnitude(0, w.magnitude())
}

/// Sign-flip-then-complement, the SU transform (C=3, CS=0).
pub(super) fn sign_flip_and_complement(w: Word) -> Word {
    complement_single(Word::from_sign_magnitude(w.sign() ^ 1, w.magnitude())).value
}

/// What C turns a source word `lb` into on its way to a normal-line
/// destination. TVA/AVA (C∈{2,3} with CS set) instead read the *current*
/// AR value — callers must compute this before staging `lb` into AR.
pub(super) fn destination_value(p: &Processor, cmd: &Command, lb: Word) -> Word {
    match cmd.c {
        0 => lb,
        1 => complement_single(lb).value,
        2 => {
            if cmd.cs {
                p.drum.ar()
            } else {
                abs_word(lb)
            }
        }
        3 => {
            if cmd.cs {
                p.drum.ar()
            } else {
                sign_flip_and_complement(lb)
            }
        }
        _ => unreachable!("C is a 2-bit field"),
    }
}

/// Stages `lb` into AR when the characteristic is via-AR (CS=1, C∈{2,3}).
fn stage_into_ar(p: &mut Processor, cmd: &Command, lb: Word) {
    if !cmd.cs {
        return;
    }
    match cmd.c {
        2 => p.drum.set_ar(lb),
        3 => p.drum.set_ar(sign_flip_and_complement(lb)),
        _ => {}
    }
}

/// D=0..23: ordinary line-to-line transfer.
pub fn run(p: &mut Processor, cmd: Command) {
    transfer_driver(p, cmd.c1, cmd.di, cmd.t, |p| {
        let lb = read_source(p, cmd.s);
        let value = destination_value(p, &cmd, lb);
        p.drum.write(cmd.d, value);
        stage_into_ar(p, &cmd, lb);
    });
}

/// D=27: TEST. Same LB computation as a normal line, but instead of writing
/// anywhere it sets CQ when LB is nonzero (−0 counts as nonzero: its raw
/// encoding is 1, not 0).
pub fn run_test(p: &mut Processor, cmd: Command) {
    transfer_driver(p, cmd.c1, cmd.di, cmd.t, |p| {
        let lb = read_source(p, cmd.s);
        let value = destination_value(p, &cmd, lb);
        if !value.is_zero() {
            p.cq.set(true, p.drum.word_time() as u32);
        }
    });
}

/// D=28: AR. TR always lands through `add_single(0, lb, ...)` so that a
/// literal −0 never sticks in AR.
pub fn run_ar(p: &mut Processor, cmd: Command) {
    transfer_driver(p, cmd.c1, cmd.di, cmd.t, |p| {
        let lb = read_source(p, cmd.s);
        let value = destination_value(p, &cmd, lb);
        let sum = add_single(Word::ZERO, value, value.is_minus_zero());
        p.drum.set_ar(sum.result);
    });
}

/// D=29: Add-to-AR. Computes IB exactly like a normal-line LB, adds it to
/// the current AR, latches FO on overflow.
pub fn run_add_to_ar(p: &mut Processor, cmd: Command) {
    transfer_driver(p, cmd.c1, cmd.di, cmd.t, |p| {
        let lb = read_source(p, cmd.s);
        let ib = destination_value(p, &cmd, lb);
        let a = p.drum.ar();
        let sum = add_single(a, ib, ib.is_minus_zero());
        p.drum.set_ar(sum.result);
        if sum.overflow {
            p.fo.set(true, p.drum.word_time() as u32);
        }
        stage_into_ar(p, &cmd, lb);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;

    fn immediate_single(d: u32, s: u32, c: u32, t: u32) -> Command {
        let mut cmd = Command::decode(0);
        cmd.d = d;
        cmd.s = s;
        cmd.c = c;
        cmd.t = t;
        cmd.di = 0;
        cmd
    }

    #[test]
    fn load_ar_with_plus_one() {
        // line 0 word 91 = (1<<1)|0, DI=1 T=91 N=1 C=1 S=0 D=28.
        // After the load, AR == 0x00000002.
        let mut p = Processor::new();
        p.drum.wait_for(91);
        p.drum.write(0, Word::new((1 << 1) | 0));
        p.drum.wait_for(0); // back at L=91 for the fetch-free direct test
        let mut cmd = Command::decode(0);
        cmd.d = 28;
        cmd.s = 0;
        cmd.c = 1;
        cmd.di = 1;
        cmd.t = 91;
        cmd.n = 1;
        run_ar(&mut p, cmd);
        assert_eq!(p.drum.ar().raw(), 0x0000_0002);
    }

    #[test]
    fn test_destination_sets_cq_on_nonzero_source() {
        let mut p = Processor::new();
        p.drum.write(5, Word::new(4));
        let cmd = immediate_single(27, 5, 0, 1);
        run_test(&mut p, cmd);
        assert!(p.cq.is_set());
    }

    #[test]
    fn test_destination_leaves_cq_clear_on_zero_source() {
        let mut p = Processor::new();
        let cmd = immediate_single(27, 5, 0, 1);
        run_test(&mut p, cmd);
        assert!(!p.cq.is_set());
    }
}
