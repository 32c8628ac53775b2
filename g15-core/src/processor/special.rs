//! D=31: I/O initiation (S=0..15) and the remaining special operations
//! (S=16..31): halt, bell/switch test, return/mark exit, multiword dispatch,
//! and the handful of test-and-branch commands.

use log::warn;

use super::{multiword, ComputeSwitch, Processor};
use crate::command::Command;
use crate::word::Word;

pub fn run(p: &mut Processor, cmd: Command) {
    match cmd.s {
        0..=15 => crate::io::initiate(p, cmd.s),
        16 => halt(p),
        17 => ring_bell(p, cmd),
        18 => {
            // M20 ∧ ID → output register. MZ is the one-word I/O staging
            // buffer this core treats as the "output register".
            let masked = Word::new(p.drum.read(20).raw() & p.drum.id_reg(0).raw());
            p.drum.set_mz(masked);
        }
        20 => return_exit(p, cmd),
        21 => mark_exit(p),
        22 => {
            let negative = p.drum.ar().is_negative();
            p.cq.set(negative, p.drum.word_time() as u32);
        }
        23 => clear_or_decompose(p, cmd),
        24 => multiword::run_multiply(p, cmd),
        25 => multiword::run_divide(p, cmd),
        26 => multiword::run_shift(p, cmd),
        27 => multiword::run_normalize(p, cmd),
        28 => test_io_ready(p, cmd),
        29 => test_reset_fo(p, cmd),
        31 => misc(p, cmd),
        other => warn!("unimplemented D=31 S={other}"),
    }
}

fn halt(p: &mut Processor) {
    p.ch.set(true, p.drum.word_time() as u32);
}

fn ring_bell(p: &mut Processor, cmd: Command) {
    // The physical bell is out of scope. C=1 tests the PUNCH switch and
    // latches the result into CQ, the same way test_io_ready/test_reset_fo
    // report their test into CQ; C=0 just rings the bell, no data effect.
    if cmd.c == 1 {
        let punch_switch_on = p.io.punch_switch != 0;
        p.cq.set(punch_switch_on, p.drum.word_time() as u32);
    }
}

/// S=20: return exit, with mark/N arbitration per Tech Memo 4/41.
fn return_exit(p: &mut Processor, cmd: Command) {
    let transfer_end = p.drum.location();
    let n = cmd.n;
    let mark = p.mark;

    let force_mark = (p.compute_switch == ComputeSwitch::Bp && cmd.bp == 1) || p.single_stepping;

    let take_n = !force_mark
        && (transfer_end == n || (transfer_end <= n && n <= mark));

    if take_n {
        p.drum.wait_until(n);
    } else {
        p.drum.wait_until(mark);
    }

    // Breakpoint halt is deferred to the next command for Return Exit
    // specifically; the step-gate records that the command about to be
    // fetched should halt after it executes.
    if p.compute_switch == ComputeSwitch::Bp && cmd.bp == 1 {
        p.cz.set(true, p.drum.word_time() as u32);
    }
}

/// S=21: mark exit. Stores the current L (or T, when deferred) into the
/// mark register / CM bits 1..12.
fn mark_exit(p: &mut Processor) {
    p.mark = p.drum.location();
    p.drum.set_cm(Word::from_sign_magnitude(0, p.mark));
}

fn clear_or_decompose(p: &mut Processor, cmd: Command) {
    if cmd.c == 0 {
        p.drum.set_mq(0, Word::ZERO);
        p.drum.set_mq(1, Word::ZERO);
        p.drum.set_id_reg(0, Word::ZERO);
        p.drum.set_id_reg(1, Word::ZERO);
        p.drum.set_pn(0, Word::ZERO);
        p.drum.set_pn(1, Word::ZERO);
        p.ip.set(false, p.drum.word_time() as u32);
    } else {
        // PN ∧ M2 → ID, PN ∧ ¬M2 → PN. M2 names line 20 by the same
        // combined-source convention the drum-lines table uses elsewhere.
        let m2 = p.drum.read(20).raw();
        for half in 0..2 {
            let pn = p.drum.pn(half).raw();
            p.drum.set_id_reg(half, Word::new(pn & m2));
            p.drum.set_pn(half, Word::new(pn & !m2));
        }
    }
}

fn test_io_ready(p: &mut Processor, cmd: Command) {
    // S=28: "test I/O ready and three no-op variants" — C selects which.
    if cmd.c == 0 {
        let ready = !p.io.busy();
        p.cq.set(ready, p.drum.word_time() as u32);
    }
}

fn test_reset_fo(p: &mut Processor, cmd: Command) {
    p.cq.set(p.fo.is_set(), p.drum.word_time() as u32);
    if cmd.c != 0 {
        p.fo.set(false, p.drum.word_time() as u32);
    }
}

fn misc(p: &mut Processor, cmd: Command) {
    match cmd.c {
        0 => p.cg.set(true, p.drum.word_time() as u32),
        1 => {
            let n = p.drum.location() as usize;
            let merged = p.drum.read(18).raw() | p.drum.cn(n).raw();
            p.drum.write(18, Word::new(merged));
        }
        2 => {
            let merged = p.drum.read(18).raw() | p.drum.read(20).raw();
            p.drum.write(18, Word::new(merged));
        }
        _ => warn!("unimplemented D=31 S=31 C={}", cmd.c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drum;

    fn cmd_for(s: u32) -> Command {
        let mut cmd = Command::decode(0);
        cmd.d = drum::SPECIAL;
        cmd.s = s;
        cmd
    }

    #[test]
    fn halt_sets_ch() {
        let mut p = Processor::new();
        run(&mut p, cmd_for(16));
        assert!(p.ch.is_set());
    }

    #[test]
    fn ring_bell_c1_latches_punch_switch_state_into_cq() {
        let mut p = Processor::new();
        p.io.punch_switch = 1;
        let mut cmd = cmd_for(17);
        cmd.c = 1;
        run(&mut p, cmd);
        assert!(p.cq.is_set());

        p.io.punch_switch = 0;
        run(&mut p, cmd_for(17)); // C=0: bell only, no CQ change
        assert!(p.cq.is_set(), "C=0 doesn't touch CQ");
    }

    #[test]
    fn test_sign_of_ar_sets_cq_for_negative() {
        let mut p = Processor::new();
        p.drum.set_ar(Word::from_sign_magnitude(1, 5));
        run(&mut p, cmd_for(22));
        assert!(p.cq.is_set());
    }

    #[test]
    fn clear_zeroes_mq_id_pn_and_ip() {
        let mut p = Processor::new();
        p.drum.set_mq(0, Word::new(7));
        p.ip.set(true, 0);
        run(&mut p, cmd_for(23));
        assert_eq!(p.drum.mq(0), Word::ZERO);
        assert!(!p.ip.is_set());
    }

    #[test]
    fn test_reset_fo_clears_latch_when_c_nonzero() {
        let mut p = Processor::new();
        p.fo.set(true, 0);
        let mut cmd = cmd_for(29);
        cmd.c = 1;
        run(&mut p, cmd);
        assert!(p.cq.is_set());
        assert!(!p.fo.is_set());
    }

    #[test]
    fn mark_exit_then_return_exit_prefers_n_in_range() {
        // transfer-end <= N <= mark selects N over the mark itself.
        let mut p = Processor::new();
        p.drum.wait_for(50);
        run(&mut p, cmd_for(21)); // mark = 50
        p.drum.wait_for(0);
        let mut cmd = cmd_for(20);
        cmd.n = 30;
        run(&mut p, cmd);
        assert_eq!(p.drum.location(), 30);
    }
}
