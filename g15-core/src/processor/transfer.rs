//! TR (transfer) state: dispatch on destination, and the shared
//! `transfer_driver` timing loop every destination family runs inside.

use log::warn;

use super::{id_reg, mq_pn, multiword, normal, special, Processor, TransferScratch};
use crate::drum;

/// Entry point for the TR state: clears per-command scratch, dispatches on
/// `D`, then flips TR→RC.
pub fn dispatch(p: &mut Processor) {
    let cmd = p.command.expect("dispatch called without a fetched command");
    p.scratch = TransferScratch::default();

    match cmd.d {
        0..=23 => normal::run(p, cmd),
        drum::TEST => normal::run_test(p, cmd),
        drum::ID => id_reg::run(p, cmd),
        drum::MQ => mq_pn::run_mq(p, cmd),
        drum::PN => mq_pn::run_pn(p, cmd),
        drum::AR => super::normal::run_ar(p, cmd),
        drum::ADD_TO_AR => super::normal::run_add_to_ar(p, cmd),
        drum::ADD_TO_PN => mq_pn::run_add_to_pn(p, cmd),
        drum::SPECIAL => special::run(p, cmd),
        _ => unreachable!("D is a 5-bit field, 0..=31"),
    }

    p.tr.set(false, p.drum.word_time() as u32);
    p.rc.set(true, p.drum.word_time() as u32);
}

/// Runs `count` word-times of `transform`, honoring DI/T timing: an
/// immediate (DI=0) transfer runs once per word-time until the drum reaches
/// T, a deferred (DI=1) transfer waits until T first and then runs once (or
/// twice, for a double-precision transfer starting on an even word).
/// `transform` performs one word-time of work and is called once per
/// iteration, with `wait_for(1)` between calls.
pub fn transfer_driver(p: &mut Processor, c1: u32, di: u32, t: u32, mut transform: impl FnMut(&mut Processor)) {
    if p.drum.l2() == 1 && c1 == 1 {
        warn!("DP transfer starting on ODD word");
    }

    let count = if di == 1 {
        p.drum.wait_until(t);
        if c1 == 1 && p.drum.l2() == 0 {
            2
        } else {
            1
        }
    } else {
        let delta = (t as i32 - p.drum.location() as i32).rem_euclid(drum::LONG_LINE_WORDS as i32);
        if delta == 0 {
            drum::LONG_LINE_WORDS as u32
        } else {
            delta as u32
        }
    };

    for _ in 0..count {
        transform(p);
        p.drum.wait_for(1);
    }
}
