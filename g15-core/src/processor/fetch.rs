//! RC (read-command) state.

use log::trace;

use super::Processor;
use crate::command::Command;

/// Reads and decodes one command word, advancing the drum past it.
///
/// Order of operations follows the prose exactly: optional test-skip delay,
/// optional next-from-AR substitution, decode, legacy L=107 adjustment,
/// state flip RC→TR, then the 1- or 2-word-time advance for the command
/// word itself.
pub fn read_command(p: &mut Processor) {
    if p.cq.is_set() {
        // Test-skipped: burn one extra word-time before fetching.
        p.drum.wait_for(1);
        p.cq.set(false, p.drum.word_time() as u32);
    }

    let raw = if p.cg.is_set() {
        p.cg.set(false, p.drum.word_time() as u32);
        p.drum.ar().raw()
    } else {
        p.drum.read(p.command_line).raw()
    };

    let mut cmd = Command::decode(raw);

    if p.drum.location() == 107 {
        cmd.apply_l107_adjustment();
    }

    trace!(
        "fetch: L={} raw={:#010x} d={} s={} c={} di={} t={} n={}",
        p.drum.location(),
        raw,
        cmd.d,
        cmd.s,
        cmd.c,
        cmd.di,
        cmd.t,
        cmd.n
    );

    p.command = Some(cmd);
    p.rc.set(false, p.drum.word_time() as u32);
    p.tr.set(true, p.drum.word_time() as u32);

    p.drum.wait_for(if cmd.di == 1 { 2 } else { 1 });
}
