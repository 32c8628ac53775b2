//! Snapshot coverage for format-directed output on an all-zero line.
//!
//! `io::format::run`'s inline tests already assert this exact three-code
//! sequence with `assert_eq!`; this snapshot pins the same sequence so a
//! future change to the format table shows up as a diff against a
//! committed `.snap` file rather than a silent pass/fail.

use g15_core::io::format;
use g15_core::word::Word;
use g15_core::Processor;

#[test]
fn all_zero_line_19_output_sequence() {
    let mut p = Processor::new();
    p.as_.set(true, 0);
    p.drum.write(19, Word::ZERO);
    p.drum.set_mz(Word::ZERO);

    let codes = format::run(&mut p, 19, true);
    insta::assert_debug_snapshot!(codes);
}
