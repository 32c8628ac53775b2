//! Resolves a source field `S` to the word it names. What 24..31 mean as
//! *sources* differs from what they mean as destinations.

use super::Processor;
use crate::drum;
use crate::word::Word;

/// Reads the word named by `s` at the drum's current location/parity.
/// `24..26` (MQ/ID/PN) read whichever half the current `L2` selects;
/// `27/29/30/31` are the bitwise-combined pseudo-sources.
pub fn read_source(p: &Processor, s: u32) -> Word {
    let half = p.drum.l2() as usize;
    match s {
        0..=23 => p.drum.read(s),
        drum::MQ => p.drum.mq(half),
        drum::ID => p.drum.id_reg(half),
        drum::PN => p.drum.pn(half),
        drum::TEST => {
            // (20 ∧ 21) ∨ (¬20 ∧ AR)
            let l20 = p.drum.read(20).raw();
            let l21 = p.drum.read(21).raw();
            let ar = p.drum.ar().raw();
            Word::new((l20 & l21) | (!l20 & ar))
        }
        drum::ADD_TO_AR => {
            // 20 ∧ ID (historically labeled "IR"; ID is the only register
            // that abbreviation plausibly refers to in context).
            let l20 = p.drum.read(20).raw();
            let id = p.drum.id_reg(half).raw();
            Word::new(l20 & id)
        }
        drum::ADD_TO_PN => {
            // ¬20 ∧ 21
            let l20 = p.drum.read(20).raw();
            let l21 = p.drum.read(21).raw();
            Word::new(!l20 & l21)
        }
        drum::SPECIAL => {
            // 20 ∧ 21
            let l20 = p.drum.read(20).raw();
            let l21 = p.drum.read(21).raw();
            Word::new(l20 & l21)
        }
        _ => unreachable!("S is a 5-bit field, 0..=31"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_line_source_reads_through() {
        let mut p = Processor::new();
        p.drum.write(5, Word::new(42));
        assert_eq!(read_source(&p, 5), Word::new(42));
    }

    #[test]
    fn ar_add_source_is_bitwise_and_with_line20() {
        let mut p = Processor::new();
        p.drum.write(20, Word::new(0b1100));
        p.drum.set_id_reg(0, Word::new(0b1010));
        assert_eq!(read_source(&p, drum::ADD_TO_AR), Word::new(0b1000));
    }
}
