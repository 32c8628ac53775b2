//! ID (D=25) destination.

use super::normal::{abs_word, destination_value};
use super::source::read_source;
use super::transfer::transfer_driver;
use super::Processor;
use crate::command::Command;
use crate::word::Word;

pub fn run(p: &mut Processor, cmd: Command) {
    transfer_driver(p, cmd.c1, cmd.di, cmd.t, |p| {
        let lb = read_source(p, cmd.s);
        let half = p.drum.l2() as usize;

        match cmd.c {
            0 => {
                p.drum.set_id_reg(half, lb);
                p.drum.set_pn(half, Word::ZERO);
                if half == 0 && !(24..=26).contains(&cmd.s) {
                    p.ip.set(lb.is_negative(), p.drum.word_time() as u32);
                    p.drum.set_id_reg(half, abs_word(lb));
                }
            }
            2 => {
                if half == 0 {
                    p.drum.set_id_reg(0, Word::ZERO);
                    p.drum.set_ar(abs_word(lb));
                } else {
                    p.drum.set_id_reg(1, p.drum.ar());
                    p.drum.set_ar(lb);
                }
            }
            _ => {
                let value = destination_value(p, &cmd, lb);
                p.drum.set_id_reg(half, value);
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn c0_write_clears_matching_pn_half_and_records_ip() {
        let mut p = Processor::new();
        p.drum.set_pn(0, Word::new(0xFF));
        p.drum.write(5, Word::from_sign_magnitude(1, 7));
        let mut cmd = Command::decode(0);
        cmd.d = 25;
        cmd.s = 5;
        cmd.c = 0;
        cmd.t = 1;
        run(&mut p, cmd);
        assert_eq!(p.drum.pn(0), Word::ZERO);
        assert!(p.ip.is_set());
        assert_eq!(p.drum.id_reg(0), Word::from_sign_magnitude(0, 7));
    }

    #[test]
    fn c0_from_register_source_does_not_disturb_ip() {
        let mut p = Processor::new();
        p.ip.set(false, 0);
        p.drum.set_mq(0, Word::from_sign_magnitude(1, 3));
        let mut cmd = Command::decode(0);
        cmd.d = 25;
        cmd.s = crate::drum::MQ;
        cmd.c = 0;
        cmd.t = 1;
        run(&mut p, cmd);
        assert!(!p.ip.is_set());
        assert_eq!(p.drum.id_reg(0), Word::from_sign_magnitude(1, 3));
    }
}
