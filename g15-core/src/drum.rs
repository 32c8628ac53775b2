//! The simulated rotating store: recirculating lines, the small registers,
//! and the word-time clock everything else suspends on. A single owned
//! struct rather than a flat byte array, since the drum's line layout is
//! heterogeneous (long lines, short lines, registers, buffers) rather than
//! a uniform address space.

use crate::error::G15Error;
use crate::word::Word;

/// Long recirculating lines: ids 0..=19, 108 words each.
pub const LONG_LINE_COUNT: usize = 20;
pub const LONG_LINE_WORDS: usize = 108;
/// Short "fast" lines: ids 20..=23, 4 words each.
pub const SHORT_LINE_COUNT: usize = 4;
pub const SHORT_LINE_WORDS: usize = 4;

/// Addresses 24..=31 name registers or pseudo-lines rather than drum lines;
/// `Drum::read`/`write` only accept 0..=23. Everything at or above 24 is
/// addressed through the dedicated register accessors instead.
pub const MQ: u32 = 24;
pub const ID: u32 = 25;
pub const PN: u32 = 26;
pub const TEST: u32 = 27;
pub const AR: u32 = 28;
pub const ADD_TO_AR: u32 = 29;
pub const ADD_TO_PN: u32 = 30;
pub const SPECIAL: u32 = 31;

/// The rotating store plus the word-time clock that drives every other
/// component. Owns 20 long lines, 4 short lines, the three two-word
/// registers, the one-word AR/CM, the MZ I/O buffer and the CN number track.
pub struct Drum {
    long_lines: [[Word; LONG_LINE_WORDS]; LONG_LINE_COUNT],
    short_lines: [[Word; SHORT_LINE_WORDS]; SHORT_LINE_COUNT],
    mq: [Word; 2],
    id: [Word; 2],
    pn: [Word; 2],
    ar: Word,
    cm: Word,
    mz: Word,
    cn: [Word; LONG_LINE_WORDS],

    /// Word-time counter, monotonically increasing; `location()` is this
    /// value mod 108.
    word_time: u64,
    /// True while a device operation holds the word-time slot; the
    /// processor may not advance a new command fetch while this is set.
    io_active: bool,
}

impl Drum {
    pub fn new() -> Self {
        Drum {
            long_lines: [[Word::ZERO; LONG_LINE_WORDS]; LONG_LINE_COUNT],
            short_lines: [[Word::ZERO; SHORT_LINE_WORDS]; SHORT_LINE_COUNT],
            mq: [Word::ZERO; 2],
            id: [Word::ZERO; 2],
            pn: [Word::ZERO; 2],
            ar: Word::ZERO,
            cm: Word::ZERO,
            mz: Word::ZERO,
            cn: [Word::ZERO; LONG_LINE_WORDS],
            word_time: 0,
            io_active: false,
        }
    }

    /// Current drum location, `L`, always in 0..108.
    #[inline]
    pub fn location(&self) -> u32 {
        (self.word_time % LONG_LINE_WORDS as u64) as u32
    }

    /// `L2`: even/odd parity of the current location.
    #[inline]
    pub fn l2(&self) -> u32 {
        self.location() & 1
    }

    #[inline]
    pub fn word_time(&self) -> u64 {
        self.word_time
    }

    #[inline]
    pub fn io_active(&self) -> bool {
        self.io_active
    }

    /// Marks a device action as holding the word-time slot. Every device
    /// action that touches the drum brackets itself with this and
    /// [`Drum::io_stop`].
    pub fn io_start(&mut self) {
        self.io_active = true;
    }

    pub fn io_stop(&mut self) {
        self.io_active = false;
    }

    fn line_len(line: u32) -> usize {
        if (line as usize) < LONG_LINE_COUNT {
            LONG_LINE_WORDS
        } else {
            SHORT_LINE_WORDS
        }
    }

    /// Reads the word at the drum's current location on `line` (0..=23).
    pub fn read(&self, line: u32) -> Word {
        let len = Self::line_len(line);
        let slot = self.location() as usize % len;
        if (line as usize) < LONG_LINE_COUNT {
            self.long_lines[line as usize][slot]
        } else {
            self.short_lines[line as usize - LONG_LINE_COUNT][slot]
        }
    }

    /// Writes `w` to `line` at the drum's current location, replacing the
    /// addressed slot atomically.
    pub fn write(&mut self, line: u32, w: Word) {
        let len = Self::line_len(line);
        let slot = self.location() as usize % len;
        if (line as usize) < LONG_LINE_COUNT {
            self.long_lines[line as usize][slot] = w;
        } else {
            self.short_lines[line as usize - LONG_LINE_COUNT][slot] = w;
        }
    }

    /// Advances the word-time clock by exactly `n` word-times, wrapping `L`
    /// at 108. The only primitive the rest of the core uses to let time
    /// pass; everything suspends here.
    pub fn wait_for(&mut self, n: u32) {
        self.word_time += n as u64;
    }

    /// Advances by `(target - L) mod 108`. A zero delta means "exactly one
    /// full revolution" — callers that want "already there, do nothing"
    /// must check `location() == target` themselves first.
    pub fn wait_until(&mut self, target: u32) {
        let delta = (target as i64 - self.location() as i64).rem_euclid(LONG_LINE_WORDS as i64);
        self.wait_for(delta as u32);
    }

    // --- Two-word register access -----------------------------------

    #[inline]
    pub fn mq(&self, half: usize) -> Word {
        self.mq[half]
    }
    #[inline]
    pub fn set_mq(&mut self, half: usize, w: Word) {
        self.mq[half] = w;
    }
    #[inline]
    pub fn id_reg(&self, half: usize) -> Word {
        self.id[half]
    }
    #[inline]
    pub fn set_id_reg(&mut self, half: usize, w: Word) {
        self.id[half] = w;
    }
    #[inline]
    pub fn pn(&self, half: usize) -> Word {
        self.pn[half]
    }
    #[inline]
    pub fn set_pn(&mut self, half: usize, w: Word) {
        self.pn[half] = w;
    }

    #[inline]
    pub fn ar(&self) -> Word {
        self.ar
    }
    #[inline]
    pub fn set_ar(&mut self, w: Word) {
        self.ar = w;
    }

    #[inline]
    pub fn cm(&self) -> Word {
        self.cm
    }
    #[inline]
    pub fn set_cm(&mut self, w: Word) {
        self.cm = w;
    }

    #[inline]
    pub fn mz(&self) -> Word {
        self.mz
    }
    #[inline]
    pub fn set_mz(&mut self, w: Word) {
        self.mz = w;
    }

    /// CN is addressed with the same 108→128 adjustment logic the fetch
    /// stage applies to N/T at the long-line wrap; callers pass the already
    /// -adjusted index.
    #[inline]
    pub fn cn(&self, index: usize) -> Word {
        self.cn[index % LONG_LINE_WORDS]
    }
    #[inline]
    pub fn set_cn(&mut self, index: usize, w: Word) {
        self.cn[index % LONG_LINE_WORDS] = w;
    }

    /// Overwrites the full CN table, e.g. from a reset-time paper-tape
    /// block load. CN persists across resets otherwise. `words` must carry
    /// exactly [`LONG_LINE_WORDS`] entries — this is the one place a
    /// malformed seed block is a caller bug worth reporting rather than a
    /// runtime condition to latch and log.
    pub fn load_cn(&mut self, words: &[Word]) -> Result<(), G15Error> {
        if words.len() != LONG_LINE_WORDS {
            return Err(G15Error::InvalidCnBlock {
                expected: LONG_LINE_WORDS,
                actual: words.len(),
            });
        }
        self.cn.copy_from_slice(words);
        Ok(())
    }

    /// Precesses `line`'s current word by `n` bits: extracts the low `n`
    /// bits, shifts the rest of the word right by `n` (zero-filling from
    /// the top), writes the shifted word back, and returns the extracted
    /// bits. The primitive the I/O format pipeline drives MZ and line 23/19
    /// with, a bit at a time.
    pub fn precess(&mut self, line: u32, n: u32) -> u32 {
        let w = self.read(line);
        let mask = (1u32 << n) - 1;
        let extracted = w.raw() & mask;
        let shifted = w.raw() >> n;
        self.write(line, Word::new(shifted));
        extracted
    }

    /// Precesses the MZ buffer itself by `n` bits, the same way
    /// [`Drum::precess`] does for an addressable line.
    pub fn precess_mz(&mut self, n: u32) -> u32 {
        let mask = (1u32 << n) - 1;
        let extracted = self.mz.raw() & mask;
        self.mz = Word::new(self.mz.raw() >> n);
        extracted
    }

    /// The input-side mirror of [`Drum::precess`]: shifts `line`'s word left
    /// by `n` bits and fills the vacated low bits with `bits`, the direction
    /// an incoming device code enters the drum from.
    pub fn precess_in(&mut self, line: u32, n: u32, bits: u32) {
        let w = self.read(line);
        let mask = (1u32 << n) - 1;
        let shifted = (w.raw() << n) | (bits & mask);
        self.write(line, Word::new(shifted));
    }

    /// The input-side mirror of [`Drum::precess_mz`].
    pub fn precess_mz_in(&mut self, n: u32, bits: u32) {
        let mask = (1u32 << n) - 1;
        self.mz = Word::new((self.mz.raw() << n) | (bits & mask));
    }

    /// Copies out CN as a serializable snapshot, for a host to persist
    /// across sessions: CN is the one part of the drum meant to survive a
    /// reset.
    #[cfg(feature = "persistence")]
    pub fn cn_snapshot(&self) -> CnSnapshot {
        CnSnapshot {
            words: self.cn.iter().map(|w| w.raw()).collect(),
        }
    }

    #[cfg(feature = "persistence")]
    pub fn restore_cn(&mut self, snapshot: &CnSnapshot) -> Result<(), G15Error> {
        let words: Vec<Word> = snapshot.words.iter().map(|&raw| Word::new(raw)).collect();
        self.load_cn(&words)
    }

    /// A save-state of the whole drum — every line, register, and the
    /// word-time clock — for a host implementing session save/restore.
    #[cfg(feature = "persistence")]
    pub fn full_snapshot(&self) -> FullSnapshot {
        FullSnapshot {
            long_lines: self
                .long_lines
                .iter()
                .map(|line| line.iter().map(|w| w.raw()).collect())
                .collect(),
            short_lines: self
                .short_lines
                .iter()
                .map(|line| line.iter().map(|w| w.raw()).collect())
                .collect(),
            mq: [self.mq[0].raw(), self.mq[1].raw()],
            id: [self.id[0].raw(), self.id[1].raw()],
            pn: [self.pn[0].raw(), self.pn[1].raw()],
            ar: self.ar.raw(),
            cm: self.cm.raw(),
            mz: self.mz.raw(),
            cn: self.cn.iter().map(|w| w.raw()).collect(),
            word_time: self.word_time,
        }
    }

    #[cfg(feature = "persistence")]
    pub fn restore_full_snapshot(&mut self, snapshot: &FullSnapshot) -> Result<(), G15Error> {
        if snapshot.long_lines.len() != LONG_LINE_COUNT
            || snapshot.short_lines.len() != SHORT_LINE_COUNT
            || snapshot.cn.len() != LONG_LINE_WORDS
        {
            return Err(G15Error::InvalidCnBlock {
                expected: LONG_LINE_WORDS,
                actual: snapshot.cn.len(),
            });
        }
        for (line, words) in self.long_lines.iter_mut().zip(&snapshot.long_lines) {
            for (slot, &raw) in line.iter_mut().zip(words) {
                *slot = Word::new(raw);
            }
        }
        for (line, words) in self.short_lines.iter_mut().zip(&snapshot.short_lines) {
            for (slot, &raw) in line.iter_mut().zip(words) {
                *slot = Word::new(raw);
            }
        }
        self.mq = [Word::new(snapshot.mq[0]), Word::new(snapshot.mq[1])];
        self.id = [Word::new(snapshot.id[0]), Word::new(snapshot.id[1])];
        self.pn = [Word::new(snapshot.pn[0]), Word::new(snapshot.pn[1])];
        self.ar = Word::new(snapshot.ar);
        self.cm = Word::new(snapshot.cm);
        self.mz = Word::new(snapshot.mz);
        for (slot, &raw) in self.cn.iter_mut().zip(&snapshot.cn) {
            *slot = Word::new(raw);
        }
        self.word_time = snapshot.word_time;
        Ok(())
    }
}

/// Serializable copy of the number track, for cross-session persistence.
#[cfg(feature = "persistence")]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CnSnapshot {
    words: Vec<u32>,
}

/// Serializable copy of the entire drum, for full session save/restore.
#[cfg(feature = "persistence")]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FullSnapshot {
    long_lines: Vec<Vec<u32>>,
    short_lines: Vec<Vec<u32>>,
    mq: [u32; 2],
    id: [u32; 2],
    pn: [u32; 2],
    ar: u32,
    cm: u32,
    mz: u32,
    cn: Vec<u32>,
    word_time: u64,
}

impl Default for Drum {
    fn default() -> Self {
        Self::new()
    }
}
