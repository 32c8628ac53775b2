//! Named flip-flops and small registers carrying processor micro-state.
//!
//! Every flip-flop optionally reports its transitions to a lamp observer —
//! the front-panel lamp-intensity averaging is out of scope for this crate,
//! but the hook it needs is cheap to provide. The observer is held as a
//! `Weak` reference: nothing here owns the clock or the lamp panel, breaking
//! the cycle that a strong reference would create.

use std::rc::Weak;

/// Receives flip-flop/register transitions for lamp-intensity averaging.
/// Implemented by the (out-of-scope) front-panel UI; the core never calls
/// anything on it beyond `observe`.
pub trait LampObserver {
    fn observe(&self, name: &'static str, value: u32, word_time: u32);
}

/// Converts a flip-flop's value into the `u32` lamp-intensity the observer
/// expects, without requiring `bool: Into<u32>` (which the standard library
/// doesn't provide).
pub trait LampValue {
    fn lamp_value(&self) -> u32;
}

impl LampValue for bool {
    fn lamp_value(&self) -> u32 {
        *self as u32
    }
}

impl LampValue for u32 {
    fn lamp_value(&self) -> u32 {
        *self
    }
}

/// A single named storage cell. `T` is `bool` for true flip-flops (RC, TR,
/// CQ, CG, CH, CZ, CJ, FO, AS, IP, ...) and `u32` for small multi-bit
/// latches (e.g. the pending format code).
#[derive(Clone)]
pub struct FlipFlop<T> {
    name: &'static str,
    value: T,
    observer: Option<Weak<dyn LampObserver>>,
}

impl<T: Copy + Default + LampValue> FlipFlop<T> {
    pub fn new(name: &'static str) -> Self {
        FlipFlop {
            name,
            value: T::default(),
            observer: None,
        }
    }

    pub fn with_observer(name: &'static str, observer: Weak<dyn LampObserver>) -> Self {
        FlipFlop {
            name,
            value: T::default(),
            observer: Some(observer),
        }
    }

    pub fn set_observer(&mut self, observer: Weak<dyn LampObserver>) {
        self.observer = Some(observer);
    }

    #[inline]
    pub fn get(&self) -> T {
        self.value
    }

    /// Sets the cell's value and, if a lamp observer is attached and still
    /// alive, reports the transition at the given word-time.
    pub fn set(&mut self, value: T, word_time: u32) {
        self.value = value;
        if let Some(observer) = self.observer.as_ref().and_then(Weak::upgrade) {
            observer.observe(self.name, value.lamp_value(), word_time);
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl FlipFlop<bool> {
    #[inline]
    pub fn is_set(&self) -> bool {
        self.value
    }
}
