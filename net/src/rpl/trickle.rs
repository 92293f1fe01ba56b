// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! The Trickle timer algorithm (RFC 6206), driving DIO emission (§4.4.2).
//!
//! This is deliberately reusable beyond RPL DIOs, per the design note
//! in spec §9 ("factor the Trickle algorithm into one reusable
//! component, not copy it per protocol"); nothing here is RPL-specific.

/// A running Trickle timer. The owner is responsible for actually
/// scheduling the two callbacks (`transmission_time`/interval end)
/// against a real alarm; this type only tracks the algorithm state.
pub struct Trickle {
    i_min_doublings_exp: u8,
    doublings: u8,
    redundancy: u8,
    /// Current interval exponent; `I = 2^current_exp` ms.
    current_exp: u8,
    /// Counter `c`, incremented on each consistent transmission seen.
    counter: u8,
}

impl Trickle {
    pub fn new(i_min_exp: u8, doublings: u8, redundancy: u8) -> Self {
        let mut t = Trickle {
            i_min_doublings_exp: i_min_exp,
            doublings,
            redundancy,
            current_exp: i_min_exp,
            counter: 0,
        };
        t.reset();
        t
    }

    pub fn interval_ms(&self) -> u32 {
        1u32 << self.current_exp
    }

    pub fn max_exp(&self) -> u8 {
        self.i_min_doublings_exp + self.doublings
    }

    /// Resets to `Imin` with counter zeroed; called on DAG join,
    /// consistency violation, inconsistent DIO, rank change, or new
    /// parent selection.
    pub fn reset(&mut self) {
        self.current_exp = self.i_min_doublings_exp;
        self.counter = 0;
    }

    /// Call when a consistent (matching-rank) DIO is observed during
    /// the current interval.
    pub fn note_consistent(&mut self) {
        self.counter = self.counter.saturating_add(1);
    }

    /// Whether a DIO should actually be emitted at the scheduled
    /// transmission time, i.e. `counter < K`.
    pub fn should_transmit(&self) -> bool {
        self.counter < self.redundancy
    }

    /// Call at the end of the current interval: doubles `i` up to
    /// `Imax`, or leaves it if a reset already happened meanwhile.
    pub fn end_of_interval(&mut self) {
        if self.current_exp < self.max_exp() {
            self.current_exp += 1;
        }
        self.counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_up_to_imax() {
        let mut t = Trickle::new(4, 2, 10);
        assert_eq!(t.interval_ms(), 16);
        t.end_of_interval();
        assert_eq!(t.interval_ms(), 32);
        t.end_of_interval();
        assert_eq!(t.interval_ms(), 64);
        t.end_of_interval();
        assert_eq!(t.interval_ms(), 64);
    }

    #[test]
    fn reset_returns_to_imin() {
        let mut t = Trickle::new(4, 4, 10);
        t.end_of_interval();
        t.end_of_interval();
        t.reset();
        assert_eq!(t.interval_ms(), 16);
    }

    #[test]
    fn redundancy_suppresses_transmission() {
        let mut t = Trickle::new(4, 4, 2);
        assert!(t.should_transmit());
        t.note_consistent();
        t.note_consistent();
        assert!(!t.should_transmit());
    }
}
