// Copyright (C) 2026 Brian Johnson
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! State shared between the protocol loop and the control plane.
//!
//! Every field is a single machine word with a single writer: the protocol
//! loop owns the connection/trade view, the control plane owns the user
//! intent fields. No invariant spans two fields across that boundary, so
//! plain relaxed atomics suffice; a reader may see fields from different
//! instants and that is fine.

use std::sync::atomic::{AtomicBool, AtomicI8, AtomicU8, Ordering};

use crate::protocol::{NAME_LENGTH, PARTY_LENGTH};

pub struct TradeContext {
    // Written by the protocol loop, read by the control plane.
    pub conn_state: AtomicU8,
    pub tc_state: AtomicU8,
    pub gen: AtomicU8,
    /// Party index the Game Boy selected, -1 when none.
    pub gb_selection: AtomicI8,
    pub opponent_count: AtomicU8,
    pub opponent_species: [AtomicU8; PARTY_LENGTH],
    pub opponent_levels: [AtomicU8; PARTY_LENGTH],
    pub opponent_nicknames: [[AtomicU8; NAME_LENGTH]; PARTY_LENGTH],
    pub led_pattern: AtomicU8,

    // Written by the control plane, read (and consumed) by the protocol loop.
    pub offer_slot: AtomicU8,
    pub auto_confirm: AtomicBool,
    pub confirm_requested: AtomicBool,
    pub decline_requested: AtomicBool,
    pub trade_mode: AtomicU8,
}

impl TradeContext {
    pub fn new() -> TradeContext {
        TradeContext {
            conn_state: AtomicU8::new(0),
            tc_state: AtomicU8::new(0),
            gen: AtomicU8::new(0),
            gb_selection: AtomicI8::new(-1),
            opponent_count: AtomicU8::new(0),
            opponent_species: std::array::from_fn(|_| AtomicU8::new(0)),
            opponent_levels: std::array::from_fn(|_| AtomicU8::new(0)),
            opponent_nicknames: std::array::from_fn(|_| std::array::from_fn(|_| AtomicU8::new(0))),
            led_pattern: AtomicU8::new(0),
            offer_slot: AtomicU8::new(0),
            auto_confirm: AtomicBool::new(true),
            confirm_requested: AtomicBool::new(false),
            decline_requested: AtomicBool::new(false),
            trade_mode: AtomicU8::new(0),
        }
    }

    pub fn set_opponent_nickname(&self, slot: usize, raw: &[u8]) {
        for (cell, &b) in self.opponent_nicknames[slot].iter().zip(raw) {
            cell.store(b, Ordering::Relaxed);
        }
    }

    pub fn opponent_nickname(&self, slot: usize) -> [u8; NAME_LENGTH] {
        let mut out = [0u8; NAME_LENGTH];
        for (b, cell) in out.iter_mut().zip(&self.opponent_nicknames[slot]) {
            *b = cell.load(Ordering::Relaxed);
        }
        out
    }

    /// Consume a pending confirm request, if any.
    pub fn take_confirm(&self) -> bool {
        self.confirm_requested.swap(false, Ordering::Relaxed)
    }

    /// Consume a pending decline request, if any.
    pub fn take_decline(&self) -> bool {
        self.decline_requested.swap(false, Ordering::Relaxed)
    }
}

impl Default for TradeContext {
    fn default() -> Self {
        TradeContext::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
