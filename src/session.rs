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

//! Connection-level protocol state machine.
//!
//! One session object owns every piece of per-link state: the outer
//! connection FSM lives here, the Trade Centre FSM in `trade_centre`. Each
//! received byte maps to exactly one (response, next state) outcome; any
//! byte the current state does not model is echoed back, which is what the
//! games expect of a well-behaved peer.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::context::TradeContext;
use crate::led::LedPattern;
use crate::party::Generation;
use crate::protocol::{
    BREAK_LINK, COLOSSEUM, ITEM_1_HIGHLIGHTED, ITEM_2_HIGHLIGHTED, ITEM_3_HIGHLIGHTED,
    MAX_DATA_LEN, PARTY_LENGTH, PATCH_LIST_SIZE, PKMN_BLANK, PKMN_CONNECTED,
    PKMN_CONNECTED_GEN2, PKMN_MASTER, PKMN_SLAVE, TRADE_CENTRE,
};
use crate::storage::Store;

// ============================================================================
// States
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    NotConnected,
    Connected,
    TradeCentre,
    Colosseum,
}

impl ConnectionState {
    pub fn code(self) -> u8 {
        match self {
            ConnectionState::NotConnected => 0,
            ConnectionState::Connected => 1,
            ConnectionState::TradeCentre => 2,
            ConnectionState::Colosseum => 3,
        }
    }

    pub fn from_code(code: u8) -> ConnectionState {
        match code {
            1 => ConnectionState::Connected,
            2 => ConnectionState::TradeCentre,
            3 => ConnectionState::Colosseum,
            _ => ConnectionState::NotConnected,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::NotConnected => "not_connected",
            ConnectionState::Connected => "connected",
            ConnectionState::TradeCentre => "trade_centre",
            ConnectionState::Colosseum => "colosseum",
        }
    }
}

/// Trade Centre sub-states. Ordinal order matters: a completed trade has
/// cycled back to a state before `TradePending` by the time the link goes
/// idle, which is what arms the commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TradeCentreState {
    Init,
    ReadyToGo,
    SeenFirstWait,
    SendingRandomData,
    WaitingToSendData,
    SendingData,
    SendingPatchData,
    TradePending,
    TradeConfirmation,
    Done,
}

impl TradeCentreState {
    pub fn code(self) -> u8 {
        match self {
            TradeCentreState::Init => 0,
            TradeCentreState::ReadyToGo => 1,
            TradeCentreState::SeenFirstWait => 2,
            TradeCentreState::SendingRandomData => 3,
            TradeCentreState::WaitingToSendData => 4,
            TradeCentreState::SendingData => 5,
            TradeCentreState::SendingPatchData => 6,
            TradeCentreState::TradePending => 7,
            TradeCentreState::TradeConfirmation => 8,
            TradeCentreState::Done => 9,
        }
    }

    pub fn from_code(code: u8) -> TradeCentreState {
        match code {
            1 => TradeCentreState::ReadyToGo,
            2 => TradeCentreState::SeenFirstWait,
            3 => TradeCentreState::SendingRandomData,
            4 => TradeCentreState::WaitingToSendData,
            5 => TradeCentreState::SendingData,
            6 => TradeCentreState::SendingPatchData,
            7 => TradeCentreState::TradePending,
            8 => TradeCentreState::TradeConfirmation,
            9 => TradeCentreState::Done,
            _ => TradeCentreState::Init,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TradeCentreState::Init => "init",
            TradeCentreState::ReadyToGo => "ready_to_go",
            TradeCentreState::SeenFirstWait => "seen_first_wait",
            TradeCentreState::SendingRandomData => "sending_random",
            TradeCentreState::WaitingToSendData => "wait_to_send",
            TradeCentreState::SendingData => "sending_data",
            TradeCentreState::SendingPatchData => "sending_patch",
            TradeCentreState::TradePending => "trade_pending",
            TradeCentreState::TradeConfirmation => "trade_confirm",
            TradeCentreState::Done => "done",
        }
    }
}

// ============================================================================
// Session
// ============================================================================

pub struct TradeSession {
    pub(crate) ctx: Arc<TradeContext>,
    pub(crate) store: Arc<Mutex<Store>>,

    pub(crate) conn_state: ConnectionState,
    pub(crate) tc_state: TradeCentreState,
    pub(crate) gen: Generation,

    /// Index into the current exchange (data bytes, then patch bytes).
    pub(crate) counter: usize,
    /// Data-portion length for the generation in play, set by `prepare`.
    pub(crate) data_len: usize,
    /// Party index the Game Boy selected, -1 when none.
    pub(crate) gb_selection: i8,

    pub(crate) send_data: [u8; MAX_DATA_LEN],
    pub(crate) recv_data: [u8; MAX_DATA_LEN],
    pub(crate) send_patch: [u8; PATCH_LIST_SIZE],
    pub(crate) recv_patch: [u8; PATCH_LIST_SIZE],

    /// Outgoing party position -> storage slot it came from.
    pub(crate) party_to_storage: [Option<usize>; PARTY_LENGTH],
}

impl TradeSession {
    pub fn new(ctx: Arc<TradeContext>, store: Arc<Mutex<Store>>) -> TradeSession {
        let mut session = TradeSession {
            ctx,
            store,
            conn_state: ConnectionState::NotConnected,
            tc_state: TradeCentreState::Init,
            gen: Generation::Unknown,
            counter: 0,
            data_len: 0,
            gb_selection: -1,
            send_data: [0; MAX_DATA_LEN],
            recv_data: [0; MAX_DATA_LEN],
            send_patch: [0; PATCH_LIST_SIZE],
            recv_patch: [0; PATCH_LIST_SIZE],
            party_to_storage: [None; PARTY_LENGTH],
        };
        session.reset();
        session
    }

    pub fn connected(&self) -> bool {
        self.conn_state != ConnectionState::NotConnected
    }

    /// A trade has completed (the Trade Centre FSM wrapped past Done) and
    /// its received Pokemon has not been written to storage yet.
    pub fn commit_pending(&self) -> bool {
        self.gb_selection >= 0 && self.tc_state < TradeCentreState::TradePending
    }

    /// Drop back to the unconnected state, ready for a new master probe.
    /// Stored slots are untouched.
    pub fn reset(&mut self) {
        let prev = self.conn_state;

        self.conn_state = ConnectionState::NotConnected;
        self.tc_state = TradeCentreState::Init;
        self.gen = Generation::Unknown;
        self.counter = 0;
        self.data_len = 0;
        self.gb_selection = -1;

        self.ctx.opponent_count.store(0, Ordering::Relaxed);
        self.ctx.confirm_requested.store(false, Ordering::Relaxed);
        self.ctx.decline_requested.store(false, Ordering::Relaxed);
        self.sync_context();
        self.set_led(LedPattern::SlowBlink);

        if prev != ConnectionState::NotConnected {
            info!(was = prev.label(), "link disconnected");
        }
    }

    /// Handle one received byte and produce the byte to send next cycle.
    pub fn handle_byte(&mut self, input: u8) -> u8 {
        let send = match self.conn_state {
            ConnectionState::NotConnected => self.not_connected_byte(input),
            ConnectionState::Connected => self.connected_byte(input),
            ConnectionState::TradeCentre => self.trade_centre_byte(input),
            ConnectionState::Colosseum => self.colosseum_byte(input),
        };
        self.sync_context();
        send
    }

    // ------------------------------------------------------------------
    // NOT_CONNECTED: handshake
    // ------------------------------------------------------------------
    fn not_connected_byte(&mut self, input: u8) -> u8 {
        match input {
            PKMN_MASTER => PKMN_SLAVE,
            PKMN_BLANK => PKMN_BLANK,
            PKMN_CONNECTED => {
                self.conn_state = ConnectionState::Connected;
                self.gen = Generation::Gen1;
                self.set_led(LedPattern::DoubleBlink);
                info!("link connected (Gen 1)");
                input
            }
            PKMN_CONNECTED_GEN2 => {
                self.conn_state = ConnectionState::Connected;
                self.gen = Generation::Gen2;
                self.set_led(LedPattern::DoubleBlink);
                info!("link connected (Gen 2)");
                input
            }
            other => other,
        }
    }

    // ------------------------------------------------------------------
    // CONNECTED: Cable Club menu
    // ------------------------------------------------------------------
    fn connected_byte(&mut self, input: u8) -> u8 {
        match input {
            ITEM_1_HIGHLIGHTED | ITEM_2_HIGHLIGHTED | ITEM_3_HIGHLIGHTED => input,
            TRADE_CENTRE => {
                self.enter_trade_centre();
                input
            }
            COLOSSEUM => {
                self.conn_state = ConnectionState::Colosseum;
                info!("colosseum selected, echoing");
                input
            }
            BREAK_LINK if self.gen == Generation::Gen2 => {
                // Time Capsule: the Gen 2 game falls back to the Gen 1
                // block format for the rest of the session.
                self.gen = Generation::Gen1;
                info!("time capsule opened, using Gen 1 format");
                self.enter_trade_centre();
                input
            }
            BREAK_LINK | PKMN_MASTER => {
                self.reset();
                BREAK_LINK
            }
            other => other,
        }
    }

    // ------------------------------------------------------------------
    // COLOSSEUM: passive echo
    // ------------------------------------------------------------------
    fn colosseum_byte(&mut self, input: u8) -> u8 {
        match input {
            BREAK_LINK | PKMN_MASTER => {
                self.reset();
                BREAK_LINK
            }
            other => other,
        }
    }

    fn enter_trade_centre(&mut self) {
        self.conn_state = ConnectionState::TradeCentre;
        self.tc_state = TradeCentreState::Init;
        self.set_led(LedPattern::TripleBlink);
        info!("entered trade centre");
    }

    pub(crate) fn set_led(&self, pattern: LedPattern) {
        self.ctx.led_pattern.store(pattern.code(), Ordering::Relaxed);
    }

    pub(crate) fn sync_context(&self) {
        self.ctx
            .conn_state
            .store(self.conn_state.code(), Ordering::Relaxed);
        self.ctx.tc_state.store(self.tc_state.code(), Ordering::Relaxed);
        self.ctx.gen.store(self.gen.code(), Ordering::Relaxed);
        self.ctx
            .gb_selection
            .store(self.gb_selection, Ordering::Relaxed);
    }
}

// ============================================================================
// Tests
// ============================================================================
