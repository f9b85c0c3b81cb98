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

//! Trade Centre sub-protocol.
//!
//! Once both players sit down at the table, the game clocks through: a
//! quiet period, a preamble-framed block of random filler (battle seeds), a
//! preamble-framed party block, the patch list for that block, and finally
//! the selection/confirmation bytes. We answer every phase from the party
//! prepared out of storage, capture everything the Game Boy sends, and
//! write the received Pokemon back to storage once the link goes quiet.

use std::sync::atomic::Ordering;

use tracing::{debug, info};

use crate::led::LedPattern;
use crate::party;
use crate::party::PartyMember;
use crate::patch;
use crate::protocol::{
    PARTY_LENGTH, PATCH_BODY_LEN, PATCH_DATA_SPLIT, SERIAL_PREAMBLE_BYTE, TRADE_CANCEL,
    TRADE_SELECT_BASE,
};
use crate::session::{TradeCentreState, TradeSession};
use crate::species;
use crate::storage::{StoredMon, TradeMode};
use crate::text;

impl TradeSession {
    /// One Trade Centre byte: returns the response and advances the inner
    /// state machine. Unmodelled bytes are echoed, which keeps the framing
    /// intact across the filler the games sprinkle between phases.
    pub(crate) fn trade_centre_byte(&mut self, input: u8) -> u8 {
        match self.tc_state {
            TradeCentreState::Init => {
                if input == 0x00 {
                    self.tc_state = TradeCentreState::ReadyToGo;
                    debug!("trade centre ready");
                    0x00
                } else {
                    input
                }
            }

            TradeCentreState::ReadyToGo => {
                if input == SERIAL_PREAMBLE_BYTE {
                    self.tc_state = TradeCentreState::SeenFirstWait;
                    SERIAL_PREAMBLE_BYTE
                } else {
                    // Includes the 0x6F re-entry after a cancelled trade.
                    input
                }
            }

            TradeCentreState::SeenFirstWait => {
                if input != SERIAL_PREAMBLE_BYTE {
                    self.tc_state = TradeCentreState::SendingRandomData;
                    self.counter = 0;
                    input
                } else {
                    SERIAL_PREAMBLE_BYTE
                }
            }

            TradeCentreState::SendingRandomData => {
                if input == SERIAL_PREAMBLE_BYTE {
                    self.tc_state = TradeCentreState::WaitingToSendData;
                    self.prepare();
                    SERIAL_PREAMBLE_BYTE
                } else {
                    input
                }
            }

            TradeCentreState::WaitingToSendData => {
                if input != SERIAL_PREAMBLE_BYTE {
                    // First data byte of the exchange.
                    let send = self.send_data[0];
                    self.recv_data[0] = input;
                    self.counter = 1;
                    self.tc_state = TradeCentreState::SendingData;
                    self.set_led(LedPattern::FastBlink);
                    debug!(len = self.data_len, "party data exchange started");
                    send
                } else {
                    SERIAL_PREAMBLE_BYTE
                }
            }

            TradeCentreState::SendingData => {
                let send = self.send_data[self.counter];
                self.recv_data[self.counter] = input;
                self.counter += 1;
                if self.counter >= self.data_len {
                    self.tc_state = TradeCentreState::SendingPatchData;
                    self.counter = 0;
                    debug!(len = self.data_len, "party data exchange complete");
                    self.record_opponent_party();
                }
                send
            }

            TradeCentreState::SendingPatchData => {
                if input == SERIAL_PREAMBLE_BYTE {
                    self.counter = 0;
                    SERIAL_PREAMBLE_BYTE
                } else {
                    let send = self.send_patch[3 + self.counter];
                    self.recv_patch[3 + self.counter] = input;
                    self.counter += 1;
                    if self.counter >= PATCH_BODY_LEN {
                        self.recv_patch[0] = SERIAL_PREAMBLE_BYTE;
                        self.recv_patch[1] = SERIAL_PREAMBLE_BYTE;
                        self.recv_patch[2] = SERIAL_PREAMBLE_BYTE;
                        self.tc_state = TradeCentreState::TradePending;
                        self.set_led(LedPattern::TripleBlink);
                        info!("patch exchange complete, waiting for selection");
                    }
                    send
                }
            }

            TradeCentreState::TradePending => {
                if input == TRADE_CANCEL {
                    self.tc_state = TradeCentreState::ReadyToGo;
                    self.gb_selection = -1;
                    info!("trade cancelled");
                    TRADE_CANCEL
                } else if input & 0x60 == 0x60 {
                    self.gb_selection = (input - TRADE_SELECT_BASE) as i8;
                    let offer = self
                        .ctx
                        .offer_slot
                        .load(Ordering::Relaxed)
                        .min(PARTY_LENGTH as u8 - 1);
                    info!(
                        gb_selected = self.gb_selection,
                        our_offer = offer,
                        "selections exchanged"
                    );
                    TRADE_SELECT_BASE + offer
                } else if input == 0x00 {
                    self.tc_state = TradeCentreState::TradeConfirmation;
                    debug!("confirmation handshake started");
                    0x00
                } else {
                    input
                }
            }

            TradeCentreState::TradeConfirmation => {
                if input & 0x60 == 0x60 {
                    if input == 0x61 {
                        self.gb_selection = -1;
                        self.tc_state = TradeCentreState::TradePending;
                        info!("trade declined by the Game Boy");
                        input
                    } else if self.ctx.auto_confirm.load(Ordering::Relaxed)
                        || self.ctx.take_confirm()
                    {
                        self.tc_state = TradeCentreState::Done;
                        info!("trade confirmed");
                        0x62
                    } else {
                        // No confirm pending: this is the user's decline.
                        self.ctx.take_decline();
                        self.gb_selection = -1;
                        self.tc_state = TradeCentreState::TradePending;
                        info!("trade declined");
                        0x61
                    }
                } else {
                    input
                }
            }

            TradeCentreState::Done => {
                if input == 0x00 {
                    self.tc_state = TradeCentreState::Init;
                    info!("trade complete, ready for another");
                    0x00
                } else {
                    input
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Outbound party assembly
    // ------------------------------------------------------------------

    /// Build the outgoing party block and its patch list from storage,
    /// remembering which storage slot backs each party position.
    pub(crate) fn prepare(&mut self) {
        let gen = self.gen;
        self.data_len = gen.layout().data_len;
        self.party_to_storage = [None; PARTY_LENGTH];

        let mode = TradeMode::from_code(self.ctx.trade_mode.load(Ordering::Relaxed));

        {
            let store = self.store.lock().unwrap_or_else(|e| e.into_inner());
            let slots = store.party(gen);

            let mut members: Vec<PartyMember<'_>> = Vec::with_capacity(PARTY_LENGTH);
            let mut player_name = text::encode_name("TRADER");

            match mode {
                TradeMode::Clone => {
                    if slots[0].occupied {
                        player_name = slots[0].ot;
                        for i in 0..PARTY_LENGTH {
                            members.push(PartyMember {
                                species: slots[0].species,
                                mon: &slots[0].mon,
                                ot: &slots[0].ot,
                                nickname: &slots[0].nickname,
                            });
                            self.party_to_storage[i] = Some(0);
                        }
                    }
                }
                TradeMode::Storage => {
                    for (i, slot) in slots.iter().enumerate() {
                        if !slot.occupied {
                            continue;
                        }
                        self.party_to_storage[members.len()] = Some(i);
                        members.push(PartyMember {
                            species: slot.species,
                            mon: &slot.mon,
                            ot: &slot.ot,
                            nickname: &slot.nickname,
                        });
                    }
                    if let Some(Some(first)) = self.party_to_storage.first() {
                        player_name = slots[*first].ot;
                    }
                }
            }

            if members.is_empty() {
                self.party_to_storage = [None; PARTY_LENGTH];
                party::write_default_party(&mut self.send_data, gen);
            } else {
                party::write_party(&mut self.send_data, gen, &player_name, &members);
            }
        }

        patch::build(
            &mut self.send_data[..self.data_len],
            &mut self.send_patch,
            PATCH_DATA_SPLIT,
        );

        info!(
            gen = gen.label(),
            len = self.data_len,
            mode = mode.label(),
            "outgoing party prepared"
        );
    }

    // ------------------------------------------------------------------
    // Opponent party summary
    // ------------------------------------------------------------------

    /// Publish what the opponent sent into the shared context and the log.
    /// Runs on the raw block; any escaped 0xFE bytes are still 0xFF here,
    /// which only ever touches cosmetic fields.
    fn record_opponent_party(&mut self) {
        let gen = self.gen;
        let data = &self.recv_data[..self.data_len];
        let count = party::read_count(data);

        self.ctx.opponent_count.store(count as u8, Ordering::Relaxed);
        info!(count, "opponent party received");

        for i in 0..count {
            let mon = party::slot_mon(data, gen, i);
            let species = party::mon_species(mon);
            let level = party::mon_level(mon, gen);

            self.ctx.opponent_species[i].store(species, Ordering::Relaxed);
            self.ctx.opponent_levels[i].store(level, Ordering::Relaxed);
            self.ctx
                .set_opponent_nickname(i, party::slot_nickname(data, gen, i));

            info!(
                slot = i,
                species = species::name(gen, species),
                level,
                hp = party::mon_hp(mon, gen),
                "opponent pokemon"
            );
        }
    }

    // ------------------------------------------------------------------
    // Commit
    // ------------------------------------------------------------------

    /// Write the Pokemon received in the last completed trade to storage.
    /// Called by the controller once the link has gone idle.
    pub fn commit(&mut self) {
        let selected = self.gb_selection;
        if !(0..PARTY_LENGTH as i8).contains(&selected) || self.data_len == 0 {
            return;
        }
        let selected = selected as usize;
        let gen = self.gen;
        let layout = gen.layout();

        // Restore the 0xFE bytes the sender escaped.
        patch::apply(
            &mut self.recv_data[..self.data_len],
            &self.recv_patch,
            PATCH_DATA_SPLIT,
        );
        let data = &self.recv_data[..self.data_len];

        let mut received = StoredMon {
            species: party::slot_species(data, selected),
            occupied: true,
            ..StoredMon::default()
        };
        received.mon[..layout.mon_size].copy_from_slice(party::slot_mon(data, gen, selected));
        received
            .ot
            .copy_from_slice(party::slot_ot(data, gen, selected));
        received
            .nickname
            .copy_from_slice(party::slot_nickname(data, gen, selected));

        let mon = party::slot_mon(data, gen, selected);
        info!(
            gen = gen.label(),
            species = species::name(gen, party::mon_species(mon)),
            level = party::mon_level(mon, gen),
            "received pokemon"
        );

        let mode = TradeMode::from_code(self.ctx.trade_mode.load(Ordering::Relaxed));
        let dest = match mode {
            TradeMode::Clone => 0,
            TradeMode::Storage => {
                let offer = self.ctx.offer_slot.load(Ordering::Relaxed) as usize;
                self.party_to_storage
                    .get(offer)
                    .copied()
                    .flatten()
                    .unwrap_or(0)
            }
        };

        self.store
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .save_slot(gen, dest, &received);

        self.gb_selection = -1;
        self.sync_context();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TradeContext;
    use crate::party::Generation;
    use crate::protocol::{MAX_DATA_LEN, PATCH_LIST_SIZE};
    use crate::session::ConnectionState;
    use crate::storage::Store;
    use std::sync::{Arc, Mutex};

    fn test_session(name: &str) -> TradeSession {
        let path = std::env::temp_dir().join(format!("poketrade_tc_{}.json", name));
        std::fs::remove_file(&path).ok();
        let ctx = Arc::new(TradeContext::new());
        let store = Arc::new(Mutex::new(Store::open(path)));
        TradeSession::new(ctx, store)
    }

    fn stored(species: u8, level: u8, gen: Generation) -> StoredMon {
        let mut mon = StoredMon {
            species,
            occupied: true,
            ..StoredMon::default()
        };
        mon.mon[0] = species;
        mon.mon[gen.layout().level_off] = level;
        mon.ot = text::encode_name("RED");
        mon.nickname = text::encode_name("PARTNER");
        mon
    }

    /// A plausible opposing party as the Game Boy would send it: packed
    /// data portion plus the patch list scrubbing any 0xFE bytes.
    fn opponent_block(gen: Generation, species: &[u8]) -> (Vec<u8>, [u8; PATCH_LIST_SIZE]) {
        let mut data = vec![0u8; MAX_DATA_LEN];
        let name = text::encode_name("GARY");
        let ot = text::encode_name("GARY");
        let nick = text::encode_name("RIVAL");

        let mons: Vec<[u8; 48]> = species
            .iter()
            .map(|&s| {
                let mut mon = [0u8; 48];
                mon[0] = s;
                mon[gen.layout().level_off] = 30;
                // A deliberately reserved byte so the patch list has work.
                mon[0x05] = 0xFE;
                mon
            })
            .collect();
        let members: Vec<PartyMember<'_>> = mons
            .iter()
            .zip(species)
            .map(|(mon, &s)| PartyMember {
                species: s,
                mon: &mon[..gen.layout().mon_size],
                ot: &ot,
                nickname: &nick,
            })
            .collect();

        party::write_party(&mut data, gen, &name, &members);
        data.truncate(gen.layout().data_len);

        let mut patch = [0u8; PATCH_LIST_SIZE];
        patch::build(&mut data, &mut patch, PATCH_DATA_SPLIT);
        (data, patch)
    }

    /// Drive a full Trade Centre exchange up to the selection phase.
    fn run_to_pending(session: &mut TradeSession, connect: &[u8], gen: Generation, species: &[u8]) {
        for &b in connect {
            session.handle_byte(b);
        }
        assert_eq!(session.conn_state, ConnectionState::TradeCentre);

        // Quiet period, then the random-block preamble and ten filler bytes.
        assert_eq!(session.handle_byte(0x00), 0x00);
        for _ in 0..3 {
            assert_eq!(session.handle_byte(0xFD), 0xFD);
        }
        for i in 0..10u8 {
            assert_eq!(session.handle_byte(0x20 + i), 0x20 + i);
        }

        // Party-block preamble triggers prepare().
        assert_eq!(session.handle_byte(0xFD), 0xFD);
        assert_eq!(session.tc_state, TradeCentreState::WaitingToSendData);
        for _ in 0..2 {
            assert_eq!(session.handle_byte(0xFD), 0xFD);
        }

        // Data portion, byte for byte against ours.
        let (their_data, their_patch) = opponent_block(gen, species);
        let our_data = session.send_data;
        for (i, &b) in their_data.iter().enumerate() {
            assert_eq!(session.handle_byte(b), our_data[i], "data byte {}", i);
        }
        assert_eq!(session.tc_state, TradeCentreState::SendingPatchData);

        // Patch list: preamble then the 197-byte body.
        let our_patch = session.send_patch;
        for _ in 0..3 {
            assert_eq!(session.handle_byte(0xFD), 0xFD);
        }
        for i in 0..PATCH_BODY_LEN {
            assert_eq!(
                session.handle_byte(their_patch[3 + i]),
                our_patch[3 + i],
                "patch byte {}",
                i
            );
        }
        assert_eq!(session.tc_state, TradeCentreState::TradePending);
    }

    #[test]
    fn test_clone_mode_commit_overwrites_slot_zero() {
        let mut session = test_session("clone_commit");
        session
            .store
            .lock()
            .unwrap()
            .save_slot(Generation::Gen1, 0, &stored(0x99, 5, Generation::Gen1));

        run_to_pending(
            &mut session,
            &[0x01, 0x60, 0xD0, 0xD4],
            Generation::Gen1,
            &[0xB0, 0xB1, 0x15],
        );

        // The Game Boy picks its party position 2 (Mew); we offer slot 0.
        assert_eq!(session.handle_byte(0x62), 0x60);
        assert_eq!(session.gb_selection, 2);

        assert_eq!(session.handle_byte(0x00), 0x00);
        assert_eq!(session.tc_state, TradeCentreState::TradeConfirmation);

        // Auto-confirm is the default.
        assert_eq!(session.handle_byte(0x62), 0x62);
        assert_eq!(session.tc_state, TradeCentreState::Done);

        assert_eq!(session.handle_byte(0x00), 0x00);
        assert_eq!(session.tc_state, TradeCentreState::Init);
        assert!(session.commit_pending());

        session.commit();
        assert_eq!(session.gb_selection, -1);

        let store = session.store.lock().unwrap();
        let slot = &store.party(Generation::Gen1)[0];
        assert!(slot.occupied);
        assert_eq!(slot.species, 0x15, "Mew landed in slot 0");
        assert_eq!(slot.mon[0], 0x15);
        assert_eq!(slot.mon[0x21], 30);
        assert_eq!(slot.mon[0x05], 0xFE, "patch list restored the 0xFE byte");
        assert_eq!(text::decode_name(&slot.ot), "GARY");
    }

    #[test]
    fn test_offered_party_clones_slot_zero_six_times() {
        let mut session = test_session("clone_offer");
        session
            .store
            .lock()
            .unwrap()
            .save_slot(Generation::Gen1, 0, &stored(0x99, 5, Generation::Gen1));

        run_to_pending(
            &mut session,
            &[0x01, 0x60, 0xD0, 0xD4],
            Generation::Gen1,
            &[0xB0],
        );

        let data = &session.send_data[..session.data_len];
        assert_eq!(party::read_count(data), 6);
        for i in 0..6 {
            assert_eq!(party::slot_species(data, i), 0x99);
            assert_eq!(session.party_to_storage[i], Some(0));
        }
        assert_eq!(party::slot_species(data, 6), 0xFF);
    }

    #[test]
    fn test_default_party_offered_when_storage_empty() {
        let mut session = test_session("default_offer");

        run_to_pending(
            &mut session,
            &[0x01, 0x60, 0xD0, 0xD4],
            Generation::Gen1,
            &[0xB0],
        );

        let data = &session.send_data[..session.data_len];
        assert_eq!(party::read_count(data), 1);
        assert_eq!(party::slot_species(data, 0), party::GEN1_BULBASAUR);
        assert_eq!(session.party_to_storage, [None; 6]);
    }

    #[test]
    fn test_storage_mode_compacts_occupied_slots() {
        let mut session = test_session("compact");
        session.ctx.trade_mode.store(TradeMode::Storage.code(), Ordering::Relaxed);
        {
            let mut store = session.store.lock().unwrap();
            store.save_slot(Generation::Gen2, 1, &stored(152, 10, Generation::Gen2));
            store.save_slot(Generation::Gen2, 3, &stored(155, 12, Generation::Gen2));
            store.save_slot(Generation::Gen2, 4, &stored(158, 14, Generation::Gen2));
        }

        run_to_pending(
            &mut session,
            &[0x01, 0x61, 0xD0, 0xD4],
            Generation::Gen2,
            &[25],
        );

        let data = &session.send_data[..session.data_len];
        assert_eq!(party::read_count(data), 3);
        assert_eq!(party::slot_species(data, 0), 152);
        assert_eq!(party::slot_species(data, 1), 155);
        assert_eq!(party::slot_species(data, 2), 158);
        assert_eq!(party::slot_species(data, 3), 0xFF);
        assert_eq!(
            &session.party_to_storage[..4],
            &[Some(1), Some(3), Some(4), None]
        );
    }

    #[test]
    fn test_storage_mode_commit_maps_offer_back_to_slot() {
        let mut session = test_session("storage_commit");
        session.ctx.trade_mode.store(TradeMode::Storage.code(), Ordering::Relaxed);
        // Offer party position 1, which storage slot 3 backs.
        session.ctx.offer_slot.store(1, Ordering::Relaxed);
        {
            let mut store = session.store.lock().unwrap();
            store.save_slot(Generation::Gen2, 1, &stored(152, 10, Generation::Gen2));
            store.save_slot(Generation::Gen2, 3, &stored(155, 12, Generation::Gen2));
            store.save_slot(Generation::Gen2, 4, &stored(158, 14, Generation::Gen2));
        }

        run_to_pending(
            &mut session,
            &[0x01, 0x61, 0xD0, 0xD4],
            Generation::Gen2,
            &[25, 133],
        );

        assert_eq!(session.handle_byte(0x60), 0x61, "we offer party position 1");
        session.handle_byte(0x00);
        session.handle_byte(0x62);
        session.handle_byte(0x00);
        session.commit();

        let store = session.store.lock().unwrap();
        let party = store.party(Generation::Gen2);
        assert_eq!(party[3].species, 25, "received Pikachu replaced slot 3");
        assert_eq!(party[1].species, 152, "untraded slots untouched");
        assert_eq!(party[4].species, 158);
    }

    #[test]
    fn test_cancel_returns_to_ready_and_clears_selection() {
        let mut session = test_session("cancel");
        session
            .store
            .lock()
            .unwrap()
            .save_slot(Generation::Gen1, 0, &stored(0x99, 5, Generation::Gen1));

        run_to_pending(
            &mut session,
            &[0x01, 0x60, 0xD0, 0xD4],
            Generation::Gen1,
            &[0xB0, 0xB1],
        );

        session.handle_byte(0x61);
        assert_eq!(session.gb_selection, 1);

        assert_eq!(session.handle_byte(0x6F), 0x6F);
        assert_eq!(session.tc_state, TradeCentreState::ReadyToGo);
        assert_eq!(session.gb_selection, -1);
        assert!(!session.commit_pending());
    }

    #[test]
    fn test_gb_decline_returns_to_pending() {
        let mut session = test_session("gb_decline");

        run_to_pending(
            &mut session,
            &[0x01, 0x60, 0xD0, 0xD4],
            Generation::Gen1,
            &[0xB0],
        );

        session.handle_byte(0x60);
        session.handle_byte(0x00);
        assert_eq!(session.handle_byte(0x61), 0x61);
        assert_eq!(session.tc_state, TradeCentreState::TradePending);
        assert_eq!(session.gb_selection, -1);
    }

    #[test]
    fn test_manual_decline_when_no_confirm_pending() {
        let mut session = test_session("manual_decline");
        session.ctx.auto_confirm.store(false, Ordering::Relaxed);

        run_to_pending(
            &mut session,
            &[0x01, 0x60, 0xD0, 0xD4],
            Generation::Gen1,
            &[0xB0],
        );

        session.handle_byte(0x60);
        session.handle_byte(0x00);
        assert_eq!(session.handle_byte(0x62), 0x61, "no confirm queued declines");
        assert_eq!(session.tc_state, TradeCentreState::TradePending);
        assert_eq!(session.gb_selection, -1);
    }

    #[test]
    fn test_manual_confirm_request_consumed() {
        let mut session = test_session("manual_confirm");
        session.ctx.auto_confirm.store(false, Ordering::Relaxed);
        session.ctx.confirm_requested.store(true, Ordering::Relaxed);

        run_to_pending(
            &mut session,
            &[0x01, 0x60, 0xD0, 0xD4],
            Generation::Gen1,
            &[0xB0],
        );

        session.handle_byte(0x60);
        session.handle_byte(0x00);
        assert_eq!(session.handle_byte(0x62), 0x62);
        assert_eq!(session.tc_state, TradeCentreState::Done);
        assert!(
            !session.ctx.confirm_requested.load(Ordering::Relaxed),
            "request flag consumed"
        );
    }

    #[test]
    fn test_second_trade_after_cancel() {
        let mut session = test_session("second_trade");
        session
            .store
            .lock()
            .unwrap()
            .save_slot(Generation::Gen1, 0, &stored(0x99, 5, Generation::Gen1));

        run_to_pending(
            &mut session,
            &[0x01, 0x60, 0xD0, 0xD4],
            Generation::Gen1,
            &[0xB0, 0xB1],
        );
        session.handle_byte(0x61);
        session.handle_byte(0x6F);
        assert_eq!(session.tc_state, TradeCentreState::ReadyToGo);

        // The table restarts from the preamble; run the whole exchange again.
        for _ in 0..3 {
            assert_eq!(session.handle_byte(0xFD), 0xFD);
        }
        for i in 0..10u8 {
            session.handle_byte(0x30 + i);
        }
        session.handle_byte(0xFD);
        assert_eq!(session.tc_state, TradeCentreState::WaitingToSendData);

        let (their_data, their_patch) = opponent_block(Generation::Gen1, &[0xB1, 0x15]);
        for &b in &their_data {
            session.handle_byte(b);
        }
        for _ in 0..3 {
            session.handle_byte(0xFD);
        }
        for i in 0..PATCH_BODY_LEN {
            session.handle_byte(their_patch[3 + i]);
        }
        assert_eq!(session.tc_state, TradeCentreState::TradePending);

        assert_eq!(session.handle_byte(0x61), 0x60);
        session.handle_byte(0x00);
        session.handle_byte(0x62);
        session.handle_byte(0x00);
        assert!(session.commit_pending());

        session.commit();
        let store = session.store.lock().unwrap();
        assert_eq!(store.party(Generation::Gen1)[0].species, 0x15);
    }
}
