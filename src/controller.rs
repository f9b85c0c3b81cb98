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

//! The byte pump.
//!
//! The Game Boy owns the clock, so the loop is purely reactive: try to
//! exchange the latched byte, feed whatever arrives to the session, latch
//! the session's answer for the next cycle. A quiet second means the
//! session is over; that is when completed trades are committed to storage
//! and the link re-opens for the next master probe.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::context::TradeContext;
use crate::led::{Indicator, LedPattern};
use crate::link::{LinkError, LinkPort};
use crate::session::TradeSession;

/// No clock activity for this long ends the session.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(1);

/// Breather between bytes. A stability margin for the peer, not a
/// protocol requirement.
pub const BYTE_DELAY: Duration = Duration::from_micros(100);

pub struct SessionController {
    link: Box<dyn LinkPort>,
    session: TradeSession,
    indicator: Indicator,
    ctx: Arc<TradeContext>,
    out_byte: u8,
}

impl SessionController {
    pub fn new(
        link: Box<dyn LinkPort>,
        session: TradeSession,
        indicator: Indicator,
        ctx: Arc<TradeContext>,
    ) -> SessionController {
        SessionController {
            link,
            session,
            indicator,
            ctx,
            out_byte: 0x00,
        }
    }

    /// One cycle: indicator, one byte exchange, idle handling.
    pub fn poll(&mut self) {
        self.indicator
            .set_pattern(LedPattern::from_code(self.ctx.led_pattern.load(Ordering::Relaxed)));
        self.indicator.update();

        match self.link.transfer(self.out_byte) {
            Err(LinkError::EdgeTimeout) => {
                if self.link.is_idle(IDLE_TIMEOUT) {
                    if self.session.commit_pending() {
                        self.session.commit();
                    }
                    if self.session.connected() {
                        self.session.reset();
                        self.out_byte = 0x00;
                    }
                }
            }
            Ok(byte) => {
                self.out_byte = self.session.handle_byte(byte);
                std::thread::sleep(BYTE_DELAY);
            }
        }
    }

    pub fn run(&mut self) {
        loop {
            self.poll();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::led::NullPin;
    use crate::link::MockLinkPort;
    use crate::party::{self, Generation, PartyMember};
    use crate::patch;
    use crate::protocol::{MAX_DATA_LEN, PATCH_BODY_LEN, PATCH_DATA_SPLIT, PATCH_LIST_SIZE};
    use crate::storage::{Store, StoredMon};
    use crate::text;
    use std::sync::Mutex;

    fn seeded_parts(name: &str, seed: Option<(Generation, usize, StoredMon)>) -> (Arc<TradeContext>, Arc<Mutex<Store>>) {
        let path = std::env::temp_dir().join(format!("poketrade_ctrl_{}.json", name));
        std::fs::remove_file(&path).ok();
        let ctx = Arc::new(TradeContext::new());
        let store = Arc::new(Mutex::new(Store::open(path)));
        if let Some((gen, slot, mon)) = seed {
            store.lock().unwrap().save_slot(gen, slot, &mon);
        }
        (ctx, store)
    }

    fn controller_with(
        name: &str,
        link: Box<dyn LinkPort>,
        seed: Option<(Generation, usize, StoredMon)>,
    ) -> SessionController {
        let (ctx, store) = seeded_parts(name, seed);
        let session = TradeSession::new(Arc::clone(&ctx), Arc::clone(&store));
        let indicator = Indicator::new(Box::new(NullPin));
        SessionController::new(link, session, indicator, ctx)
    }

    fn bulbasaur() -> StoredMon {
        let mut mon = StoredMon {
            species: 0x99,
            occupied: true,
            ..StoredMon::default()
        };
        mon.mon[0] = 0x99;
        mon.mon[0x21] = 5;
        mon.ot = text::encode_name("RED");
        mon.nickname = text::encode_name("BULBA");
        mon
    }

    /// What a real Gen 1 game clocks at us for a full trade where it
    /// selects party position `gb_pick` and confirms.
    fn gen1_trade_inputs(gb_pick: u8) -> Vec<u8> {
        let mut inputs = vec![0x01, 0x60, 0xD0, 0xD4, 0x00];
        inputs.extend_from_slice(&[0xFD, 0xFD, 0xFD]);
        inputs.extend((0..10u8).map(|i| 0x40 + i));
        inputs.extend_from_slice(&[0xFD, 0xFD, 0xFD]);

        // Their party: three mons, one reserved byte each for the patch list.
        let mut data = vec![0u8; MAX_DATA_LEN];
        let name = text::encode_name("GARY");
        let nick = text::encode_name("RIVAL");
        let mons: Vec<[u8; 48]> = [0xB0u8, 0xB1, 0x15]
            .iter()
            .map(|&s| {
                let mut mon = [0u8; 48];
                mon[0] = s;
                mon[0x05] = 0xFE;
                mon[0x21] = 30;
                mon
            })
            .collect();
        let members: Vec<PartyMember<'_>> = mons
            .iter()
            .zip([0xB0u8, 0xB1, 0x15])
            .map(|(mon, s)| PartyMember {
                species: s,
                mon: &mon[..44],
                ot: &name,
                nickname: &nick,
            })
            .collect();
        party::write_party(&mut data, Generation::Gen1, &name, &members);
        data.truncate(Generation::Gen1.layout().data_len);

        let mut their_patch = [0u8; PATCH_LIST_SIZE];
        patch::build(&mut data, &mut their_patch, PATCH_DATA_SPLIT);

        inputs.extend_from_slice(&data);
        inputs.extend_from_slice(&[0xFD, 0xFD, 0xFD]);
        inputs.extend_from_slice(&their_patch[3..3 + PATCH_BODY_LEN]);

        // Selection, commit handshake, confirmation, back to the table.
        inputs.extend_from_slice(&[0x60 + gb_pick, 0x00, 0x62, 0x00]);
        inputs
    }

    /// The byte we emit alongside response N is the answer to input N-1;
    /// replay the inputs through an identical session to predict the log.
    fn expected_writes(name: &str, inputs: &[u8], seed: Option<(Generation, usize, StoredMon)>) -> Vec<u8> {
        let (ctx, store) = seeded_parts(name, seed);
        let mut session = TradeSession::new(ctx, store);
        let mut writes = vec![0x00];
        for &b in &inputs[..inputs.len() - 1] {
            writes.push(session.handle_byte(b));
        }
        writes
    }

    #[test]
    fn test_pump_lags_responses_by_one_byte() {
        let inputs = [0x01u8, 0x00, 0x60, 0xD0, 0xD4];
        let expected = vec![0x00, 0x02, 0x00, 0x60, 0xD0];
        let link = MockLinkPort::new(inputs.iter().map(|&b| Some(b)).collect(), expected);

        let mut controller = controller_with("pump", Box::new(link), None);
        for _ in 0..5 {
            controller.poll();
        }
        assert!(controller.session.connected());
    }

    #[test]
    fn test_transient_timeout_does_not_reset() {
        // A single missed byte mid-handshake is routine.
        let link = MockLinkPort::new(
            vec![Some(0x01), None, Some(0x60)],
            vec![0x00, 0x02],
        );

        let mut controller = controller_with("transient", Box::new(link), None);
        for _ in 0..3 {
            controller.poll();
        }
        assert!(controller.session.connected());
    }

    #[test]
    fn test_idle_resets_connected_session() {
        let link = MockLinkPort::new(vec![Some(0x01), Some(0x60)], vec![0x00, 0x02]);

        let mut controller = controller_with("idle_reset", Box::new(link), None);
        for _ in 0..4 {
            controller.poll();
        }
        assert!(!controller.session.connected());
        assert_eq!(controller.out_byte, 0x00);
    }

    #[test]
    fn test_full_trade_commits_on_idle() {
        let seed = Some((Generation::Gen1, 0, bulbasaur()));
        let inputs = gen1_trade_inputs(2);
        let expected = expected_writes("full_trade_expected", &inputs, seed.clone());

        let link = MockLinkPort::new(inputs.iter().map(|&b| Some(b)).collect(), expected);
        let mut controller = controller_with("full_trade", Box::new(link), seed);

        // Drain the script, then a few idle polls to trigger the commit.
        for _ in 0..inputs.len() + 3 {
            controller.poll();
        }

        assert!(!controller.session.connected(), "idle reset the session");

        let store = controller.session.store.lock().unwrap();
        let slot = &store.party(Generation::Gen1)[0];
        assert!(slot.occupied);
        assert_eq!(slot.species, 0x15, "received Mew committed to slot 0");
        assert_eq!(slot.mon[0x05], 0xFE, "patch applied before commit");
        assert_eq!(text::decode_name(&slot.ot), "GARY");
    }

    #[test]
    fn test_idle_without_selection_commits_nothing() {
        let seed = Some((Generation::Gen1, 0, bulbasaur()));
        let link = MockLinkPort::new(vec![Some(0x01), Some(0x60)], vec![0x00, 0x02]);
        let mut controller = controller_with("no_commit", Box::new(link), seed);

        for _ in 0..4 {
            controller.poll();
        }

        let store = controller.session.store.lock().unwrap();
        assert_eq!(store.party(Generation::Gen1)[0].species, 0x99, "slot untouched");
    }
}
