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

//! Persisted Pokemon slots: six per generation plus the trade mode.
//!
//! The in-memory mirror is authoritative; the JSON file behind it is
//! rewritten on every change and failures to do so are logged and otherwise
//! ignored, so a broken disk degrades to in-memory operation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::party::Generation;
use crate::protocol::{GEN2_MON_SIZE, NAME_LENGTH, PARTY_LENGTH};

// ============================================================================
// Data Model
// ============================================================================

/// One stored Pokemon. The mon struct is sized for Gen 2; Gen 1 uses the
/// first 44 bytes.
#[derive(Clone)]
pub struct StoredMon {
    pub mon: [u8; GEN2_MON_SIZE],
    pub ot: [u8; NAME_LENGTH],
    pub nickname: [u8; NAME_LENGTH],
    pub species: u8,
    pub occupied: bool,
}

impl Default for StoredMon {
    fn default() -> Self {
        StoredMon {
            mon: [0; GEN2_MON_SIZE],
            ot: [0; NAME_LENGTH],
            nickname: [0; NAME_LENGTH],
            species: 0,
            occupied: false,
        }
    }
}

/// How the offered party is assembled and where received Pokemon land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeMode {
    /// Offer slot 0 in all six positions; received Pokemon overwrite slot 0.
    Clone,
    /// Offer every occupied slot; received Pokemon replace what was traded.
    Storage,
}

impl TradeMode {
    pub fn code(self) -> u8 {
        match self {
            TradeMode::Clone => 0,
            TradeMode::Storage => 1,
        }
    }

    pub fn from_code(code: u8) -> TradeMode {
        match code {
            1 => TradeMode::Storage,
            _ => TradeMode::Clone,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TradeMode::Clone => "clone",
            TradeMode::Storage => "storage",
        }
    }
}

// ============================================================================
// File Format
// ============================================================================

#[derive(Serialize, Deserialize, Default)]
struct SlotRecord {
    occupied: bool,
    species: u8,
    mon: Vec<u8>,
    ot: Vec<u8>,
    nickname: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct StoreFile {
    mode: String,
    gen1: Vec<SlotRecord>,
    gen2: Vec<SlotRecord>,
}

impl SlotRecord {
    fn from_mon(mon: &StoredMon) -> SlotRecord {
        if !mon.occupied {
            return SlotRecord::default();
        }
        SlotRecord {
            occupied: true,
            species: mon.species,
            mon: mon.mon.to_vec(),
            ot: mon.ot.to_vec(),
            nickname: mon.nickname.to_vec(),
        }
    }

    fn into_mon(self) -> StoredMon {
        let mut out = StoredMon {
            species: self.species,
            occupied: self.occupied,
            ..StoredMon::default()
        };
        let n = self.mon.len().min(GEN2_MON_SIZE);
        out.mon[..n].copy_from_slice(&self.mon[..n]);
        let n = self.ot.len().min(NAME_LENGTH);
        out.ot[..n].copy_from_slice(&self.ot[..n]);
        let n = self.nickname.len().min(NAME_LENGTH);
        out.nickname[..n].copy_from_slice(&self.nickname[..n]);
        out
    }
}

// ============================================================================
// Store
// ============================================================================

pub struct Store {
    path: PathBuf,
    gen1: [StoredMon; PARTY_LENGTH],
    gen2: [StoredMon; PARTY_LENGTH],
    mode: TradeMode,
}

impl Store {
    /// Load the store from `path`; a missing or unreadable file yields empty
    /// slots in clone mode.
    pub fn open(path: PathBuf) -> Store {
        let mut store = Store {
            path,
            gen1: Default::default(),
            gen2: Default::default(),
            mode: TradeMode::Clone,
        };

        match std::fs::read(&store.path) {
            Ok(bytes) => match serde_json::from_slice::<StoreFile>(&bytes) {
                Ok(file) => {
                    store.mode = match file.mode.as_str() {
                        "storage" => TradeMode::Storage,
                        _ => TradeMode::Clone,
                    };
                    for (i, rec) in file.gen1.into_iter().take(PARTY_LENGTH).enumerate() {
                        store.gen1[i] = rec.into_mon();
                    }
                    for (i, rec) in file.gen2.into_iter().take(PARTY_LENGTH).enumerate() {
                        store.gen2[i] = rec.into_mon();
                    }
                }
                Err(e) => warn!("store file unreadable, starting empty: {}", e),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("store file unreadable, starting empty: {}", e),
        }

        info!(
            gen1 = store.occupied_count(Generation::Gen1),
            gen2 = store.occupied_count(Generation::Gen2),
            mode = store.mode.label(),
            "storage loaded"
        );
        store
    }

    pub fn party(&self, gen: Generation) -> &[StoredMon; PARTY_LENGTH] {
        match gen {
            Generation::Gen2 => &self.gen2,
            _ => &self.gen1,
        }
    }

    pub fn occupied_count(&self, gen: Generation) -> usize {
        self.party(gen).iter().filter(|m| m.occupied).count()
    }

    pub fn save_slot(&mut self, gen: Generation, slot: usize, mon: &StoredMon) {
        if slot >= PARTY_LENGTH {
            return;
        }
        let party = match gen {
            Generation::Gen2 => &mut self.gen2,
            _ => &mut self.gen1,
        };
        party[slot] = mon.clone();
        party[slot].occupied = true;
        info!(gen = gen.label(), slot, species = mon.species, "stored pokemon");
        self.flush();
    }

    pub fn clear_slot(&mut self, gen: Generation, slot: usize) {
        if slot >= PARTY_LENGTH {
            return;
        }
        let party = match gen {
            Generation::Gen2 => &mut self.gen2,
            _ => &mut self.gen1,
        };
        party[slot] = StoredMon::default();
        info!(gen = gen.label(), slot, "cleared slot");
        self.flush();
    }

    pub fn mode(&self) -> TradeMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TradeMode) {
        self.mode = mode;
        info!(mode = mode.label(), "trade mode set");
        self.flush();
    }

    /// Rewrite the backing file. Failures leave the mirror authoritative.
    fn flush(&self) {
        let file = StoreFile {
            mode: self.mode.label().to_string(),
            gen1: self.gen1.iter().map(SlotRecord::from_mon).collect(),
            gen2: self.gen2.iter().map(SlotRecord::from_mon).collect(),
        };

        let json = match serde_json::to_vec_pretty(&file) {
            Ok(json) => json,
            Err(e) => {
                warn!("store serialization failed: {}", e);
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, json) {
            warn!("store write failed: {}", e);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("poketrade_store_{}.json", name))
    }

    fn sample_mon(species: u8) -> StoredMon {
        let mut mon = StoredMon {
            species,
            occupied: true,
            ..StoredMon::default()
        };
        mon.mon[0] = species;
        mon.mon[0x21] = 12;
        mon.ot = crate::text::encode_name("RED");
        mon.nickname = crate::text::encode_name("SPIKE");
        mon
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let path = temp_store("missing");
        std::fs::remove_file(&path).ok();

        let store = Store::open(path);
        assert_eq!(store.occupied_count(Generation::Gen1), 0);
        assert_eq!(store.occupied_count(Generation::Gen2), 0);
        assert_eq!(store.mode(), TradeMode::Clone);
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_store("reload");
        std::fs::remove_file(&path).ok();

        {
            let mut store = Store::open(path.clone());
            store.save_slot(Generation::Gen1, 2, &sample_mon(0x99));
            store.set_mode(TradeMode::Storage);
        }

        let store = Store::open(path.clone());
        assert_eq!(store.mode(), TradeMode::Storage);
        assert_eq!(store.occupied_count(Generation::Gen1), 1);
        let slot = &store.party(Generation::Gen1)[2];
        assert!(slot.occupied);
        assert_eq!(slot.species, 0x99);
        assert_eq!(slot.mon[0x21], 12);
        assert_eq!(store.occupied_count(Generation::Gen2), 0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_clear_slot() {
        let path = temp_store("clear");
        std::fs::remove_file(&path).ok();

        let mut store = Store::open(path.clone());
        store.save_slot(Generation::Gen2, 0, &sample_mon(152));
        store.clear_slot(Generation::Gen2, 0);
        assert_eq!(store.occupied_count(Generation::Gen2), 0);

        let store = Store::open(path.clone());
        assert_eq!(store.occupied_count(Generation::Gen2), 0);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let path = temp_store("corrupt");
        std::fs::write(&path, b"not json at all").unwrap();

        let store = Store::open(path.clone());
        assert_eq!(store.occupied_count(Generation::Gen1), 0);
        assert_eq!(store.mode(), TradeMode::Clone);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_out_of_range_slot_ignored() {
        let path = temp_store("range");
        std::fs::remove_file(&path).ok();

        let mut store = Store::open(path.clone());
        store.save_slot(Generation::Gen1, 9, &sample_mon(1));
        assert_eq!(store.occupied_count(Generation::Gen1), 0);

        std::fs::remove_file(&path).ok();
    }
}
