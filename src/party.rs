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

//! Party data-block layouts and serialization.
//!
//! The layouts are a wire contract with the game ROMs and are expressed as
//! explicit byte offsets rather than Rust struct layout. Multi-byte stats,
//! trainer ids and experience are big-endian.
//!
//! Data portion, Gen 1 (418 bytes):
//! ```text
//! [0..11)    player name      [12..19)  species array + 0xFF terminator
//! [11]       party count      [19..283) 6 x 44-byte mon structs
//! [283..349) 6 x OT names     [349..415) 6 x nicknames   [415..418) pad
//! ```
//!
//! Gen 2 (444 bytes) inserts a 2-byte player id at [19..21) and uses
//! 48-byte mon structs.

use crate::protocol::{
    GEN1_DATA_LEN, GEN1_MON_SIZE, GEN2_DATA_LEN, GEN2_MON_SIZE, NAME_LENGTH, PARTY_LENGTH,
    SERIAL_PATCH_TERM,
};
use crate::text;

// ============================================================================
// Generation
// ============================================================================

/// Which side of the 1998 divide the connected game lives on. Decided by
/// the handshake byte; a Gen 2 game re-enters Gen 1 via the Time Capsule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generation {
    Unknown,
    Gen1,
    Gen2,
}

impl Generation {
    pub fn code(self) -> u8 {
        match self {
            Generation::Unknown => 0,
            Generation::Gen1 => 1,
            Generation::Gen2 => 2,
        }
    }

    pub fn from_code(code: u8) -> Generation {
        match code {
            1 => Generation::Gen1,
            2 => Generation::Gen2,
            _ => Generation::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Generation::Unknown => "unknown",
            Generation::Gen1 => "gen1",
            Generation::Gen2 => "gen2",
        }
    }

    pub fn layout(self) -> &'static PartyLayout {
        match self {
            Generation::Gen2 => &GEN2_LAYOUT,
            _ => &GEN1_LAYOUT,
        }
    }
}

// ============================================================================
// Layouts
// ============================================================================

/// Byte geometry of one generation's data portion.
pub struct PartyLayout {
    pub data_len: usize,
    pub mon_size: usize,
    pub mons_off: usize,
    pub ots_off: usize,
    pub nicks_off: usize,
    /// Level offset inside a mon struct
    pub level_off: usize,
    /// Current-HP offset inside a mon struct (big-endian u16)
    pub hp_off: usize,
}

/// Player name offset in a data portion
pub const NAME_OFF: usize = 0;
/// Party count offset
pub const COUNT_OFF: usize = 11;
/// Species array offset (6 entries + terminator)
pub const SPECIES_OFF: usize = 12;
/// Gen 2 only: 2-byte player id
pub const GEN2_PLAYER_ID_OFF: usize = 19;

pub const GEN1_LAYOUT: PartyLayout = PartyLayout {
    data_len: GEN1_DATA_LEN,
    mon_size: GEN1_MON_SIZE,
    mons_off: 19,
    ots_off: 283,
    nicks_off: 349,
    level_off: 0x21,
    hp_off: 0x01,
};

pub const GEN2_LAYOUT: PartyLayout = PartyLayout {
    data_len: GEN2_DATA_LEN,
    mon_size: GEN2_MON_SIZE,
    mons_off: 21,
    ots_off: 309,
    nicks_off: 375,
    level_off: 0x1F,
    hp_off: 0x22,
};

// ============================================================================
// Packing
// ============================================================================

/// One slot's worth of outgoing party data.
pub struct PartyMember<'a> {
    pub species: u8,
    pub mon: &'a [u8],
    pub ot: &'a [u8; NAME_LENGTH],
    pub nickname: &'a [u8; NAME_LENGTH],
}

/// Serialize up to six members into `data` (a full data portion for `gen`,
/// any previous contents overwritten). The species array gets its 0xFF
/// terminator at position `members.len()`.
pub fn write_party(
    data: &mut [u8],
    gen: Generation,
    player_name: &[u8; NAME_LENGTH],
    members: &[PartyMember<'_>],
) {
    let layout = gen.layout();
    debug_assert!(members.len() <= PARTY_LENGTH);

    data[..layout.data_len].fill(0);
    data[NAME_OFF..NAME_OFF + NAME_LENGTH].copy_from_slice(player_name);
    data[COUNT_OFF] = members.len() as u8;

    for i in members.len()..=PARTY_LENGTH {
        data[SPECIES_OFF + i] = SERIAL_PATCH_TERM;
    }

    if gen == Generation::Gen2 {
        data[GEN2_PLAYER_ID_OFF] = 0x00;
        data[GEN2_PLAYER_ID_OFF + 1] = 0x01;
    }

    for (i, member) in members.iter().enumerate() {
        data[SPECIES_OFF + i] = member.species;

        let mon_off = layout.mons_off + i * layout.mon_size;
        let n = layout.mon_size.min(member.mon.len());
        data[mon_off..mon_off + n].copy_from_slice(&member.mon[..n]);

        let ot_off = layout.ots_off + i * NAME_LENGTH;
        data[ot_off..ot_off + NAME_LENGTH].copy_from_slice(member.ot);

        let nick_off = layout.nicks_off + i * NAME_LENGTH;
        data[nick_off..nick_off + NAME_LENGTH].copy_from_slice(member.nickname);
    }
}

// ============================================================================
// Unpacking
// ============================================================================

/// Party count field, clamped to the six-slot capacity.
pub fn read_count(data: &[u8]) -> usize {
    (data[COUNT_OFF] as usize).min(PARTY_LENGTH)
}

pub fn slot_mon<'a>(data: &'a [u8], gen: Generation, slot: usize) -> &'a [u8] {
    let layout = gen.layout();
    let off = layout.mons_off + slot * layout.mon_size;
    &data[off..off + layout.mon_size]
}

pub fn slot_ot<'a>(data: &'a [u8], gen: Generation, slot: usize) -> &'a [u8] {
    let off = gen.layout().ots_off + slot * NAME_LENGTH;
    &data[off..off + NAME_LENGTH]
}

pub fn slot_nickname<'a>(data: &'a [u8], gen: Generation, slot: usize) -> &'a [u8] {
    let off = gen.layout().nicks_off + slot * NAME_LENGTH;
    &data[off..off + NAME_LENGTH]
}

pub fn slot_species(data: &[u8], slot: usize) -> u8 {
    data[SPECIES_OFF + slot]
}

/// Species byte of a mon struct (both generations store it first).
pub fn mon_species(mon: &[u8]) -> u8 {
    mon[0]
}

pub fn mon_level(mon: &[u8], gen: Generation) -> u8 {
    mon[gen.layout().level_off]
}

pub fn mon_hp(mon: &[u8], gen: Generation) -> u16 {
    let off = gen.layout().hp_off;
    u16::from_be_bytes([mon[off], mon[off + 1]])
}

// ============================================================================
// Default Party
// ============================================================================

/// Gen 1 internal index for Bulbasaur
pub const GEN1_BULBASAUR: u8 = 0x99;

/// Gen 2 dex number for Chikorita
pub const GEN2_CHIKORITA: u8 = 152;

fn put_be16(mon: &mut [u8], off: usize, value: u16) {
    mon[off..off + 2].copy_from_slice(&value.to_be_bytes());
}

/// Level-5 Bulbasaur with the stats a fresh starter would have.
pub fn default_gen1_mon() -> [u8; GEN1_MON_SIZE] {
    let mut mon = [0u8; GEN1_MON_SIZE];
    mon[0x00] = GEN1_BULBASAUR;
    put_be16(&mut mon, 0x01, 20); // current HP
    mon[0x03] = 5; // box level
    mon[0x05] = 0x16; // Grass
    mon[0x06] = 0x03; // Poison
    mon[0x07] = 45; // catch rate
    mon[0x08] = 0x21; // Tackle
    mon[0x09] = 0x2D; // Growl
    put_be16(&mut mon, 0x0C, 0x0001); // trainer id
    mon[0x10] = 125; // experience, low byte of 3
    mon[0x1B] = 0xAA; // DVs
    mon[0x1C] = 0xAA;
    mon[0x1D] = 35; // Tackle PP
    mon[0x1E] = 40; // Growl PP
    mon[0x21] = 5; // level
    put_be16(&mut mon, 0x22, 20); // max HP
    put_be16(&mut mon, 0x24, 9); // attack
    put_be16(&mut mon, 0x26, 9); // defense
    put_be16(&mut mon, 0x28, 8); // speed
    put_be16(&mut mon, 0x2A, 10); // special
    mon
}

/// Level-5 Chikorita.
pub fn default_gen2_mon() -> [u8; GEN2_MON_SIZE] {
    let mut mon = [0u8; GEN2_MON_SIZE];
    mon[0x00] = GEN2_CHIKORITA;
    mon[0x02] = 0x21; // Tackle
    mon[0x03] = 0x2D; // Growl
    put_be16(&mut mon, 0x06, 0x0001); // trainer id
    mon[0x0A] = 125; // experience, low byte of 3
    mon[0x15] = 0xAA; // DVs
    mon[0x16] = 0xAA;
    mon[0x17] = 35; // Tackle PP
    mon[0x18] = 40; // Growl PP
    mon[0x1B] = 70; // happiness
    mon[0x1F] = 5; // level
    put_be16(&mut mon, 0x22, 20); // current HP
    put_be16(&mut mon, 0x24, 20); // max HP
    put_be16(&mut mon, 0x26, 9); // attack
    put_be16(&mut mon, 0x28, 10); // defense
    put_be16(&mut mon, 0x2A, 8); // speed
    put_be16(&mut mon, 0x2C, 9); // special attack
    put_be16(&mut mon, 0x2E, 10); // special defense
    mon
}

/// Fill `data` with the single-starter party offered when storage has
/// nothing to contribute.
pub fn write_default_party(data: &mut [u8], gen: Generation) {
    let trainer = text::encode_name("TRADER");

    match gen {
        Generation::Gen2 => {
            let mon = default_gen2_mon();
            let nickname = text::encode_name("CHIKORITA");
            let member = PartyMember {
                species: GEN2_CHIKORITA,
                mon: &mon,
                ot: &trainer,
                nickname: &nickname,
            };
            write_party(data, gen, &trainer, std::slice::from_ref(&member));
        }
        _ => {
            let mon = default_gen1_mon();
            let nickname = text::encode_name("BULBASAUR");
            let member = PartyMember {
                species: GEN1_BULBASAUR,
                mon: &mon,
                ot: &trainer,
                nickname: &nickname,
            };
            write_party(data, Generation::Gen1, &trainer, std::slice::from_ref(&member));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
