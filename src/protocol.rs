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

//! Link-cable protocol constants

/// Quiet-line filler exchanged outside any phase
pub const PKMN_BLANK: u8 = 0x00;

/// Master probe - the Game Boy announcing itself as clock master
pub const PKMN_MASTER: u8 = 0x01;

/// Slave acknowledgement to a master probe
pub const PKMN_SLAVE: u8 = 0x02;

/// Gen 1 connection byte - link established, Gen 1 protocol
pub const PKMN_CONNECTED: u8 = 0x60;

/// Gen 2 connection byte - link established, Gen 2 protocol
pub const PKMN_CONNECTED_GEN2: u8 = 0x61;

/// Cable Club menu item 1 highlighted
pub const ITEM_1_HIGHLIGHTED: u8 = 0xD0;

/// Cable Club menu item 2 highlighted
pub const ITEM_2_HIGHLIGHTED: u8 = 0xD1;

/// Cable Club menu item 3 highlighted
pub const ITEM_3_HIGHLIGHTED: u8 = 0xD2;

/// Trade Centre selected
pub const TRADE_CENTRE: u8 = 0xD4;

/// Colosseum (battle) selected
pub const COLOSSEUM: u8 = 0xD5;

/// Break Link selected; in Gen 2 this byte opens the Time Capsule instead
pub const BREAK_LINK: u8 = 0xD6;

/// Preamble/filler framing byte around data blocks
pub const SERIAL_PREAMBLE_BYTE: u8 = 0xFD;

/// "Stream idle" marker - reserved on the wire, escaped by the patch list
pub const SERIAL_NO_DATA_BYTE: u8 = 0xFE;

/// Patch-list section terminator, also the species array terminator
pub const SERIAL_PATCH_TERM: u8 = 0xFF;

/// Trade selection base: 0x60 + party index (0-5)
pub const TRADE_SELECT_BASE: u8 = 0x60;

/// Trade selection cancel byte
pub const TRADE_CANCEL: u8 = 0x6F;

/// Name field width (player names, OT names, nicknames)
pub const NAME_LENGTH: usize = 11;

/// Party capacity on both sides
pub const PARTY_LENGTH: usize = 6;

/// Preamble length in front of a party data block (both generations)
pub const PREAMBLE_SIZE: usize = 6;

/// Gen 1 party mon struct size
pub const GEN1_MON_SIZE: usize = 44;

/// Gen 2 party mon struct size
pub const GEN2_MON_SIZE: usize = 48;

/// Gen 1 data portion length (party block minus preamble)
pub const GEN1_DATA_LEN: usize = 418;

/// Gen 2 data portion length (party block minus preamble)
pub const GEN2_DATA_LEN: usize = 444;

/// Largest data portion either generation exchanges
pub const MAX_DATA_LEN: usize = GEN2_DATA_LEN;

/// Patch list total size, 3-byte preamble included
pub const PATCH_LIST_SIZE: usize = 200;

/// Patch-list bytes exchanged after the preamble
pub const PATCH_BODY_LEN: usize = PATCH_LIST_SIZE - 3;

/// Offset splitting a data portion into the two patch-list sections
pub const PATCH_DATA_SPLIT: usize = 252;
