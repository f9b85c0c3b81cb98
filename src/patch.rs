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

//! Patch-list escaping for the 0xFE wire marker.
//!
//! 0xFE means "stream idle, ignore this byte" at the link level, so a party
//! block may not carry it. The sender rewrites each 0xFE to 0xFF and records
//! its position in a separate 200-byte patch list:
//!
//! ```text
//! [0xFD 0xFD 0xFD] [section 1 offsets...] 0xFF [section 2 offsets...] 0xFF
//! ```
//!
//! Offsets are 1-indexed; section 1 covers `data[..split]`, section 2 covers
//! `data[split..]`. The receiver walks the list and restores 0xFE in place.

use crate::protocol::{
    PATCH_LIST_SIZE, SERIAL_NO_DATA_BYTE, SERIAL_PATCH_TERM, SERIAL_PREAMBLE_BYTE,
};

/// Scrub `data` of 0xFE bytes, recording their positions in `patch`.
/// Writes that would overflow the 200-byte list are silently dropped; no
/// real party block comes close to that bound.
pub fn build(data: &mut [u8], patch: &mut [u8; PATCH_LIST_SIZE], split: usize) {
    patch.fill(0);
    patch[0] = SERIAL_PREAMBLE_BYTE;
    patch[1] = SERIAL_PREAMBLE_BYTE;
    patch[2] = SERIAL_PREAMBLE_BYTE;

    let mut idx = 3;

    // Section 1: data[..split]
    let end1 = split.min(data.len());
    for i in 0..end1 {
        if idx >= PATCH_LIST_SIZE - 2 {
            break;
        }
        if data[i] == SERIAL_NO_DATA_BYTE {
            patch[idx] = (i + 1) as u8;
            idx += 1;
            data[i] = SERIAL_PATCH_TERM;
        }
    }
    if idx < PATCH_LIST_SIZE - 1 {
        patch[idx] = SERIAL_PATCH_TERM;
        idx += 1;
    }

    // Section 2: data[split..]
    for i in split..data.len() {
        if idx >= PATCH_LIST_SIZE - 1 {
            break;
        }
        if data[i] == SERIAL_NO_DATA_BYTE {
            patch[idx] = (i - split + 1) as u8;
            idx += 1;
            data[i] = SERIAL_PATCH_TERM;
        }
    }
    if idx < PATCH_LIST_SIZE {
        patch[idx] = SERIAL_PATCH_TERM;
    }
}

/// Restore the 0xFE bytes listed in `patch`. Parsing stops at the second
/// 0xFF terminator or the end of the list, whichever comes first; framing
/// bytes (0x00, 0xFD, 0xFE) inside the list are skipped.
pub fn apply(data: &mut [u8], patch: &[u8; PATCH_LIST_SIZE], split: usize) {
    let mut idx = 0;
    while idx < PATCH_LIST_SIZE && patch[idx] == SERIAL_PREAMBLE_BYTE {
        idx += 1;
    }

    let mut in_section_2 = false;
    let mut base = 0usize;

    while idx < PATCH_LIST_SIZE {
        let val = patch[idx];
        idx += 1;

        match val {
            SERIAL_PATCH_TERM => {
                if in_section_2 {
                    break;
                }
                in_section_2 = true;
                base = split;
            }
            0x00 | SERIAL_PREAMBLE_BYTE | SERIAL_NO_DATA_BYTE => {}
            v => {
                let offset = base + (v as usize - 1);
                if offset < data.len() {
                    data[offset] = SERIAL_NO_DATA_BYTE;
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PATCH_DATA_SPLIT;

    fn round_trip(original: &[u8], split: usize) {
        let mut data = original.to_vec();
        let mut patch = [0u8; PATCH_LIST_SIZE];
        build(&mut data, &mut patch, split);

        assert!(
            !data.contains(&SERIAL_NO_DATA_BYTE),
            "build left a 0xFE byte behind"
        );

        apply(&mut data, &patch, split);
        assert_eq!(data, original, "apply(build(d)) != d");
    }

    #[test]
    fn test_round_trip_empty() {
        round_trip(&[], PATCH_DATA_SPLIT);
    }

    #[test]
    fn test_round_trip_no_escapes() {
        round_trip(&[0x00, 0x11, 0x22, 0xFD, 0xFF], PATCH_DATA_SPLIT);
    }

    #[test]
    fn test_round_trip_boundary_positions() {
        // 0xFE at the first byte, both sides of the split, and the last byte.
        let mut data = vec![0x42u8; 300];
        data[0] = 0xFE;
        data[251] = 0xFE;
        data[252] = 0xFE;
        data[299] = 0xFE;
        round_trip(&data, PATCH_DATA_SPLIT);
    }

    #[test]
    fn test_round_trip_data_exactly_at_split() {
        let mut data = vec![0x10u8; 252];
        data[0] = 0xFE;
        data[251] = 0xFE;
        round_trip(&data, PATCH_DATA_SPLIT);
    }

    #[test]
    fn test_round_trip_every_length_up_to_500() {
        for len in [1usize, 2, 100, 252, 253, 418, 444, 500] {
            let mut data = vec![0u8; len];
            for (i, b) in data.iter_mut().enumerate() {
                *b = (i % 251) as u8;
            }
            if len > 3 {
                data[len / 2] = 0xFE;
                data[len - 1] = 0xFE;
            }
            round_trip(&data, PATCH_DATA_SPLIT);
        }
    }

    #[test]
    fn test_build_layout() {
        // 253 bytes: escapes at offsets 1 (section 1) and 252 (section 2).
        let mut data = vec![0x00u8; 253];
        data[0] = 0xAA;
        data[1] = 0xFE;
        data[2] = 0xBB;
        data[252] = 0xFE;
        let original = data.clone();

        let mut patch = [0u8; PATCH_LIST_SIZE];
        build(&mut data, &mut patch, PATCH_DATA_SPLIT);

        assert_eq!(data[1], 0xFF);
        assert_eq!(data[252], 0xFF);
        assert_eq!(&patch[0..3], &[0xFD, 0xFD, 0xFD]);
        assert_eq!(patch[3], 2, "section 1 offset is 1-indexed");
        assert_eq!(patch[4], 0xFF);
        assert_eq!(patch[5], 1, "section 2 offset restarts at the split");
        assert_eq!(patch[6], 0xFF);

        apply(&mut data, &patch, PATCH_DATA_SPLIT);
        assert_eq!(data, original);
    }

    #[test]
    fn test_apply_skips_framing_bytes() {
        let mut data = vec![0x00u8; 16];
        // Preamble, a framing 0x00 and 0xFD mid-list, then offset 5.
        let mut patch = [0u8; PATCH_LIST_SIZE];
        patch[0] = 0xFD;
        patch[1] = 0xFD;
        patch[2] = 0xFD;
        patch[3] = 0x00;
        patch[4] = 0xFD;
        patch[5] = 5;
        patch[6] = 0xFF;
        patch[7] = 0xFF;

        apply(&mut data, &patch, PATCH_DATA_SPLIT);
        assert_eq!(data[4], 0xFE);
        assert_eq!(data.iter().filter(|&&b| b == 0xFE).count(), 1);
    }

    #[test]
    fn test_apply_stops_after_second_terminator() {
        let mut data = vec![0x00u8; 16];
        let mut patch = [0u8; PATCH_LIST_SIZE];
        patch[0] = 0xFD;
        patch[1] = 0xFF;
        patch[2] = 0xFF;
        // Garbage after the terminator pair must be ignored.
        patch[3] = 1;
        patch[4] = 2;

        apply(&mut data, &patch, PATCH_DATA_SPLIT);
        assert!(data.iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_apply_ignores_out_of_range_offsets() {
        let mut data = vec![0x00u8; 4];
        let mut patch = [0u8; PATCH_LIST_SIZE];
        patch[0] = 0xFD;
        patch[1] = 200; // beyond the 4-byte buffer
        patch[2] = 0xFF;
        patch[3] = 0xFF;

        apply(&mut data, &patch, PATCH_DATA_SPLIT);
        assert!(data.iter().all(|&b| b == 0x00));
    }
}
