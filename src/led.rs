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

//! Status LED patterns.
//!
//! Mapping used by the protocol core: slow blink while idle, double blink
//! once connected, triple blink inside the Trade Centre, fast blink during
//! the data exchange, very fast blink on errors.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedPattern {
    Off,
    Solid,
    SlowBlink,
    FastBlink,
    DoubleBlink,
    TripleBlink,
    VeryFastBlink,
}

impl LedPattern {
    pub fn code(self) -> u8 {
        match self {
            LedPattern::Off => 0,
            LedPattern::Solid => 1,
            LedPattern::SlowBlink => 2,
            LedPattern::FastBlink => 3,
            LedPattern::DoubleBlink => 4,
            LedPattern::TripleBlink => 5,
            LedPattern::VeryFastBlink => 6,
        }
    }

    pub fn from_code(code: u8) -> LedPattern {
        match code {
            1 => LedPattern::Solid,
            2 => LedPattern::SlowBlink,
            3 => LedPattern::FastBlink,
            4 => LedPattern::DoubleBlink,
            5 => LedPattern::TripleBlink,
            6 => LedPattern::VeryFastBlink,
            _ => LedPattern::Off,
        }
    }
}

/// Whether the LED is lit `elapsed` into a pattern.
pub fn is_lit(pattern: LedPattern, elapsed: Duration) -> bool {
    let ms = elapsed.as_millis() as u64;
    match pattern {
        LedPattern::Off => false,
        LedPattern::Solid => true,
        LedPattern::SlowBlink => (ms / 1000) % 2 == 0,
        LedPattern::FastBlink => (ms / 100) % 2 == 0,
        LedPattern::VeryFastBlink => (ms / 50) % 2 == 0,
        LedPattern::DoubleBlink => {
            // Two quick flashes every 2 seconds
            let pos = ms % 2000;
            pos < 100 || (200..300).contains(&pos)
        }
        LedPattern::TripleBlink => {
            // Three quick flashes every 2 seconds
            let pos = ms % 2000;
            pos < 100 || (200..300).contains(&pos) || (400..500).contains(&pos)
        }
    }
}

// ============================================================================
// Indicator Pin
// ============================================================================

pub trait IndicatorPin: Send {
    fn set(&mut self, on: bool);
}

/// No LED wired up.
pub struct NullPin;

impl IndicatorPin for NullPin {
    fn set(&mut self, _on: bool) {}
}

/// Sysfs-backed LED output.
pub struct SysfsLedPin {
    value: std::fs::File,
}

impl SysfsLedPin {
    pub fn open(pin: u32) -> std::io::Result<Self> {
        crate::link::export(pin, "out")?;
        Ok(SysfsLedPin {
            value: crate::link::value_file(pin, true)?,
        })
    }
}

impl IndicatorPin for SysfsLedPin {
    fn set(&mut self, on: bool) {
        use std::io::{Seek, SeekFrom, Write};
        let _ = self.value.seek(SeekFrom::Start(0));
        let _ = self.value.write_all(if on { b"1" } else { b"0" });
    }
}

// ============================================================================
// Indicator
// ============================================================================

/// Drives a pin from the current pattern. Only writes on level changes.
pub struct Indicator {
    pin: Box<dyn IndicatorPin>,
    pattern: LedPattern,
    started: Instant,
    lit: bool,
}

impl Indicator {
    pub fn new(pin: Box<dyn IndicatorPin>) -> Indicator {
        Indicator {
            pin,
            pattern: LedPattern::Off,
            started: Instant::now(),
            lit: false,
        }
    }

    /// Switch pattern; the phase restarts so double/triple flashes stay
    /// aligned to the switch.
    pub fn set_pattern(&mut self, pattern: LedPattern) {
        if pattern != self.pattern {
            self.pattern = pattern;
            self.started = Instant::now();
            self.lit = false;
            self.pin.set(false);
        }
    }

    pub fn update(&mut self) {
        let on = is_lit(self.pattern, self.started.elapsed());
        if on != self.lit {
            self.lit = on;
            self.pin.set(on);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
