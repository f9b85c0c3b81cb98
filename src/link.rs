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

use std::time::{Duration, Instant};

/// Per-edge wait bound. The Game Boy clocks around 8 kHz but pauses the
/// clock between protocol phases, so this is deliberately generous.
pub const EDGE_TIMEOUT: Duration = Duration::from_millis(500);

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, PartialEq, Eq)]
pub enum LinkError {
    /// The clock line did not move within the per-edge timeout.
    EdgeTimeout,
}

impl std::fmt::Display for LinkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkError::EdgeTimeout => write!(f, "timed out waiting for a clock edge"),
        }
    }
}

impl std::error::Error for LinkError {}

// ============================================================================
// Pin-Level Trait
// ============================================================================

/// Raw access to the three link-cable lines. The Game Boy owns the clock;
/// we only ever read it.
pub trait LinkPins: Send {
    /// Current clock line level (idle high).
    fn clock(&mut self) -> bool;

    /// Current level of the line driven by the Game Boy.
    fn input(&mut self) -> bool;

    /// Drive the line the Game Boy samples.
    fn set_output(&mut self, high: bool);
}

// ============================================================================
// Byte-Level Trait
// ============================================================================

/// Byte-granular link operations needed by the session controller.
pub trait LinkPort: Send {
    /// Exchange one byte with the peer. The peer clocks both directions
    /// simultaneously; `send` goes out while the returned byte comes in.
    fn transfer(&mut self, send: u8) -> Result<u8, LinkError>;

    /// True when no clock activity has been observed for `idle`.
    fn is_idle(&mut self, idle: Duration) -> bool;
}

// ============================================================================
// Bit-Banged Link Cable
// ============================================================================

/// Slave side of the link cable: reacts to the peer's clock, one bit per
/// full clock cycle, MSB first.
pub struct LinkCable {
    pins: Box<dyn LinkPins>,
    edge_timeout: Duration,
    last_activity: Instant,
    prev_clock: Option<bool>,
}

impl LinkCable {
    pub fn new(pins: Box<dyn LinkPins>) -> Self {
        Self::with_edge_timeout(pins, EDGE_TIMEOUT)
    }

    pub fn with_edge_timeout(pins: Box<dyn LinkPins>, edge_timeout: Duration) -> Self {
        LinkCable {
            pins,
            edge_timeout,
            last_activity: Instant::now(),
            prev_clock: None,
        }
    }

    /// Busy-wait until the clock line reads `level`. No allocation, no
    /// logging: this is the hot path during a transfer.
    fn wait_for_clock(&mut self, level: bool) -> Result<(), LinkError> {
        let start = Instant::now();
        while self.pins.clock() != level {
            if start.elapsed() > self.edge_timeout {
                return Err(LinkError::EdgeTimeout);
            }
        }
        Ok(())
    }

    /// Block up to `timeout` for any clock transition.
    pub fn wait_for_activity(&mut self, timeout: Duration) -> bool {
        let start = Instant::now();
        let mut last = self.pins.clock();
        while start.elapsed() < timeout {
            let current = self.pins.clock();
            if current != last {
                self.last_activity = Instant::now();
                return true;
            }
            last = current;
        }
        false
    }
}

impl LinkPort for LinkCable {
    fn transfer(&mut self, mut send: u8) -> Result<u8, LinkError> {
        let mut received = 0u8;

        for bit in (0..8).rev() {
            // Falling edge: the master is about to shift.
            self.wait_for_clock(false)?;

            // Present our bit while the clock is low.
            self.pins.set_output(send & 0x80 != 0);
            send <<= 1;

            // Rising edge: both sides sample.
            self.wait_for_clock(true)?;
            if self.pins.input() {
                received |= 1 << bit;
            }
        }

        self.last_activity = Instant::now();
        Ok(received)
    }

    fn is_idle(&mut self, idle: Duration) -> bool {
        let current = self.pins.clock();
        if let Some(prev) = self.prev_clock {
            if current != prev {
                self.last_activity = Instant::now();
            }
        }
        self.prev_clock = Some(current);
        self.last_activity.elapsed() >= idle
    }
}

// ============================================================================
// Sysfs GPIO Pins
// ============================================================================

/// `/sys/class/gpio` backed pins for Linux single-board computers.
/// Register-level access stays outside this crate; anything exposing these
/// three lines can implement [`LinkPins`] instead.
pub struct SysfsPins {
    clock: std::fs::File,
    input: std::fs::File,
    output: std::fs::File,
}

impl SysfsPins {
    pub fn open(clock_pin: u32, input_pin: u32, output_pin: u32) -> std::io::Result<Self> {
        export(clock_pin, "in")?;
        export(input_pin, "in")?;
        export(output_pin, "out")?;

        Ok(SysfsPins {
            clock: value_file(clock_pin, false)?,
            input: value_file(input_pin, false)?,
            output: value_file(output_pin, true)?,
        })
    }
}

impl LinkPins for SysfsPins {
    fn clock(&mut self) -> bool {
        read_level(&mut self.clock)
    }

    fn input(&mut self) -> bool {
        read_level(&mut self.input)
    }

    fn set_output(&mut self, high: bool) {
        use std::io::{Seek, SeekFrom, Write};
        let _ = self.output.seek(SeekFrom::Start(0));
        let _ = self.output.write_all(if high { b"1" } else { b"0" });
    }
}

pub(crate) fn export(pin: u32, direction: &str) -> std::io::Result<()> {
    use std::io::Write;

    let path = format!("/sys/class/gpio/gpio{}", pin);
    if !std::path::Path::new(&path).exists() {
        let mut f = std::fs::OpenOptions::new()
            .write(true)
            .open("/sys/class/gpio/export")?;
        // EBUSY means another process exported it first; that is fine.
        match f.write_all(pin.to_string().as_bytes()) {
            Ok(()) => {}
            Err(e) if e.raw_os_error() == Some(16) => {}
            Err(e) => return Err(e),
        }
    }

    std::fs::write(format!("{}/direction", path), direction)
}

pub(crate) fn value_file(pin: u32, writable: bool) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .read(true)
        .write(writable)
        .open(format!("/sys/class/gpio/gpio{}/value", pin))
}

fn read_level(file: &mut std::fs::File) -> bool {
    use std::io::{Read, Seek, SeekFrom};
    let mut buf = [0u8; 1];
    if file.seek(SeekFrom::Start(0)).is_err() {
        return false;
    }
    match file.read(&mut buf) {
        Ok(1) => buf[0] == b'1',
        _ => false,
    }
}

// ============================================================================
// Mock Link Port for Testing
// ============================================================================

#[cfg(test)]
pub struct MockLinkPort {
    // Bytes the peer clocks in (None = edge timeout this cycle)
    responses: Vec<Option<u8>>,
    pos: usize,
    // Bytes we clocked out, checked on drop
    write_log: Vec<u8>,
    expected_writes: Vec<u8>,
}

#[cfg(test)]
impl MockLinkPort {
    pub fn new(responses: Vec<Option<u8>>, expected_writes: Vec<u8>) -> Self {
        MockLinkPort {
            responses,
            pos: 0,
            write_log: Vec::new(),
            expected_writes,
        }
    }
}

#[cfg(test)]
impl LinkPort for MockLinkPort {
    fn transfer(&mut self, send: u8) -> Result<u8, LinkError> {
        if self.pos >= self.responses.len() {
            return Err(LinkError::EdgeTimeout);
        }
        match self.responses[self.pos] {
            None => {
                self.pos += 1;
                Err(LinkError::EdgeTimeout)
            }
            Some(byte) => {
                self.pos += 1;
                self.write_log.push(send);
                Ok(byte)
            }
        }
    }

    fn is_idle(&mut self, _idle: Duration) -> bool {
        // The scripted session is over once every response is consumed.
        self.pos >= self.responses.len()
    }
}

#[cfg(test)]
impl Drop for MockLinkPort {
    fn drop(&mut self) {
        assert_eq!(
            self.pos,
            self.responses.len(),
            "MockLinkPort dropped with {} unconsumed responses",
            self.responses.len() - self.pos
        );

        assert_eq!(
            &self.write_log, &self.expected_writes,
            "MockLinkPort write log mismatch!\nExpected {} bytes:\n{:02X?}\nGot {} bytes:\n{:02X?}",
            self.expected_writes.len(),
            self.expected_writes,
            self.write_log.len(),
            self.write_log
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
