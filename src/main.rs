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

// Game Boy link-cable trade partner
mod context;
mod controller;
mod led;
mod link;
mod party;
mod patch;
mod protocol;
mod server;
mod session;
mod species;
mod storage;
mod text;
mod trade_centre;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use context::TradeContext;
use controller::SessionController;
use led::{Indicator, IndicatorPin, NullPin, SysfsLedPin};
use link::{LinkCable, SysfsPins};
use server::AppState;
use session::TradeSession;
use storage::Store;

#[derive(Parser)]
#[command(name = "poketrade")]
#[command(about = "Link-cable trade partner for Gen 1/2 Pokemon games", long_about = None)]
struct Cli {
    /// GPIO number of the clock line (driven by the Game Boy)
    #[arg(long, default_value = "7")]
    clock_pin: u32,

    /// GPIO number of the line the Game Boy drives
    #[arg(long, default_value = "6")]
    input_pin: u32,

    /// GPIO number of the line we drive
    #[arg(long, default_value = "5")]
    output_pin: u32,

    /// GPIO number of the status LED, if one is wired
    #[arg(long)]
    led_pin: Option<u32>,

    /// Path of the slot-storage file
    #[arg(long, default_value = "poketrade.json", env = "POKETRADE_STORE")]
    store: PathBuf,

    /// Control-plane listen address
    #[arg(long, default_value = "0.0.0.0:8080", env = "POKETRADE_LISTEN")]
    listen: String,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        clock = cli.clock_pin,
        input = cli.input_pin,
        output = cli.output_pin,
        "poketrade starting"
    );

    let store = Store::open(cli.store.clone());
    let ctx = Arc::new(TradeContext::new());
    ctx.trade_mode
        .store(store.mode().code(), std::sync::atomic::Ordering::Relaxed);
    let store = Arc::new(Mutex::new(store));

    let pins = match SysfsPins::open(cli.clock_pin, cli.input_pin, cli.output_pin) {
        Ok(pins) => pins,
        Err(e) => {
            eprintln!("Failed to open link GPIO pins: {}", e);
            std::process::exit(1);
        }
    };

    let led: Box<dyn IndicatorPin> = match cli.led_pin {
        Some(pin) => match SysfsLedPin::open(pin) {
            Ok(led) => Box::new(led),
            Err(e) => {
                eprintln!("Failed to open LED pin {}: {}", pin, e);
                std::process::exit(1);
            }
        },
        None => Box::new(NullPin),
    };

    // The protocol loop busy-waits on clock edges; give it its own OS
    // thread and keep the async runtime for the control plane.
    let session = TradeSession::new(Arc::clone(&ctx), Arc::clone(&store));
    let mut controller = SessionController::new(
        Box::new(LinkCable::new(Box::new(pins))),
        session,
        Indicator::new(led),
        Arc::clone(&ctx),
    );
    std::thread::spawn(move || controller.run());

    let listener = match tokio::net::TcpListener::bind(&cli.listen).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind {}: {}", cli.listen, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server::serve(listener, AppState { ctx, store }).await {
        eprintln!("Control-plane server failed: {}", e);
        std::process::exit(1);
    }
}
