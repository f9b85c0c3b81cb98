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

//! Control-plane HTTP API.
//!
//! Read-mostly status plus the handful of user intents the protocol loop
//! consumes: which slot to offer, confirm/decline, auto-confirm, and the
//! trade mode. Everything crosses the thread boundary through the
//! word-sized `TradeContext` fields or the storage mutex.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::context::TradeContext;
use crate::party::{self, Generation};
use crate::protocol::PARTY_LENGTH;
use crate::session::{ConnectionState, TradeCentreState};
use crate::species;
use crate::storage::{Store, TradeMode};
use crate::text;

#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<TradeContext>,
    pub store: Arc<Mutex<Store>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/opponent", get(opponent))
        .route("/api/pokemon/:gen", get(list_pokemon))
        .route("/api/pokemon/:gen/:slot", delete(delete_pokemon))
        .route("/api/mode", post(set_mode))
        .route("/api/trade/offer", post(trade_offer))
        .route("/api/trade/confirm", post(trade_confirm))
        .route("/api/trade/decline", post(trade_decline))
        .route("/api/trade/auto", post(trade_auto))
        .with_state(state)
}

pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    info!("control plane listening on {:?}", listener.local_addr());
    axum::serve(listener, router(state).into_make_service()).await
}

fn parse_gen(param: &str) -> Generation {
    match param {
        "gen1" | "1" => Generation::Gen1,
        _ => Generation::Gen2,
    }
}

// ============================================================================
// Read Side
// ============================================================================

#[derive(Serialize)]
struct StatusReport {
    mode: &'static str,
    conn: &'static str,
    tc: &'static str,
    gen: &'static str,
    gb_selection: i8,
    offer_slot: u8,
    auto_confirm: bool,
    opponent_count: u8,
}

async fn status(State(state): State<AppState>) -> Json<StatusReport> {
    let ctx = &state.ctx;
    Json(StatusReport {
        mode: TradeMode::from_code(ctx.trade_mode.load(Ordering::Relaxed)).label(),
        conn: ConnectionState::from_code(ctx.conn_state.load(Ordering::Relaxed)).label(),
        tc: TradeCentreState::from_code(ctx.tc_state.load(Ordering::Relaxed)).label(),
        gen: Generation::from_code(ctx.gen.load(Ordering::Relaxed)).label(),
        gb_selection: ctx.gb_selection.load(Ordering::Relaxed),
        offer_slot: ctx.offer_slot.load(Ordering::Relaxed),
        auto_confirm: ctx.auto_confirm.load(Ordering::Relaxed),
        opponent_count: ctx.opponent_count.load(Ordering::Relaxed),
    })
}

#[derive(Serialize)]
struct OpponentSlot {
    slot: usize,
    species: u8,
    species_name: &'static str,
    level: u8,
    nickname: String,
}

async fn opponent(State(state): State<AppState>) -> Json<Vec<OpponentSlot>> {
    let ctx = &state.ctx;
    let gen = Generation::from_code(ctx.gen.load(Ordering::Relaxed));
    let count = (ctx.opponent_count.load(Ordering::Relaxed) as usize).min(PARTY_LENGTH);

    let slots = (0..count)
        .map(|i| {
            let species = ctx.opponent_species[i].load(Ordering::Relaxed);
            OpponentSlot {
                slot: i,
                species,
                species_name: species::name(gen, species),
                level: ctx.opponent_levels[i].load(Ordering::Relaxed),
                nickname: text::decode_name(&ctx.opponent_nickname(i)),
            }
        })
        .collect();
    Json(slots)
}

#[derive(Serialize)]
struct StoredSlot {
    slot: usize,
    occupied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    species: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    species_name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nickname: Option<String>,
}

async fn list_pokemon(
    State(state): State<AppState>,
    Path(gen): Path<String>,
) -> Json<Vec<StoredSlot>> {
    let gen = parse_gen(&gen);
    let store = state.store.lock().unwrap_or_else(|e| e.into_inner());

    let slots = store
        .party(gen)
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            if slot.occupied {
                StoredSlot {
                    slot: i,
                    occupied: true,
                    species: Some(slot.species),
                    species_name: Some(species::name(gen, slot.species)),
                    level: Some(party::mon_level(&slot.mon, gen)),
                    nickname: Some(text::decode_name(&slot.nickname)),
                }
            } else {
                StoredSlot {
                    slot: i,
                    occupied: false,
                    species: None,
                    species_name: None,
                    level: None,
                    nickname: None,
                }
            }
        })
        .collect();
    Json(slots)
}

// ============================================================================
// Write Side
// ============================================================================

#[derive(Serialize)]
struct Acknowledged {
    ok: bool,
}

fn ok() -> Json<Acknowledged> {
    Json(Acknowledged { ok: true })
}

async fn delete_pokemon(
    State(state): State<AppState>,
    Path((gen, slot)): Path<(String, usize)>,
) -> impl IntoResponse {
    if slot >= PARTY_LENGTH {
        return (StatusCode::BAD_REQUEST, "invalid slot").into_response();
    }
    state
        .store
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .clear_slot(parse_gen(&gen), slot);
    ok().into_response()
}

#[derive(Deserialize)]
struct ModeBody {
    mode: String,
}

async fn set_mode(State(state): State<AppState>, Json(body): Json<ModeBody>) -> Json<Acknowledged> {
    let mode = match body.mode.as_str() {
        "storage" => TradeMode::Storage,
        _ => TradeMode::Clone,
    };
    state.ctx.trade_mode.store(mode.code(), Ordering::Relaxed);
    state
        .store
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .set_mode(mode);
    ok()
}

#[derive(Deserialize)]
struct OfferBody {
    slot: u8,
}

async fn trade_offer(State(state): State<AppState>, Json(body): Json<OfferBody>) -> impl IntoResponse {
    if body.slot as usize >= PARTY_LENGTH {
        return (StatusCode::BAD_REQUEST, "invalid slot").into_response();
    }
    state.ctx.offer_slot.store(body.slot, Ordering::Relaxed);
    info!(slot = body.slot, "offer slot set");
    ok().into_response()
}

async fn trade_confirm(State(state): State<AppState>) -> Json<Acknowledged> {
    state.ctx.confirm_requested.store(true, Ordering::Relaxed);
    state.ctx.decline_requested.store(false, Ordering::Relaxed);
    ok()
}

async fn trade_decline(State(state): State<AppState>) -> Json<Acknowledged> {
    state.ctx.decline_requested.store(true, Ordering::Relaxed);
    state.ctx.confirm_requested.store(false, Ordering::Relaxed);
    ok()
}

#[derive(Deserialize)]
struct AutoBody {
    auto: bool,
}

async fn trade_auto(State(state): State<AppState>, Json(body): Json<AutoBody>) -> Json<Acknowledged> {
    state.ctx.auto_confirm.store(body.auto, Ordering::Relaxed);
    ok()
}

// ============================================================================
// Tests
// ============================================================================
