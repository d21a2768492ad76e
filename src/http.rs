//! JSON API surface over the engine.
//!
//! Handlers do no domain work themselves: request bodies go through
//! [`crate::validate`], checked values into the engine, and engine
//! errors map onto HTTP statuses in one place.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{MatchedPath, Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use crate::engine::{Engine, EngineError, SortField, SortOrder};
use crate::model::{BookingInfo, RoomInfo};
use crate::observability;
use crate::validate::{self, format_price, BookingDraft, RoomDraft, ValidateError};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

pub fn create_router(state: AppState) -> Router {
    let room_routes = Router::new()
        .route("/add", post(create_room))
        .route("/delete/:room_id", delete(delete_room))
        .route("/list", get(list_rooms));

    let booking_routes = Router::new()
        .route("/add", post(create_booking))
        .route("/delete/:booking_id", delete(delete_booking))
        .route("/list", get(list_bookings));

    Router::new()
        .nest("/rooms", room_routes)
        .nest("/bookings", booking_routes)
        .layer(middleware::from_fn(track_requests))
        .with_state(state)
}

// ── Error mapping ───────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    Validate(ValidateError),
    Engine(EngineError),
    InvalidJson,
    MissingRoomParam,
    InvalidRoomParam,
    RoomNotFound,
    BookingNotFound,
}

impl From<ValidateError> for ApiError {
    fn from(e: ValidateError) -> Self {
        ApiError::Validate(e)
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError::Engine(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validate(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Engine(e) => engine_response(e),
            ApiError::InvalidJson => (StatusCode::BAD_REQUEST, "Invalid JSON".to_owned()),
            ApiError::MissingRoomParam => (
                StatusCode::BAD_REQUEST,
                "room_id parameter is required".to_owned(),
            ),
            ApiError::InvalidRoomParam => {
                (StatusCode::BAD_REQUEST, "room_id must be an integer".to_owned())
            }
            ApiError::RoomNotFound => (StatusCode::NOT_FOUND, "Room not found".to_owned()),
            ApiError::BookingNotFound => {
                (StatusCode::NOT_FOUND, "Booking not found".to_owned())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Map an engine error to a status and client-facing message.
fn engine_response(e: EngineError) -> (StatusCode, String) {
    match e {
        EngineError::RoomNotFound(_) => (StatusCode::NOT_FOUND, "Room not found".to_owned()),
        EngineError::BookingNotFound(_) => {
            (StatusCode::NOT_FOUND, "Booking not found".to_owned())
        }
        EngineError::Conflict(_) => (
            StatusCode::BAD_REQUEST,
            "Room already booked for these dates".to_owned(),
        ),
        EngineError::InvalidSpan(_) | EngineError::LimitExceeded(_) => {
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        EngineError::WalError(_) => {
            tracing::error!("storage failure: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal storage error".to_owned(),
            )
        }
    }
}

// ── Room handlers ───────────────────────────────────────────────

async fn create_room(
    State(state): State<AppState>,
    payload: Result<Json<RoomDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(draft) = payload.map_err(|_| ApiError::InvalidJson)?;
    let (description, price_cents) = validate::validate_room(draft)?;
    let room = state.engine.create_room(description, price_cents).await?;
    metrics::gauge!(observability::ROOMS).increment(1.0);
    info!("room {} created", room.id);
    Ok((StatusCode::CREATED, Json(json!({ "id": room.id }))))
}

async fn delete_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    // Non-numeric ids never match a room, so they 404 like any other miss.
    let room_id: i64 = room_id.parse().map_err(|_| ApiError::RoomNotFound)?;
    state.engine.delete_room(room_id).await?;
    metrics::gauge!(observability::ROOMS).decrement(1.0);
    info!("room {room_id} deleted");
    Ok(Json(json!({ "status": "deleted", "room_id": room_id })))
}

async fn list_rooms(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let sort = SortField::parse(params.get("sort").map_or("id", String::as_str));
    let order = SortOrder::parse(params.get("order").map_or("asc", String::as_str));
    let rooms = state.engine.list_rooms(sort, order).await;
    Json(Value::Array(rooms.iter().map(room_json).collect()))
}

// ── Booking handlers ────────────────────────────────────────────

async fn create_booking(
    State(state): State<AppState>,
    payload: Result<Json<BookingDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(draft) = payload.map_err(|_| ApiError::InvalidJson)?;
    let today = Utc::now().date_naive();
    let (room_id, span) = validate::validate_booking(draft, today)?;
    let booking = state.engine.create_booking(room_id, span).await?;
    info!("booking {} admitted for room {room_id}", booking.id);
    Ok((StatusCode::CREATED, Json(json!({ "id": booking.id }))))
}

async fn delete_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let booking_id: i64 = booking_id.parse().map_err(|_| ApiError::BookingNotFound)?;
    let room_id = state.engine.delete_booking(booking_id).await?;
    info!("booking {booking_id} cancelled for room {room_id}");
    Ok(Json(json!({ "status": "deleted", "booking_id": booking_id })))
}

async fn list_bookings(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let raw = params
        .get("room_id")
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingRoomParam)?;
    let room_id: i64 = raw.parse().map_err(|_| ApiError::InvalidRoomParam)?;
    let bookings = state.engine.list_bookings(room_id).await?;
    Ok(Json(Value::Array(bookings.iter().map(booking_json).collect())))
}

// ── JSON shapes ─────────────────────────────────────────────────

fn room_json(room: &RoomInfo) -> Value {
    json!({
        "id": room.id,
        "description": room.description,
        "price_per_night": format_price(room.price_cents),
        "created_at": room.created_at.to_rfc3339(),
    })
}

fn booking_json(booking: &BookingInfo) -> Value {
    json!({
        "id": booking.id,
        "start_date": booking.start.to_string(),
        "end_date": booking.end.to_string(),
    })
}

// ── Request metrics ─────────────────────────────────────────────

async fn track_requests(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let op = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| observability::op_label(req.method().as_str(), p.as_str()))
        .unwrap_or("other");

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!(observability::REQUESTS_TOTAL, "op" => op, "status" => status)
        .increment(1);
    metrics::histogram!(observability::REQUEST_DURATION_SECONDS, "op" => op)
        .record(started.elapsed().as_secs_f64());
    response
}
