use axum::{
  extract::{Query, State, WebSocketUpgrade},
  http::{Method, StatusCode},
  response::IntoResponse,
  routing::get,
  Json, Router,
};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

mod app;
mod game;
mod protocol;
mod shared;
mod transport;

use app::config::{ServerConfig, MAX_LEADERBOARD_LIMIT};
use app::scores::{LeaderboardEntry, ScoreStore};
use game::room::{FinishedRun, Room, RoomSummary};
use transport::ws_session::handle_socket;

struct AppState {
  rooms: DashMap<String, Arc<Room>>,
  store: ScoreStore,
  config: ServerConfig,
  results: UnboundedSender<FinishedRun>,
}

#[derive(Debug, Serialize)]
struct LeaderboardResponse {
  scores: Vec<LeaderboardEntry>,
}

#[derive(Debug, Serialize)]
struct HighScoreResponse {
  ok: bool,
  #[serde(rename = "highScore")]
  high_score: i64,
}

#[derive(Debug, Serialize)]
struct RoomsResponse {
  rooms: Vec<RoomSummary>,
}

#[derive(Debug, Serialize)]
struct OkResponse {
  ok: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
  ok: bool,
  error: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let config = ServerConfig::from_env();
  let store = ScoreStore::connect(&config.database_url).await?;

  let (results, runs) = mpsc::unbounded_channel::<FinishedRun>();
  tokio::spawn(app::scores::record_runs(store.clone(), runs));

  let port = config.port;
  let state = Arc::new(AppState {
    rooms: DashMap::new(),
    store,
    config,
    results,
  });

  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET])
    .allow_headers(Any);

  let app: Router = Router::new()
    .route("/api/health", get(health))
    .route("/api/high-score", get(high_score))
    .route("/api/leaderboard", get(leaderboard))
    .route("/api/rooms", get(rooms))
    .route("/api/play", get(ws_handler))
    .layer(cors)
    .with_state(state);

  let address = format!("0.0.0.0:{port}");
  tracing::info!("listening on {address}");

  let listener = tokio::net::TcpListener::bind(&address).await?;
  axum::serve(listener, app).await?;

  Ok(())
}

fn error_response(status: StatusCode, error: &str) -> axum::response::Response {
  (
    status,
    Json(ErrorResponse {
      ok: false,
      error: error.to_string(),
    }),
  )
    .into_response()
}

async fn health() -> impl IntoResponse {
  Json(OkResponse { ok: true })
}

async fn high_score(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  match state.store.best_score().await {
    Ok(high_score) => Json(HighScoreResponse {
      ok: true,
      high_score,
    })
    .into_response(),
    Err(error) => {
      tracing::warn!(?error, "high score lookup failed");
      error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load high score")
    }
  }
}

async fn leaderboard(
  State(state): State<Arc<AppState>>,
  Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
  let limit = params
    .get("limit")
    .and_then(|value| value.parse::<i64>().ok())
    .unwrap_or(state.config.leaderboard_limit)
    .clamp(1, MAX_LEADERBOARD_LIMIT);

  match state.store.leaderboard(limit).await {
    Ok(scores) => (StatusCode::OK, Json(LeaderboardResponse { scores })).into_response(),
    Err(error) => {
      tracing::warn!(?error, "leaderboard query failed");
      error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to load leaderboard")
    }
  }
}

async fn rooms(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let handles: Vec<Arc<Room>> = state.rooms.iter().map(|entry| entry.value().clone()).collect();
  let mut rooms = Vec::with_capacity(handles.len());
  for room in handles {
    rooms.push(room.summary().await);
  }
  Json(RoomsResponse { rooms })
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let high_score = match state.store.best_score().await {
    Ok(score) => score,
    Err(error) => {
      tracing::warn!(?error, "high score lookup failed, starting from zero");
      0
    }
  };

  let room_id = uuid::Uuid::new_v4().to_string();
  let (tx, rx) = mpsc::unbounded_channel::<Vec<u8>>();
  let room = Arc::new(Room::new(
    room_id.clone(),
    state.config.session_defaults(),
    high_score,
    tx,
    state.results.clone(),
  ));

  ws.on_upgrade(move |socket| async move {
    state.rooms.insert(room_id.clone(), room.clone());
    tracing::debug!(room_id = %room_id, rooms = state.rooms.len(), "room opened");
    handle_socket(socket, room, rx).await;
    state.rooms.remove(&room_id);
    tracing::debug!(room_id = %room_id, "room closed");
  })
}
