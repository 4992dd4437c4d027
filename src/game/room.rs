use super::config::{GameSpeed, SessionConfig};
use super::session::GameSession;
use super::types::{Direction, GameEvent, SessionSnapshot, SessionStatus};
use crate::protocol;
use crate::shared::names::sanitize_player_name;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Mutex;


const DEFAULT_PLAYER_NAME: &str = "Player";

#[derive(Debug, Clone, PartialEq)]
pub struct FinishedRun {
  pub room_id: String,
  pub name: String,
  pub score: i64,
  pub tier: usize,
  pub ticks: u64,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RoomSummary {
  pub id: String,
  pub name: String,
  pub playing: bool,
  pub ticking: bool,
  pub score: i64,
  pub tier: usize,
}

#[derive(Debug)]
pub struct Room {
  id: String,
  state: Mutex<RoomState>,
  running: AtomicBool,
}

#[derive(Debug)]
struct RoomState {
  room_id: String,
  sender: UnboundedSender<Vec<u8>>,
  results: UnboundedSender<FinishedRun>,
  defaults: SessionConfig,
  player_name: String,
  session: Option<GameSession>,
  pending_direction: Option<Direction>,
  high_score: i64,
  recorded: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum JsonClientMessage {
  #[serde(rename = "start")]
  Start {
    name: Option<String>,
    settings: Option<serde_json::Value>,
  },
  #[serde(rename = "input")]
  Input { direction: Direction },
  #[serde(rename = "restart")]
  Restart,
}

impl Room {
  pub fn new(
    id: String,
    defaults: SessionConfig,
    high_score: i64,
    sender: UnboundedSender<Vec<u8>>,
    results: UnboundedSender<FinishedRun>,
  ) -> Self {
    Self {
      id: id.clone(),
      state: Mutex::new(RoomState {
        room_id: id,
        sender,
        results,
        defaults,
        player_name: DEFAULT_PLAYER_NAME.to_string(),
        session: None,
        pending_direction: None,
        high_score: high_score.max(0),
        recorded: false,
      }),
      running: AtomicBool::new(false),
    }
  }

  pub fn is_running(&self) -> bool {
    self.running.load(Ordering::SeqCst)
  }

  pub async fn summary(&self) -> RoomSummary {
    let state = self.state.lock().await;
    let session = state.session.as_ref();
    RoomSummary {
      id: self.id.clone(),
      name: state.player_name.clone(),
      playing: session.is_some_and(|session| !session.is_over()),
      ticking: self.is_running(),
      score: session.map(GameSession::score).unwrap_or(0),
      tier: session.map(GameSession::tier).unwrap_or(0),
    }
  }

  pub async fn handle_text_message(self: &Arc<Self>, text: &str) {
    let message = match serde_json::from_str::<JsonClientMessage>(text) {
      Ok(message) => message,
      Err(error) => {
        tracing::debug!(room_id = %self.id, %error, "ignoring malformed message");
        return;
      }
    };
    let message = match message {
      JsonClientMessage::Start { name, settings } => {
        let (settings, speed) = match settings.map(parse_settings).transpose() {
          Ok(Some((settings, speed))) => (Some(settings), speed),
          Ok(None) => (None, None),
          Err(error) => {
            tracing::debug!(room_id = %self.id, %error, "ignoring malformed settings");
            return;
          }
        };
        protocol::ClientMessage::Start {
          name,
          settings,
          speed,
        }
      }
      JsonClientMessage::Input { direction } => protocol::ClientMessage::Input { direction },
      JsonClientMessage::Restart => protocol::ClientMessage::Restart,
    };
    self.handle_client_message(message).await;
  }

  pub async fn handle_binary_message(self: &Arc<Self>, data: &[u8]) {
    let Some(message) = protocol::decode_client_message(data) else { return };
    self.handle_client_message(message).await;
  }

  async fn handle_client_message(self: &Arc<Self>, message: protocol::ClientMessage) {
    let mut state = self.state.lock().await;
    match message {
      protocol::ClientMessage::Start {
        name,
        settings,
        speed,
      } => {
        state.handle_start(name, settings, speed);
        drop(state);
        self.ensure_loop();
      }
      protocol::ClientMessage::Restart => {
        if state.handle_restart() {
          drop(state);
          self.ensure_loop();
        }
      }
      protocol::ClientMessage::Input { direction } => {
        state.pending_direction = Some(direction);
      }
    }
  }

  pub async fn close(&self) {
    let mut state = self.state.lock().await;
    state.session = None;
    state.pending_direction = None;
  }

  fn ensure_loop(self: &Arc<Self>) {
    if self
      .running
      .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
      .is_err()
    {
      return;
    }

    let room = Arc::clone(self);
    tokio::spawn(async move {
      tracing::debug!(room_id = %room.id, "tick loop started");
      loop {
        let delay = {
          let state = room.state.lock().await;
          match state.next_delay() {
            Some(delay) => delay,
            None => {
              room.running.store(false, Ordering::SeqCst);
              break;
            }
          }
        };
        tokio::time::sleep(delay).await;
        let mut state = room.state.lock().await;
        state.step();
      }
      tracing::debug!(room_id = %room.id, "tick loop stopped");
    });
  }
}

impl RoomState {
  fn handle_start(
    &mut self,
    name: Option<String>,
    settings: Option<SessionConfig>,
    speed: Option<GameSpeed>,
  ) {
    if let Some(name) = name {
      self.player_name = sanitize_player_name(&name, DEFAULT_PLAYER_NAME);
    }
    let config = settings
      .unwrap_or_else(|| self.defaults.clone())
      .with_speed(speed.unwrap_or(self.defaults.speed))
      .sanitized();
    let session = GameSession::new(config, self.high_score);
    tracing::debug!(
      room_id = %self.room_id,
      player = %self.player_name,
      grid = session.config().grid_size,
      "run started"
    );
    self.session = Some(session);
    self.pending_direction = None;
    self.recorded = false;
    self.send_init();
  }

  fn handle_restart(&mut self) -> bool {
    let Some(session) = self.session.as_mut() else { return false };
    session.reset();
    self.pending_direction = None;
    self.recorded = false;
    self.send_init();
    true
  }

  fn next_delay(&self) -> Option<Duration> {
    let session = self.session.as_ref()?;
    if session.is_over() {
      return None;
    }
    Some(Duration::from_secs_f64(1.0 / session.tick_rate()))
  }

  fn step(&mut self) {
    let input = self.pending_direction.take();
    let Some(session) = self.session.as_mut() else { return };
    if session.is_over() {
      return;
    }
    let events = session.tick(input);
    let snapshot = session.snapshot();

    if snapshot.status == SessionStatus::Over && !self.recorded {
      self.recorded = true;
      self.high_score = self.high_score.max(snapshot.high_score);
      self.report_finished_run(&snapshot);
    }

    let mut frames = vec![build_state_payload(&snapshot)];
    if !events.is_empty() {
      frames.push(build_events_payload(snapshot.tick, &events));
    }
    for frame in frames {
      if self.sender.send(frame).is_err() {
        tracing::debug!(room_id = %self.room_id, "client gone, dropping session");
        self.session = None;
        return;
      }
    }
  }

  fn report_finished_run(&self, snapshot: &SessionSnapshot) {
    let run = FinishedRun {
      room_id: self.room_id.clone(),
      name: self.player_name.clone(),
      score: snapshot.snake.score,
      tier: snapshot.snake.tier,
      ticks: snapshot.tick,
    };
    if self.results.send(run).is_err() {
      tracing::warn!(room_id = %self.room_id, "score writer unavailable, run not recorded");
    }
  }

  fn send_init(&mut self) {
    let Some(session) = self.session.as_ref() else { return };
    let snapshot = session.snapshot();
    let init = build_init_payload(session.config(), &self.player_name, &snapshot);
    let state = build_state_payload(&snapshot);
    if self.sender.send(init).is_err() || self.sender.send(state).is_err() {
      self.session = None;
    }
  }
}

// `None` speed: the client left it to the server default.
fn parse_settings(
  value: serde_json::Value,
) -> Result<(SessionConfig, Option<GameSpeed>), serde_json::Error> {
  let speed_given = value.get("speed").is_some();
  let config: SessionConfig = serde_json::from_value(value)?;
  let speed = speed_given.then_some(config.speed);
  Ok((config, speed))
}

fn status_byte(status: SessionStatus) -> u8 {
  match status {
    SessionStatus::Running => 0,
    SessionStatus::Over => 1,
  }
}

fn build_init_payload(config: &SessionConfig, name: &str, snapshot: &SessionSnapshot) -> Vec<u8> {
  let tiers = config.tiers.tiers();
  let mut capacity = 4 + 1 + 2 + 1 + 4 + 1 + name.len() + 1;
  for tier in tiers {
    capacity += 4 + 1 + tier.name.len() + 6 + 1;
    capacity += tier.patterns.iter().map(|pattern| 1 + pattern.len()).sum::<usize>();
  }

  let mut encoder = protocol::Encoder::with_capacity(capacity);
  encoder.write_header(protocol::TYPE_INIT, 0);
  encoder.write_u8(snapshot.grid_size.clamp(0, u8::MAX as i32) as u8);
  encoder.write_u16(protocol::modifier_mask(config));
  encoder.write_u8(config.speed.to_byte());
  encoder.write_i32(clamp_i32(snapshot.high_score));
  encoder.write_string(name);

  let tier_len = tiers.len().min(u8::MAX as usize);
  encoder.write_u8(tier_len as u8);
  for tier in tiers.iter().take(tier_len) {
    encoder.write_i32(clamp_i32(tier.threshold));
    encoder.write_string(tier.name);
    for channel in tier.body_color.iter().chain(tier.head_color.iter()) {
      encoder.write_u8(*channel);
    }
    let pattern_len = tier.patterns.len().min(u8::MAX as usize);
    encoder.write_u8(pattern_len as u8);
    for pattern in tier.patterns.iter().take(pattern_len) {
      encoder.write_string(pattern);
    }
  }
  encoder.into_vec()
}

fn build_state_payload(snapshot: &SessionSnapshot) -> Vec<u8> {
  let capacity = 4
    + 4
    + 1
    + 4
    + 4
    + 1
    + 4
    + 2
    + 2
    + snapshot.snake.body.len() * 2
    + 2
    + snapshot.food.len() * 5
    + 2
    + snapshot.walls.len() * 2
    + 1
    + snapshot.portals.len() * 6;

  let mut encoder = protocol::Encoder::with_capacity(capacity);
  let flags = if snapshot.snake.rainbow { protocol::FLAG_STATE_RAINBOW } else { 0 };
  encoder.write_header(protocol::TYPE_STATE, flags);
  encoder.write_u32(snapshot.tick.min(u32::MAX as u64) as u32);
  encoder.write_u8(status_byte(snapshot.status));
  encoder.write_i32(clamp_i32(snapshot.snake.score));
  encoder.write_i32(clamp_i32(snapshot.high_score));
  encoder.write_u8(snapshot.snake.tier.min(u8::MAX as usize) as u8);
  encoder.write_f32(snapshot.tick_rate as f32);
  encoder.write_u8(snapshot.snake.heading.to_byte());
  encoder.write_u8((snapshot.snake.speed_factor * 100.0).round().clamp(0.0, 255.0) as u8);

  let body_len = snapshot.snake.body.len().min(u16::MAX as usize);
  encoder.write_u16(body_len as u16);
  for cell in snapshot.snake.body.iter().take(body_len) {
    encoder.write_cell(*cell);
  }

  let food_len = snapshot.food.len().min(u16::MAX as usize);
  encoder.write_u16(food_len as u16);
  for item in snapshot.food.iter().take(food_len) {
    encoder.write_cell(item.cell);
    encoder.write_u8(item.kind.to_byte());
    encoder.write_u16(item.ttl.unwrap_or(0).min(u16::MAX as u32) as u16);
  }

  let walls_len = snapshot.walls.len().min(u16::MAX as usize);
  encoder.write_u16(walls_len as u16);
  for cell in snapshot.walls.iter().take(walls_len) {
    encoder.write_cell(*cell);
  }

  let portals_len = snapshot.portals.len().min(u8::MAX as usize);
  encoder.write_u8(portals_len as u8);
  for portal in snapshot.portals.iter().take(portals_len) {
    encoder.write_cell(portal.entry);
    encoder.write_cell(portal.exit);
    encoder.write_u16(portal.ttl.min(u16::MAX as u32) as u16);
  }

  encoder.into_vec()
}

fn build_events_payload(tick: u64, events: &[GameEvent]) -> Vec<u8> {
  let count = events.len().min(u8::MAX as usize);
  let mut encoder = protocol::Encoder::with_capacity(4 + 4 + 1 + count * 5);
  encoder.write_header(protocol::TYPE_EVENTS, 0);
  encoder.write_u32(tick.min(u32::MAX as u64) as u32);
  encoder.write_u8(count as u8);
  for event in events.iter().take(count) {
    match event {
      GameEvent::Ate { kind, cell } => {
        encoder.write_u8(protocol::EVENT_ATE);
        encoder.write_u8(kind.to_byte());
        encoder.write_cell(*cell);
      }
      GameEvent::Evolved { tier, .. } => {
        encoder.write_u8(protocol::EVENT_EVOLVED);
        encoder.write_u8((*tier).min(u8::MAX as usize) as u8);
      }
      GameEvent::Teleported { from, to } => {
        encoder.write_u8(protocol::EVENT_TELEPORTED);
        encoder.write_cell(*from);
        encoder.write_cell(*to);
      }
      GameEvent::SpawnSpecialFood { count } => {
        encoder.write_u8(protocol::EVENT_SPAWN_SPECIAL_FOOD);
        encoder.write_u8((*count).min(u8::MAX as usize) as u8);
      }
      GameEvent::Died { cause } => {
        encoder.write_u8(protocol::EVENT_DIED);
        encoder.write_u8(cause.to_byte());
      }
    }
  }
  encoder.into_vec()
}

fn clamp_i32(value: i64) -> i32 {
  value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
