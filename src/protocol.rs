use crate::game::config::{GameSpeed, SessionConfig};
use crate::game::types::{Cell, Direction};

pub const VERSION: u8 = 1;

pub const TYPE_START: u8 = 0x01;
pub const TYPE_INPUT: u8 = 0x02;
pub const TYPE_RESTART: u8 = 0x03;

pub const TYPE_INIT: u8 = 0x10;
pub const TYPE_STATE: u8 = 0x11;
pub const TYPE_EVENTS: u8 = 0x12;

pub const FLAG_START_NAME: u16 = 1 << 0;
pub const FLAG_STATE_RAINBOW: u16 = 1 << 0;

pub const MODIFIER_WRAP: u16 = 1 << 0;
pub const MODIFIER_GHOST: u16 = 1 << 1;
pub const MODIFIER_MAZE: u16 = 1 << 2;
pub const MODIFIER_PORTALS: u16 = 1 << 3;
pub const MODIFIER_RAINBOW: u16 = 1 << 4;
pub const MODIFIER_REVERSED: u16 = 1 << 5;
pub const MODIFIER_INFINITE: u16 = 1 << 6;
pub const MODIFIER_DOUBLE_FOOD: u16 = 1 << 7;
pub const MODIFIER_HOLD_TIER: u16 = 1 << 8;

pub const EVENT_ATE: u8 = 0;
pub const EVENT_EVOLVED: u8 = 1;
pub const EVENT_TELEPORTED: u8 = 2;
pub const EVENT_SPAWN_SPECIAL_FOOD: u8 = 3;
pub const EVENT_DIED: u8 = 4;

#[derive(Debug)]
pub enum ClientMessage {
  Start {
    name: Option<String>,
    settings: Option<SessionConfig>,
    speed: Option<GameSpeed>,
  },
  Input {
    direction: Direction,
  },
  Restart,
}

pub fn modifier_mask(config: &SessionConfig) -> u16 {
  let mut mask = 0;
  let flags = [
    (config.wrap_around, MODIFIER_WRAP),
    (config.ghost_mode, MODIFIER_GHOST),
    (config.maze_mode, MODIFIER_MAZE),
    (config.portal_mode, MODIFIER_PORTALS),
    (config.rainbow_skin, MODIFIER_RAINBOW),
    (config.reversed_controls, MODIFIER_REVERSED),
    (config.infinite_length, MODIFIER_INFINITE),
    (config.double_food, MODIFIER_DOUBLE_FOOD),
    (!config.allow_tier_regression, MODIFIER_HOLD_TIER),
  ];
  for (enabled, bit) in flags {
    if enabled {
      mask |= bit;
    }
  }
  mask
}

pub fn config_from_mask(mask: u16, speed: GameSpeed) -> SessionConfig {
  SessionConfig {
    wrap_around: mask & MODIFIER_WRAP != 0,
    ghost_mode: mask & MODIFIER_GHOST != 0,
    maze_mode: mask & MODIFIER_MAZE != 0,
    portal_mode: mask & MODIFIER_PORTALS != 0,
    rainbow_skin: mask & MODIFIER_RAINBOW != 0,
    reversed_controls: mask & MODIFIER_REVERSED != 0,
    infinite_length: mask & MODIFIER_INFINITE != 0,
    double_food: mask & MODIFIER_DOUBLE_FOOD != 0,
    allow_tier_regression: mask & MODIFIER_HOLD_TIER == 0,
    speed,
    ..SessionConfig::default()
  }
}

pub fn decode_client_message(data: &[u8]) -> Option<ClientMessage> {
  let mut reader = Reader::new(data);
  let version = reader.read_u8()?;
  if version != VERSION {
    return None;
  }
  let message_type = reader.read_u8()?;
  let flags = reader.read_u16()?;
  match message_type {
    TYPE_START => {
      let mask = reader.read_u16()?;
      let speed = GameSpeed::from_byte(reader.read_u8()?)?;
      let name = if flags & FLAG_START_NAME != 0 {
        Some(reader.read_string()?)
      } else {
        None
      };
      Some(ClientMessage::Start {
        name,
        settings: Some(config_from_mask(mask, speed)),
        speed: Some(speed),
      })
    }
    TYPE_INPUT => {
      let direction = Direction::from_byte(reader.read_u8()?)?;
      Some(ClientMessage::Input { direction })
    }
    TYPE_RESTART => Some(ClientMessage::Restart),
    _ => None,
  }
}

pub struct Encoder {
  buffer: Vec<u8>,
}

impl Encoder {
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      buffer: Vec::with_capacity(capacity),
    }
  }

  pub fn into_vec(self) -> Vec<u8> {
    self.buffer
  }

  pub fn write_header(&mut self, message_type: u8, flags: u16) {
    self.write_u8(VERSION);
    self.write_u8(message_type);
    self.write_u16(flags);
  }

  pub fn write_u8(&mut self, value: u8) {
    self.buffer.push(value);
  }

  pub fn write_u16(&mut self, value: u16) {
    self.buffer.extend_from_slice(&value.to_le_bytes());
  }

  pub fn write_i32(&mut self, value: i32) {
    self.buffer.extend_from_slice(&value.to_le_bytes());
  }

  pub fn write_u32(&mut self, value: u32) {
    self.buffer.extend_from_slice(&value.to_le_bytes());
  }

  pub fn write_f32(&mut self, value: f32) {
    self.buffer.extend_from_slice(&value.to_le_bytes());
  }

  // Cells travel as two bytes; boards never exceed 255 cells a side.
  pub fn write_cell(&mut self, cell: Cell) {
    self.write_u8(cell.col.clamp(0, u8::MAX as i32) as u8);
    self.write_u8(cell.row.clamp(0, u8::MAX as i32) as u8);
  }

  pub fn write_string(&mut self, value: &str) {
    let bytes = value.as_bytes();
    let mut end = bytes.len().min(u8::MAX as usize);
    while !value.is_char_boundary(end) {
      end = end.saturating_sub(1);
    }
    self.write_u8(end as u8);
    self.buffer.extend_from_slice(&bytes[..end]);
  }
}

struct Reader<'a> {
  data: &'a [u8],
  offset: usize,
}

impl<'a> Reader<'a> {
  fn new(data: &'a [u8]) -> Self {
    Self { data, offset: 0 }
  }

  fn read_u8(&mut self) -> Option<u8> {
    let value = *self.data.get(self.offset)?;
    self.offset += 1;
    Some(value)
  }

  fn read_u16(&mut self) -> Option<u16> {
    let bytes = self.read_bytes::<2>()?;
    Some(u16::from_le_bytes(bytes))
  }

  fn read_string(&mut self) -> Option<String> {
    let len = self.read_u8()? as usize;
    if self.offset + len > self.data.len() {
      return None;
    }
    let slice = &self.data[self.offset..self.offset + len];
    self.offset += len;
    Some(String::from_utf8_lossy(slice).into_owned())
  }

  fn read_bytes<const N: usize>(&mut self) -> Option<[u8; N]> {
    if self.offset + N > self.data.len() {
      return None;
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&self.data[self.offset..self.offset + N]);
    self.offset += N;
    Some(out)
  }
}
