use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub col: i32,
    pub row: i32,
}

impl Cell {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn offset(self, direction: Direction) -> Self {
        let (dc, dr) = direction.delta();
        Self {
            col: self.col + dc,
            row: self.row + dr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn is_reverse_of(self, other: Direction) -> bool {
        self.opposite() == other
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(Direction::Up),
            1 => Some(Direction::Down),
            2 => Some(Direction::Left),
            3 => Some(Direction::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FruitKind {
    Apple,
    Banana,
    Orange,
    Berry,
    Kiwi,
    IceCream,
    Poison,
}

impl FruitKind {
    pub fn to_byte(self) -> u8 {
        match self {
            FruitKind::Apple => 0,
            FruitKind::Banana => 1,
            FruitKind::Orange => 2,
            FruitKind::Berry => 3,
            FruitKind::Kiwi => 4,
            FruitKind::IceCream => 5,
            FruitKind::Poison => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Wall,
    Maze,
    SelfCollision,
}

impl DeathCause {
    pub fn to_byte(self) -> u8 {
        match self {
            DeathCause::Wall => 0,
            DeathCause::Maze => 1,
            DeathCause::SelfCollision => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    Ate { kind: FruitKind, cell: Cell },
    Evolved { tier: usize, name: &'static str },
    Teleported { from: Cell, to: Cell },
    SpawnSpecialFood { count: usize },
    Died { cause: DeathCause },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FoodItem {
    pub cell: Cell,
    pub kind: FruitKind,
    pub ttl: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Portal {
    pub entry: Cell,
    pub exit: Cell,
    pub ttl: u32,
}

impl Portal {
    pub fn partner(&self, cell: Cell) -> Option<Cell> {
        if cell == self.entry {
            Some(self.exit)
        } else if cell == self.exit {
            Some(self.entry)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SnakeSnapshot {
    pub body: Vec<Cell>,
    pub heading: Direction,
    pub score: i64,
    pub tier: usize,
    pub tier_name: &'static str,
    pub speed_factor: f64,
    pub rainbow: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub tick: u64,
    pub status: SessionStatus,
    pub high_score: i64,
    pub tick_rate: f64,
    pub grid_size: i32,
    pub snake: SnakeSnapshot,
    pub food: Vec<FoodItem>,
    pub walls: Vec<Cell>,
    pub portals: Vec<Portal>,
}
