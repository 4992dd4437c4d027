use super::config::SessionConfig;
use super::constants::{INITIAL_LENGTH, MIN_LENGTH, SELF_COLLISION_SKIP};
use super::fruit::SpeedEffect;
use super::grid::Grid;
use super::types::{Cell, DeathCause, Direction};
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Moved { head: Cell },
    Died(DeathCause),
}

impl AdvanceOutcome {
    #[cfg(test)]
    pub fn is_alive(&self) -> bool {
        matches!(self, AdvanceOutcome::Moved { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Snake {
    body: VecDeque<Cell>,
    heading: Direction,
    target_length: usize,
    growth_pending: u32,
    score: i64,
    speed_factor: f64,
    speed_effect_timer: u32,
}

impl Snake {
    pub fn new(grid: &Grid) -> Self {
        let center = grid.center();
        let body = (0..INITIAL_LENGTH as i32)
            .map(|index| grid.wrap_cell(Cell::new(center.col - index, center.row)))
            .collect();
        Self::from_body(body, Direction::Right)
    }

    pub fn from_body(body: VecDeque<Cell>, heading: Direction) -> Self {
        let target_length = body.len().max(1);
        Self {
            body,
            heading,
            target_length,
            growth_pending: 0,
            score: 0,
            speed_factor: 1.0,
            speed_effect_timer: 0,
        }
    }

    pub fn head(&self) -> Cell {
        self.body[0]
    }

    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    #[cfg(test)]
    pub fn growth_pending(&self) -> u32 {
        self.growth_pending
    }

    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    pub fn occupies(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    pub fn steer(&mut self, pending: Option<Direction>, config: &SessionConfig) {
        let Some(direction) = pending else { return };
        let direction = if config.reversed_controls {
            direction.opposite()
        } else {
            direction
        };
        if !direction.is_reverse_of(self.heading) {
            self.heading = direction;
        }
    }

    pub fn advance(
        &mut self,
        pending: Option<Direction>,
        grid: &Grid,
        walls: &HashSet<Cell>,
        config: &SessionConfig,
    ) -> AdvanceOutcome {
        self.steer(pending, config);

        let Some(new_head) = grid.step(self.head(), self.heading) else {
            return AdvanceOutcome::Died(DeathCause::Wall);
        };
        if walls.contains(&new_head) {
            return AdvanceOutcome::Died(DeathCause::Maze);
        }
        if !config.ghost_mode
            && self
                .body
                .iter()
                .skip(SELF_COLLISION_SKIP)
                .any(|cell| *cell == new_head)
        {
            return AdvanceOutcome::Died(DeathCause::SelfCollision);
        }

        self.body.push_front(new_head);
        if config.infinite_length {
            self.target_length = self.body.len().max(MIN_LENGTH);
        } else if self.growth_pending > 0 {
            self.growth_pending -= 1;
            self.target_length += 1;
        }
        while self.body.len() > self.target_length {
            self.body.pop_back();
        }

        AdvanceOutcome::Moved { head: new_head }
    }

    pub fn grow(&mut self, amount: u32) {
        self.growth_pending = self.growth_pending.saturating_add(amount);
    }

    pub fn add_points(&mut self, points: i64) {
        self.score += points;
    }

    pub fn eat_hazard(&mut self, points: i64) {
        self.score = (self.score + points).max(0);
        if self.body.len() > MIN_LENGTH {
            self.body.pop_back();
            self.target_length = self.target_length.saturating_sub(1).max(MIN_LENGTH);
        }
    }

    pub fn teleport_head(&mut self, to: Cell) {
        self.body[0] = to;
    }

    pub fn apply_speed_effect(&mut self, effect: SpeedEffect) {
        self.speed_factor = effect.factor;
        self.speed_effect_timer = effect.ticks;
    }

    pub fn clear_speed_effect(&mut self) {
        self.speed_factor = 1.0;
        self.speed_effect_timer = 0;
    }

    pub fn tick_speed_effect(&mut self) {
        if self.speed_effect_timer == 0 {
            return;
        }
        self.speed_effect_timer -= 1;
        if self.speed_effect_timer == 0 {
            self.speed_factor = 1.0;
        }
    }
}
