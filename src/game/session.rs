use super::config::SessionConfig;
use super::constants::{BASE_TICK_RATE, MIN_TICK_RATE, SPECIAL_FOOD_BURST};
use super::evolution::Evolution;
use super::food::{FoodRequest, FoodSet, SpawnContext};
use super::grid::Grid;
use super::maze::Maze;
use super::portal::PortalSet;
use super::snake::{AdvanceOutcome, Snake};
use super::types::{
    Cell, DeathCause, Direction, GameEvent, SessionSnapshot, SessionStatus, SnakeSnapshot,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;


#[derive(Debug)]
pub struct GameSession<R: Rng = StdRng> {
    config: SessionConfig,
    grid: Grid,
    rng: R,
    snake: Snake,
    food: FoodSet,
    maze: Option<Maze>,
    portals: Option<PortalSet>,
    evolution: Evolution,
    status: SessionStatus,
    high_score: i64,
    tick: u64,
}

impl GameSession<StdRng> {
    pub fn new(config: SessionConfig, high_score: i64) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, high_score, rng)
    }
}

impl<R: Rng> GameSession<R> {
    pub fn with_rng(config: SessionConfig, high_score: i64, rng: R) -> Self {
        let config = config.sanitized();
        let grid = Grid::new(config.grid_size, config.wrap_around);
        let snake = Snake::new(&grid);
        let mut session = Self {
            config,
            grid,
            rng,
            snake,
            food: FoodSet::new(),
            maze: None,
            portals: None,
            evolution: Evolution::default(),
            status: SessionStatus::Running,
            high_score: high_score.max(0),
            tick: 0,
        };
        session.start_run();
        session
    }

    pub fn reset(&mut self) {
        self.start_run();
    }

    fn start_run(&mut self) {
        self.snake = Snake::new(&self.grid);
        self.food = FoodSet::new();
        self.evolution = Evolution::default();
        self.status = SessionStatus::Running;
        self.tick = 0;
        self.portals = self.config.portal_mode.then(PortalSet::default);
        self.maze = self.config.maze_mode.then(Maze::default);
        self.regenerate_maze();
        self.replenish_food(true);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[cfg(test)]
    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    #[cfg(test)]
    pub fn food(&self) -> &FoodSet {
        &self.food
    }

    #[cfg(test)]
    pub fn walls(&self) -> Option<&HashSet<Cell>> {
        self.maze.as_ref().map(Maze::walls)
    }

    #[cfg(test)]
    pub fn portals(&self) -> Option<&PortalSet> {
        self.portals.as_ref()
    }

    #[cfg(test)]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status == SessionStatus::Over
    }

    pub fn score(&self) -> i64 {
        self.snake.score()
    }

    #[cfg(test)]
    pub fn high_score(&self) -> i64 {
        self.high_score
    }

    pub fn tier(&self) -> usize {
        self.evolution.current()
    }

    #[cfg(test)]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn tick_rate(&self) -> f64 {
        (BASE_TICK_RATE * self.config.speed.multiplier() * self.snake.speed_factor())
            .max(MIN_TICK_RATE)
    }

    pub fn tick(&mut self, input: Option<Direction>) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.is_over() {
            return events;
        }
        self.tick += 1;

        self.food.expire();
        self.update_portals();
        self.update_maze();
        self.replenish_food(false);
        self.snake.tick_speed_effect();

        let empty = HashSet::new();
        let walls = self.maze.as_ref().map(Maze::walls).unwrap_or(&empty);
        match self.snake.advance(input, &self.grid, walls, &self.config) {
            AdvanceOutcome::Moved { .. } => {}
            AdvanceOutcome::Died(cause) => {
                self.finish(cause);
                events.push(GameEvent::Died { cause });
                return events;
            }
        }

        self.resolve_head_collisions(&mut events);
        self.update_evolution(&mut events);
        events
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut walls: Vec<Cell> = self
            .maze
            .as_ref()
            .map(|maze| maze.walls().iter().copied().collect())
            .unwrap_or_default();
        walls.sort();
        let tier = self.evolution.current();
        SessionSnapshot {
            tick: self.tick,
            status: self.status,
            high_score: self.high_score,
            tick_rate: self.tick_rate(),
            grid_size: self.grid.size,
            snake: SnakeSnapshot {
                body: self.snake.body().iter().copied().collect(),
                heading: self.snake.heading(),
                score: self.snake.score(),
                tier,
                tier_name: self.config.tiers.name(tier),
                speed_factor: self.snake.speed_factor(),
                rainbow: self.config.rainbow_skin,
            },
            food: self.food.items().to_vec(),
            walls,
            portals: self
                .portals
                .as_ref()
                .map(|portals| portals.portals().to_vec())
                .unwrap_or_default(),
        }
    }

    fn finish(&mut self, cause: DeathCause) {
        self.status = SessionStatus::Over;
        if self.snake.score() > self.high_score {
            self.high_score = self.snake.score();
        }
        tracing::debug!(
            ?cause,
            score = self.snake.score(),
            tick = self.tick,
            "snake died"
        );
    }

    // Portals take priority and end the check for this tick; otherwise the
    // head eats whatever fruit sits on its cell.
    fn resolve_head_collisions(&mut self, events: &mut Vec<GameEvent>) {
        let head = self.snake.head();
        if let Some(to) = self
            .portals
            .as_ref()
            .and_then(|portals| portals.destination(head))
        {
            self.snake.teleport_head(to);
            events.push(GameEvent::Teleported { from: head, to });
            return;
        }

        let Some(item) = self.food.take_at(head) else { return };
        let profile = self.config.fruits.profile(item.kind);
        if profile.hazard {
            self.snake.eat_hazard(profile.points);
        } else {
            self.snake.add_points(profile.points);
            self.snake.grow(profile.growth);
        }
        match profile.speed_effect {
            Some(effect) => self.snake.apply_speed_effect(effect),
            None => self.snake.clear_speed_effect(),
        }
        events.push(GameEvent::Ate {
            kind: item.kind,
            cell: item.cell,
        });
        self.replenish_food(!profile.hazard);
    }

    fn update_evolution(&mut self, events: &mut Vec<GameEvent>) {
        let step = self.evolution.observe(
            self.snake.score(),
            &self.config.tiers,
            self.config.allow_tier_regression,
        );
        if let Some(tier) = step.evolved_to {
            let name = self.config.tiers.name(tier);
            tracing::debug!(tier, name, score = self.snake.score(), "snake evolved");
            events.push(GameEvent::Evolved { tier, name });
        }
        if step.reached_top {
            self.spawn_special_food(SPECIAL_FOOD_BURST);
            events.push(GameEvent::SpawnSpecialFood {
                count: SPECIAL_FOOD_BURST,
            });
        }
    }

    fn spawn_special_food(&mut self, count: usize) {
        let blocked = blocked_cells(self.maze.as_ref(), self.portals.as_ref());
        let kind = self.config.fruits.special_kind();
        let ctx = SpawnContext {
            grid: &self.grid,
            snake: &self.snake,
            blocked: &blocked,
            fruits: &self.config.fruits,
        };
        for _ in 0..count {
            self.food.add_food(FoodRequest::Kind(kind), &ctx, &mut self.rng);
        }
    }

    fn replenish_food(&mut self, roll_hazard: bool) {
        let blocked = blocked_cells(self.maze.as_ref(), self.portals.as_ref());
        let ctx = SpawnContext {
            grid: &self.grid,
            snake: &self.snake,
            blocked: &blocked,
            fruits: &self.config.fruits,
        };
        self.food
            .ensure_minimum_food(self.config.double_food, &ctx, &mut self.rng);
        if roll_hazard {
            self.food.maybe_spawn_hazard(&ctx, &mut self.rng);
        }
    }

    fn update_portals(&mut self) {
        let Some(portals) = self.portals.as_mut() else { return };
        if !portals.tick() {
            return;
        }
        let mut occupied: HashSet<Cell> = self.snake.body().iter().copied().collect();
        occupied.extend(self.food.cells());
        if let Some(maze) = &self.maze {
            occupied.extend(maze.walls().iter().copied());
        }
        if let Some(portal) = portals.create_portal(&self.grid, &occupied, &mut self.rng) {
            tracing::debug!(entry = ?portal.entry, exit = ?portal.exit, "portal opened");
        }
    }

    fn update_maze(&mut self) {
        let due = self.maze.as_mut().is_some_and(Maze::tick);
        if due {
            self.regenerate_maze();
        }
    }

    fn regenerate_maze(&mut self) {
        let Some(maze) = self.maze.as_mut() else { return };
        let mut occupied: HashSet<Cell> = self.snake.body().iter().copied().collect();
        occupied.extend(self.food.cells());
        if let Some(portals) = &self.portals {
            occupied.extend(portals.cells());
        }
        maze.generate(&self.grid, self.snake.head(), &occupied, &mut self.rng);
    }
}

fn blocked_cells(maze: Option<&Maze>, portals: Option<&PortalSet>) -> HashSet<Cell> {
    let mut blocked = HashSet::new();
    if let Some(maze) = maze {
        blocked.extend(maze.walls().iter().copied());
    }
    if let Some(portals) = portals {
        blocked.extend(portals.cells());
    }
    blocked
}
