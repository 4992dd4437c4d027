use super::constants::{HAZARD_SPAWN_CHANCE, MAX_SPAWN_ATTEMPTS};
use super::fruit::FruitTable;
use super::grid::Grid;
use super::snake::Snake;
use super::types::{Cell, FoodItem, FruitKind};
use rand::Rng;
use std::collections::HashSet;

pub struct SpawnContext<'a> {
    pub grid: &'a Grid,
    pub snake: &'a Snake,
    pub blocked: &'a HashSet<Cell>,
    pub fruits: &'a FruitTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoodRequest {
    Normal,
    Kind(FruitKind),
}

#[derive(Debug, Clone, Default)]
pub struct FoodSet {
    items: Vec<FoodItem>,
}

impl FoodSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[FoodItem] {
        &self.items
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.items.iter().any(|item| item.cell == cell)
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.items.iter().map(|item| item.cell)
    }

    pub fn regular_count(&self, fruits: &FruitTable) -> usize {
        self.items
            .iter()
            .filter(|item| !fruits.profile(item.kind).hazard)
            .count()
    }

    pub fn has_hazard(&self, fruits: &FruitTable) -> bool {
        self.items
            .iter()
            .any(|item| fruits.profile(item.kind).hazard)
    }

    pub fn take_at(&mut self, cell: Cell) -> Option<FoodItem> {
        let index = self.items.iter().position(|item| item.cell == cell)?;
        Some(self.items.remove(index))
    }

    pub fn expire(&mut self) {
        self.items.retain_mut(|item| match item.ttl.as_mut() {
            Some(ttl) => {
                *ttl = ttl.saturating_sub(1);
                *ttl > 0
            }
            None => true,
        });
    }

    // Places one item on a random free cell. Gives up silently after
    // `MAX_SPAWN_ATTEMPTS` occupied draws.
    pub fn add_food<R: Rng>(
        &mut self,
        request: FoodRequest,
        ctx: &SpawnContext<'_>,
        rng: &mut R,
    ) -> Option<FoodItem> {
        let cell = self.pick_free_cell(ctx, rng)?;
        let kind = match request {
            FoodRequest::Normal => ctx.fruits.pick_regular(rng),
            FoodRequest::Kind(kind) => kind,
        };
        let item = FoodItem {
            cell,
            kind,
            ttl: ctx.fruits.profile(kind).lifetime,
        };
        self.items.push(item);
        Some(item)
    }

    pub fn ensure_minimum_food<R: Rng>(
        &mut self,
        double_food: bool,
        ctx: &SpawnContext<'_>,
        rng: &mut R,
    ) {
        let wanted: usize = if double_food { 2 } else { 1 };
        let missing = wanted.saturating_sub(self.regular_count(ctx.fruits));
        for _ in 0..missing {
            self.add_food(FoodRequest::Normal, ctx, rng);
        }
    }

    pub fn maybe_spawn_hazard<R: Rng>(
        &mut self,
        ctx: &SpawnContext<'_>,
        rng: &mut R,
    ) -> Option<FoodItem> {
        let kind = ctx.fruits.hazard_kind()?;
        if self.has_hazard(ctx.fruits) || !rng.gen_bool(HAZARD_SPAWN_CHANCE) {
            return None;
        }
        self.add_food(FoodRequest::Kind(kind), ctx, rng)
    }

    fn pick_free_cell<R: Rng>(&self, ctx: &SpawnContext<'_>, rng: &mut R) -> Option<Cell> {
        for _ in 0..MAX_SPAWN_ATTEMPTS {
            let cell = Cell::new(
                rng.gen_range(0..ctx.grid.size),
                rng.gen_range(0..ctx.grid.size),
            );
            if ctx.snake.occupies(cell) || self.contains(cell) || ctx.blocked.contains(&cell) {
                continue;
            }
            return Some(cell);
        }
        None
    }

    #[cfg(test)]
    pub(crate) fn push(&mut self, item: FoodItem) {
        self.items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::types::Direction;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;

    #[test]
    fn spawned_food_never_overlaps() {
        let grid = Grid::new(6, true);
        let snake = Snake::new(&grid);
        let blocked = HashSet::new();
        let fruits = FruitTable::default();
        let ctx = SpawnContext {
            grid: &grid,
            snake: &snake,
            blocked: &blocked,
            fruits: &fruits,
        };
        let mut rng = StdRng::seed_from_u64(3);
        let mut food = FoodSet::new();
        for _ in 0..40 {
            food.add_food(FoodRequest::Normal, &ctx, &mut rng);
        }
        let cells: HashSet<Cell> = food.cells().collect();
        assert_eq!(cells.len(), food.items().len());
        assert!(food.items().len() <= grid.cell_count() - snake.len());
        assert!(food.cells().all(|cell| !snake.occupies(cell)));
    }

    #[test]
    fn spawn_is_skipped_on_a_full_board() {
        let grid = Grid::new(2, true);
        let body: VecDeque<Cell> = grid.cells().collect();
        let snake = Snake::from_body(body, Direction::Right);
        let blocked = HashSet::new();
        let fruits = FruitTable::default();
        let ctx = SpawnContext {
            grid: &grid,
            snake: &snake,
            blocked: &blocked,
            fruits: &fruits,
        };
        let mut rng = StdRng::seed_from_u64(5);
        let mut food = FoodSet::new();
        assert!(food.add_food(FoodRequest::Normal, &ctx, &mut rng).is_none());
        food.ensure_minimum_food(true, &ctx, &mut rng);
        assert!(food.items().is_empty());
    }

    #[test]
    fn blocked_cells_are_avoided() {
        let grid = Grid::new(4, true);
        let snake = Snake::new(&grid);
        let blocked: HashSet<Cell> = grid
            .cells()
            .filter(|cell| !snake.occupies(*cell) && *cell != Cell::new(0, 0))
            .collect();
        let fruits = FruitTable::default();
        let ctx = SpawnContext {
            grid: &grid,
            snake: &snake,
            blocked: &blocked,
            fruits: &fruits,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut food = FoodSet::new();
        let placed = (0..20).find_map(|_| food.add_food(FoodRequest::Normal, &ctx, &mut rng));
        assert_eq!(placed.map(|item| item.cell), Some(Cell::new(0, 0)));
    }

    #[test]
    fn double_food_keeps_two_regular_items() {
        let grid = Grid::new(26, true);
        let snake = Snake::new(&grid);
        let blocked = HashSet::new();
        let fruits = FruitTable::default();
        let ctx = SpawnContext {
            grid: &grid,
            snake: &snake,
            blocked: &blocked,
            fruits: &fruits,
        };
        let mut rng = StdRng::seed_from_u64(9);
        let mut food = FoodSet::new();
        food.push(FoodItem {
            cell: Cell::new(0, 0),
            kind: FruitKind::Poison,
            ttl: Some(5),
        });
        food.ensure_minimum_food(true, &ctx, &mut rng);
        assert_eq!(food.regular_count(&fruits), 2);
        food.ensure_minimum_food(true, &ctx, &mut rng);
        assert_eq!(food.items().len(), 3);
    }

    #[test]
    fn timed_items_expire() {
        let mut food = FoodSet::new();
        food.push(FoodItem {
            cell: Cell::new(1, 1),
            kind: FruitKind::Poison,
            ttl: Some(2),
        });
        food.push(FoodItem {
            cell: Cell::new(2, 2),
            kind: FruitKind::Apple,
            ttl: None,
        });
        food.expire();
        assert_eq!(food.items().len(), 2);
        food.expire();
        assert_eq!(food.items().len(), 1);
        assert_eq!(food.items()[0].kind, FruitKind::Apple);
    }

    #[test]
    fn hazard_spawns_at_most_once() {
        let grid = Grid::new(26, true);
        let snake = Snake::new(&grid);
        let blocked = HashSet::new();
        let fruits = FruitTable::default();
        let ctx = SpawnContext {
            grid: &grid,
            snake: &snake,
            blocked: &blocked,
            fruits: &fruits,
        };
        let mut rng = StdRng::seed_from_u64(21);
        let mut food = FoodSet::new();
        for _ in 0..100 {
            food.maybe_spawn_hazard(&ctx, &mut rng);
        }
        assert!(food.has_hazard(&fruits));
        assert_eq!(food.items().len(), 1);
    }
}
