use super::constants::{MAX_SPAWN_ATTEMPTS, MAZE_DENSITY, MAZE_HEAD_BUFFER, MAZE_REGEN_INTERVAL};
use super::grid::Grid;
use super::types::{Cell, Direction};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

pub fn target_wall_count(grid: &Grid) -> usize {
    (grid.cell_count() as f64 * MAZE_DENSITY).floor() as usize
}

#[derive(Debug, Clone)]
pub struct Maze {
    walls: HashSet<Cell>,
    regen_countdown: u32,
}

impl Default for Maze {
    fn default() -> Self {
        Self {
            walls: HashSet::new(),
            regen_countdown: MAZE_REGEN_INTERVAL,
        }
    }
}

impl Maze {
    pub fn walls(&self) -> &HashSet<Cell> {
        &self.walls
    }

    pub fn tick(&mut self) -> bool {
        self.regen_countdown = self.regen_countdown.saturating_sub(1);
        if self.regen_countdown > 0 {
            return false;
        }
        self.regen_countdown = MAZE_REGEN_INTERVAL;
        true
    }

    // Replaces the wall set. `occupied` holds the snake, food and portal
    // cells; the square around `head` is kept clear as well. Half of the
    // budget goes to scattered seeds, the rest grows clusters off them.
    pub fn generate<R: Rng>(
        &mut self,
        grid: &Grid,
        head: Cell,
        occupied: &HashSet<Cell>,
        rng: &mut R,
    ) {
        let mut forbidden: HashSet<Cell> = occupied.clone();
        forbidden.extend(grid.neighbourhood(head, MAZE_HEAD_BUFFER));

        let target = target_wall_count(grid);
        let extensions = target / 2;
        let seeds = target - extensions;

        let mut walls: HashSet<Cell> = HashSet::with_capacity(target);
        let mut placed: Vec<Cell> = Vec::with_capacity(target);

        for _ in 0..seeds {
            for _ in 0..MAX_SPAWN_ATTEMPTS {
                let cell = Cell::new(rng.gen_range(0..grid.size), rng.gen_range(0..grid.size));
                if forbidden.contains(&cell) || walls.contains(&cell) {
                    continue;
                }
                walls.insert(cell);
                placed.push(cell);
                break;
            }
        }

        let mut directions = Direction::ALL;
        for _ in 0..extensions {
            let Some(&origin) = placed.choose(rng) else { break };
            directions.shuffle(rng);
            let neighbour = directions
                .iter()
                .filter_map(|direction| grid.step(origin, *direction))
                .find(|cell| !forbidden.contains(cell) && !walls.contains(cell));
            if let Some(cell) = neighbour {
                walls.insert(cell);
                placed.push(cell);
            }
        }

        tracing::debug!(walls = walls.len(), target, "maze generated");
        self.walls = walls;
        self.regen_countdown = MAZE_REGEN_INTERVAL;
    }

    #[cfg(test)]
    pub(crate) fn with_walls(walls: HashSet<Cell>) -> Self {
        Self {
            walls,
            regen_countdown: MAZE_REGEN_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn occupied_fixture() -> HashSet<Cell> {
        let mut occupied: HashSet<Cell> = (9..14).map(|col| Cell::new(col, 13)).collect();
        occupied.insert(Cell::new(3, 3));
        occupied.insert(Cell::new(20, 7));
        occupied
    }

    #[test]
    fn generation_respects_budget_and_forbidden_cells() {
        let grid = Grid::new(26, true);
        let occupied = occupied_fixture();
        let head = Cell::new(13, 13);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut maze = Maze::default();
            maze.generate(&grid, head, &occupied, &mut rng);
            assert!(maze.walls().len() <= target_wall_count(&grid));
            assert!(!maze.walls().is_empty());
            assert!(maze.walls().iter().all(|cell| !occupied.contains(cell)));
            assert!(maze.walls().iter().all(|cell| grid.contains(*cell)));
        }
    }

    #[test]
    fn head_buffer_stays_clear_across_the_edge() {
        let grid = Grid::new(26, true);
        let head = Cell::new(0, 0);
        let buffer: HashSet<Cell> = grid
            .neighbourhood(head, MAZE_HEAD_BUFFER)
            .into_iter()
            .collect();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut maze = Maze::default();
            maze.generate(&grid, head, &HashSet::new(), &mut rng);
            assert!(maze.walls().iter().all(|cell| !buffer.contains(cell)));
        }
    }

    #[test]
    fn same_seed_same_maze() {
        let grid = Grid::new(26, true);
        let occupied = occupied_fixture();
        let mut first = Maze::default();
        let mut second = Maze::default();
        first.generate(&grid, Cell::new(13, 13), &occupied, &mut StdRng::seed_from_u64(42));
        second.generate(&grid, Cell::new(13, 13), &occupied, &mut StdRng::seed_from_u64(42));
        assert_eq!(first.walls(), second.walls());
    }

    #[test]
    fn tick_signals_regeneration_on_interval() {
        let mut maze = Maze::default();
        let due = (0..MAZE_REGEN_INTERVAL * 2).filter(|_| maze.tick()).count();
        assert_eq!(due, 2);
    }

    #[test]
    fn crowded_board_degrades_without_failing() {
        let grid = Grid::new(8, true);
        let occupied: HashSet<Cell> = grid.cells().filter(|cell| cell.row != 7).collect();
        let mut rng = StdRng::seed_from_u64(8);
        let mut maze = Maze::default();
        maze.generate(&grid, Cell::new(0, 0), &occupied, &mut rng);
        assert!(maze.walls().len() <= target_wall_count(&grid));
        assert!(maze.walls().iter().all(|cell| cell.row == 7));
    }
}
