use super::constants::MAX_GRID_SIZE;
use super::types::{Cell, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub size: i32,
    pub wrap: bool,
}

impl Grid {
    pub fn new(size: i32, wrap: bool) -> Self {
        Self {
            size: size.clamp(1, MAX_GRID_SIZE),
            wrap,
        }
    }

    pub fn cell_count(&self) -> usize {
        (self.size * self.size) as usize
    }

    pub fn center(&self) -> Cell {
        Cell::new(self.size / 2, self.size / 2)
    }

    pub fn contains(&self, cell: Cell) -> bool {
        (0..self.size).contains(&cell.col) && (0..self.size).contains(&cell.row)
    }

    pub fn wrap_cell(&self, cell: Cell) -> Cell {
        Cell::new(cell.col.rem_euclid(self.size), cell.row.rem_euclid(self.size))
    }

    pub fn step(&self, cell: Cell, direction: Direction) -> Option<Cell> {
        let next = cell.offset(direction);
        if self.wrap {
            Some(self.wrap_cell(next))
        } else if self.contains(next) {
            Some(next)
        } else {
            None
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.size).flat_map(move |row| (0..self.size).map(move |col| Cell::new(col, row)))
    }

    pub fn neighbourhood(&self, cell: Cell, radius: i32) -> Vec<Cell> {
        let mut out = Vec::with_capacity(((radius * 2 + 1) * (radius * 2 + 1)) as usize);
        for dr in -radius..=radius {
            for dc in -radius..=radius {
                out.push(self.wrap_cell(Cell::new(cell.col + dc, cell.row + dr)));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_wraps_on_toroidal_grid() {
        let grid = Grid::new(26, true);
        assert_eq!(grid.step(Cell::new(25, 4), Direction::Right), Some(Cell::new(0, 4)));
        assert_eq!(grid.step(Cell::new(3, 0), Direction::Up), Some(Cell::new(3, 25)));
    }

    #[test]
    fn step_leaves_bounded_grid() {
        let grid = Grid::new(26, false);
        assert_eq!(grid.step(Cell::new(25, 4), Direction::Right), None);
        assert_eq!(grid.step(Cell::new(0, 0), Direction::Left), None);
        assert_eq!(grid.step(Cell::new(1, 1), Direction::Left), Some(Cell::new(0, 1)));
    }

    #[test]
    fn size_is_capped() {
        let grid = Grid::new(46_341, true);
        assert_eq!(grid.size, MAX_GRID_SIZE);
        assert_eq!(grid.cell_count(), (MAX_GRID_SIZE * MAX_GRID_SIZE) as usize);
        assert_eq!(Grid::new(-4, true).size, 1);
    }

    #[test]
    fn neighbourhood_wraps_around_corner() {
        let grid = Grid::new(10, false);
        let cells = grid.neighbourhood(Cell::new(0, 0), 2);
        assert_eq!(cells.len(), 25);
        assert!(cells.contains(&Cell::new(8, 8)));
        assert!(cells.contains(&Cell::new(2, 2)));
        assert!(cells.iter().all(|cell| grid.contains(*cell)));
    }
}
