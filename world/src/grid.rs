//! Typed cell grid with derived spawn and exit registries.

use glam::Vec2;
use gridspire_core::{CellKind, Entity, GridPos};

/// Single cell of the grid map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    /// Terrain classification of the cell.
    pub kind: CellKind,
    /// Index of the path group the cell belongs to, for multi-lane maps.
    pub path_group: Option<u32>,
    /// Tower currently occupying the cell, if any.
    pub tower: Option<Entity>,
}

impl Cell {
    const fn empty() -> Self {
        Self {
            kind: CellKind::Empty,
            path_group: None,
            tower: None,
        }
    }
}

/// Fixed-size 2D grid of typed cells addressable by `(x, y)`.
///
/// Spawn and exit cells are mirrored into derived registries that stay in
/// sync with every cell-type mutation. Out-of-range lookups yield `None`;
/// the grid never panics on collaborator input.
#[derive(Clone, Debug)]
pub struct GridMap {
    width: u32,
    height: u32,
    cell_size: f32,
    cells: Vec<Cell>,
    spawns: Vec<GridPos>,
    exits: Vec<GridPos>,
}

impl GridMap {
    /// Creates a grid of the provided dimensions filled with empty cells.
    #[must_use]
    pub fn new(width: u32, height: u32, cell_size: f32) -> Self {
        let capacity = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            cell_size,
            cells: vec![Cell::empty(); capacity],
            spawns: Vec::new(),
            exits: Vec::new(),
        }
    }

    /// Builds a grid from row-major cell kinds supplied by an external loader.
    ///
    /// Returns `None` when the kind count does not match the dimensions.
    #[must_use]
    pub fn from_layout(width: u32, height: u32, cell_size: f32, kinds: &[CellKind]) -> Option<Self> {
        let mut grid = Self::new(width, height, cell_size);
        if kinds.len() != grid.cells.len() {
            return None;
        }

        for (offset, kind) in kinds.iter().enumerate() {
            let x = (offset as u64 % u64::from(width)) as u32;
            let y = (offset as u64 / u64::from(width)) as u32;
            let _ = grid.set_kind(GridPos::new(x, y), *kind);
        }

        Some(grid)
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Side length of a square cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Reports whether the position lies within the grid bounds.
    #[must_use]
    pub const fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x() < self.width && pos.y() < self.height
    }

    /// Retrieves the cell at the position, if it lies within bounds.
    #[must_use]
    pub fn cell(&self, pos: GridPos) -> Option<&Cell> {
        self.index(pos).and_then(|index| self.cells.get(index))
    }

    /// Retrieves the cell kind at the position, if it lies within bounds.
    #[must_use]
    pub fn kind(&self, pos: GridPos) -> Option<CellKind> {
        self.cell(pos).map(|cell| cell.kind)
    }

    /// Updates a cell's kind, keeping the spawn and exit registries in sync.
    ///
    /// Returns `false` for out-of-bounds positions without mutating anything.
    pub fn set_kind(&mut self, pos: GridPos, kind: CellKind) -> bool {
        let Some(index) = self.index(pos) else {
            return false;
        };

        let previous = self.cells[index].kind;
        if previous == kind {
            return true;
        }

        self.cells[index].kind = kind;
        match previous {
            CellKind::Spawn => self.spawns.retain(|cell| *cell != pos),
            CellKind::Exit => self.exits.retain(|cell| *cell != pos),
            _ => {}
        }
        match kind {
            CellKind::Spawn => self.spawns.push(pos),
            CellKind::Exit => self.exits.push(pos),
            _ => {}
        }
        true
    }

    /// Tags a cell with a path group index for multi-lane maps.
    pub fn set_path_group(&mut self, pos: GridPos, group: u32) -> bool {
        match self.index(pos) {
            Some(index) => {
                self.cells[index].path_group = Some(group);
                true
            }
            None => false,
        }
    }

    /// Reports whether a tower may be placed on the cell.
    ///
    /// Towers occupy empty cells only; path, spawn, exit and blocked cells
    /// always refuse placement, so tower churn never affects routing.
    #[must_use]
    pub fn can_place_tower(&self, pos: GridPos) -> bool {
        matches!(self.kind(pos), Some(CellKind::Empty))
    }

    /// Marks the cell as occupied by the provided tower entity.
    ///
    /// Fails without mutation unless the cell is empty.
    pub fn place_tower(&mut self, pos: GridPos, tower: Entity) -> bool {
        if !self.can_place_tower(pos) {
            return false;
        }

        let Some(index) = self.index(pos) else {
            return false;
        };
        self.cells[index].kind = CellKind::TowerOccupied;
        self.cells[index].tower = Some(tower);
        true
    }

    /// Frees a tower-occupied cell back to empty, returning the evicted tower.
    pub fn remove_tower(&mut self, pos: GridPos) -> Option<Entity> {
        let index = self.index(pos)?;
        if self.cells[index].kind != CellKind::TowerOccupied {
            return None;
        }

        let tower = self.cells[index].tower.take();
        self.cells[index].kind = CellKind::Empty;
        tower
    }

    /// Reports whether ground enemies may traverse the cell.
    #[must_use]
    pub fn is_walkable(&self, pos: GridPos) -> bool {
        self.kind(pos).is_some_and(CellKind::is_walkable)
    }

    /// Cells enemies enter the grid from, in registration order.
    #[must_use]
    pub fn spawns(&self) -> &[GridPos] {
        &self.spawns
    }

    /// Cells enemies escape through, in registration order.
    #[must_use]
    pub fn exits(&self) -> &[GridPos] {
        &self.exits
    }

    /// Converts a grid position to the world-space centre of its cell.
    #[must_use]
    pub fn grid_to_world(&self, pos: GridPos) -> Option<Vec2> {
        if !self.in_bounds(pos) {
            return None;
        }

        Some(Vec2::new(
            (pos.x() as f32 + 0.5) * self.cell_size,
            (pos.y() as f32 + 0.5) * self.cell_size,
        ))
    }

    /// Converts a world-space point to the grid cell containing it.
    #[must_use]
    pub fn world_to_grid(&self, point: Vec2) -> Option<GridPos> {
        if point.x < 0.0 || point.y < 0.0 || self.cell_size <= 0.0 {
            return None;
        }

        let x = (point.x / self.cell_size) as u32;
        let y = (point.y / self.cell_size) as u32;
        let pos = GridPos::new(x, y);
        self.in_bounds(pos).then_some(pos)
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }

        let row = usize::try_from(pos.y()).ok()?;
        let column = usize::try_from(pos.x()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some(row * width + column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridMap {
        GridMap::new(4, 3, 32.0)
    }

    #[test]
    fn spawn_and_exit_registries_track_kind_mutations() {
        let mut grid = grid();
        let spawn = GridPos::new(0, 1);
        let exit = GridPos::new(3, 1);

        assert!(grid.set_kind(spawn, CellKind::Spawn));
        assert!(grid.set_kind(exit, CellKind::Exit));
        assert_eq!(grid.spawns(), &[spawn]);
        assert_eq!(grid.exits(), &[exit]);

        assert!(grid.set_kind(spawn, CellKind::Path));
        assert!(grid.spawns().is_empty());
        assert_eq!(grid.exits(), &[exit]);
    }

    #[test]
    fn towers_only_occupy_empty_cells() {
        let mut grid = grid();
        let cell = GridPos::new(1, 1);
        let tower = Entity::new(9);

        assert!(grid.set_kind(GridPos::new(2, 1), CellKind::Path));
        assert!(!grid.place_tower(GridPos::new(2, 1), tower));

        assert!(grid.can_place_tower(cell));
        assert!(grid.place_tower(cell, tower));
        assert_eq!(grid.kind(cell), Some(CellKind::TowerOccupied));
        assert!(!grid.place_tower(cell, Entity::new(10)));

        assert_eq!(grid.remove_tower(cell), Some(tower));
        assert_eq!(grid.kind(cell), Some(CellKind::Empty));
        assert!(grid.remove_tower(cell).is_none());
    }

    #[test]
    fn out_of_range_lookups_yield_none() {
        let mut grid = grid();
        let outside = GridPos::new(4, 0);

        assert!(grid.cell(outside).is_none());
        assert!(grid.kind(outside).is_none());
        assert!(!grid.set_kind(outside, CellKind::Path));
        assert!(grid.grid_to_world(outside).is_none());
        assert!(grid.world_to_grid(Vec2::new(-1.0, 5.0)).is_none());
        assert!(grid.world_to_grid(Vec2::new(1000.0, 5.0)).is_none());
    }

    #[test]
    fn grid_to_world_yields_cell_centres() {
        let grid = grid();
        let centre = grid.grid_to_world(GridPos::new(1, 2)).expect("in bounds");
        assert_eq!(centre, Vec2::new(48.0, 80.0));
        assert_eq!(grid.world_to_grid(centre), Some(GridPos::new(1, 2)));
    }

    #[test]
    fn layout_construction_requires_matching_dimensions() {
        let kinds = vec![CellKind::Empty; 11];
        assert!(GridMap::from_layout(4, 3, 32.0, &kinds).is_none());

        let mut kinds = vec![CellKind::Empty; 12];
        kinds[0] = CellKind::Spawn;
        kinds[11] = CellKind::Exit;
        let grid = GridMap::from_layout(4, 3, 32.0, &kinds).expect("dimensions match");
        assert_eq!(grid.spawns(), &[GridPos::new(0, 0)]);
        assert_eq!(grid.exits(), &[GridPos::new(3, 2)]);
    }
}
