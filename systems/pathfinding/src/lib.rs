#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! A* pathfinding over the grid map, with memoization and route management.
//!
//! The [`Pathfinder`] runs one search per call and holds no state between
//! calls. The [`PathCache`] memoizes results per `(start, end)` pair for the
//! lifetime of the current map layout. The [`PathManager`] precomputes one
//! route per reachable spawn/exit pair and hands them out to the spawning
//! collaborator, including the degenerate straight-line routes flying units
//! ride.

use std::collections::{BinaryHeap, HashMap};

use gridspire_core::GridPos;
use gridspire_world::GridMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Cost of a cardinal step, in milli-units.
pub const STRAIGHT_COST: u32 = 1_000;
/// Cost of a diagonal step, in milli-units (`√2` scaled and truncated).
pub const DIAGONAL_COST: u32 = 1_414;

const CARDINAL_NEIGHBOURS: [(i64, i64); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
const DIAGONAL_NEIGHBOURS: [(i64, i64); 4] = [(1, -1), (1, 1), (-1, 1), (-1, -1)];

/// Connectivity configuration for the search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathfinderConfig {
    /// Permits diagonal steps at `√2` cost when `true`.
    pub allow_diagonal: bool,
}

impl Default for PathfinderConfig {
    fn default() -> Self {
        Self {
            allow_diagonal: false,
        }
    }
}

/// Ordered sequence of walkable cells from a start to an end cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    cells: Vec<GridPos>,
    cost: u32,
}

impl Path {
    /// Cells composing the path, start first.
    #[must_use]
    pub fn cells(&self) -> &[GridPos] {
        &self.cells
    }

    /// Total weighted cost of the path in milli-units.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Number of cells on the path, endpoints included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the path holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Stateless A* search over walkable grid cells.
#[derive(Clone, Copy, Debug, Default)]
pub struct Pathfinder {
    config: PathfinderConfig,
}

impl Pathfinder {
    /// Creates a pathfinder with the provided connectivity configuration.
    #[must_use]
    pub const fn new(config: PathfinderConfig) -> Self {
        Self { config }
    }

    /// Searches for the cheapest walkable path from `start` to `end`.
    ///
    /// Returns `None` when either endpoint is unwalkable or no connection
    /// exists. The heuristic is the octile distance, admissible for the
    /// cardinal/diagonal cost model, so returned paths are optimal.
    #[must_use]
    pub fn find(&self, grid: &GridMap, start: GridPos, end: GridPos) -> Option<Path> {
        if !grid.is_walkable(start) || !grid.is_walkable(end) {
            return None;
        }

        let width = usize::try_from(grid.width()).ok()?;
        let height = usize::try_from(grid.height()).ok()?;
        let cell_count = width.checked_mul(height)?;

        let mut g_costs = vec![u32::MAX; cell_count];
        let mut parents: Vec<Option<usize>> = vec![None; cell_count];

        let start_index = index_of(width, start);
        let end_index = index_of(width, end);
        g_costs[start_index] = 0;

        // Ordered by f-cost with the cell index as a deterministic tie break.
        let mut open = BinaryHeap::new();
        open.push(std::cmp::Reverse((
            self.heuristic(start, end),
            start_index,
        )));

        while let Some(std::cmp::Reverse((_, current_index))) = open.pop() {
            if current_index == end_index {
                return Some(reconstruct(width, &parents, end_index, g_costs[end_index]));
            }

            let current = pos_of(width, current_index);
            let current_g = g_costs[current_index];

            for (step, offset) in neighbour_offsets(self.config.allow_diagonal) {
                let Some(neighbour) = offset_pos(current, offset, grid) else {
                    continue;
                };
                if !grid.is_walkable(neighbour) {
                    continue;
                }
                if step == DIAGONAL_COST && !diagonal_allowed(grid, current, offset) {
                    continue;
                }

                let neighbour_index = index_of(width, neighbour);
                let tentative = current_g.saturating_add(step);
                if tentative >= g_costs[neighbour_index] {
                    continue;
                }

                // Relaxation reinserts the node; stale heap entries are
                // filtered by the g-cost comparison above.
                g_costs[neighbour_index] = tentative;
                parents[neighbour_index] = Some(current_index);
                let f = tentative.saturating_add(self.heuristic(neighbour, end));
                open.push(std::cmp::Reverse((f, neighbour_index)));
            }
        }

        None
    }

    fn heuristic(&self, from: GridPos, to: GridPos) -> u32 {
        let dx = from.x().abs_diff(to.x());
        let dy = from.y().abs_diff(to.y());
        if self.config.allow_diagonal {
            octile_distance(dx, dy)
        } else {
            (dx + dy).saturating_mul(STRAIGHT_COST)
        }
    }
}

/// Octile distance between two cells in milli-units.
#[must_use]
pub fn octile_distance(dx: u32, dy: u32) -> u32 {
    let min = dx.min(dy);
    let max = dx.max(dy);
    STRAIGHT_COST
        .saturating_mul(max - min)
        .saturating_add(DIAGONAL_COST.saturating_mul(min))
}

fn neighbour_offsets(allow_diagonal: bool) -> impl Iterator<Item = (u32, (i64, i64))> {
    let cardinals = CARDINAL_NEIGHBOURS
        .into_iter()
        .map(|offset| (STRAIGHT_COST, offset));
    let diagonals = DIAGONAL_NEIGHBOURS
        .into_iter()
        .map(|offset| (DIAGONAL_COST, offset))
        .take(if allow_diagonal { 4 } else { 0 });
    cardinals.chain(diagonals)
}

fn offset_pos(from: GridPos, offset: (i64, i64), grid: &GridMap) -> Option<GridPos> {
    let x = i64::from(from.x()) + offset.0;
    let y = i64::from(from.y()) + offset.1;
    if x < 0 || y < 0 {
        return None;
    }
    let pos = GridPos::new(u32::try_from(x).ok()?, u32::try_from(y).ok()?);
    grid.in_bounds(pos).then_some(pos)
}

// Diagonal steps may not cut corners: both adjacent cardinal cells must be
// walkable.
fn diagonal_allowed(grid: &GridMap, from: GridPos, offset: (i64, i64)) -> bool {
    let horizontal = offset_pos(from, (offset.0, 0), grid);
    let vertical = offset_pos(from, (0, offset.1), grid);
    matches!((horizontal, vertical), (Some(h), Some(v)) if grid.is_walkable(h) && grid.is_walkable(v))
}

fn index_of(width: usize, pos: GridPos) -> usize {
    pos.y() as usize * width + pos.x() as usize
}

fn pos_of(width: usize, index: usize) -> GridPos {
    GridPos::new((index % width) as u32, (index / width) as u32)
}

fn reconstruct(width: usize, parents: &[Option<usize>], end_index: usize, cost: u32) -> Path {
    let mut cells = Vec::new();
    let mut cursor = Some(end_index);
    while let Some(index) = cursor {
        cells.push(pos_of(width, index));
        cursor = parents[index];
    }
    cells.reverse();
    Path { cells, cost }
}

/// Memoizing cache of search results for the current map layout.
///
/// The cache must be invalidated whenever the grid layout changes; tower
/// placement never requires invalidation because towers occupy non-walkable
/// cells by construction.
#[derive(Debug, Default)]
pub struct PathCache {
    entries: HashMap<(GridPos, GridPos), Option<Path>>,
    version: u64,
    searches_run: u64,
}

impl PathCache {
    /// Creates an empty cache at version zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up or computes the path for the `(start, end)` pair.
    ///
    /// "No path exists" is memoized too, so repeated queries against an
    /// unreachable pair never re-run the search.
    pub fn find_path(
        &mut self,
        pathfinder: &Pathfinder,
        grid: &GridMap,
        start: GridPos,
        end: GridPos,
    ) -> Option<&Path> {
        let searches_run = &mut self.searches_run;
        self.entries
            .entry((start, end))
            .or_insert_with(|| {
                *searches_run += 1;
                pathfinder.find(grid, start, end)
            })
            .as_ref()
    }

    /// Drops every memoized entry and bumps the version counter.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        self.version += 1;
    }

    /// Number of layout generations the cache has seen.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Number of searches executed on behalf of cache misses.
    #[must_use]
    pub const fn searches_run(&self) -> u64 {
        self.searches_run
    }

    /// Number of memoized `(start, end)` pairs, including negative results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One precomputed spawn-to-exit route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// Spawn cell the route begins on.
    pub spawn: GridPos,
    /// Exit cell the route ends on.
    pub exit: GridPos,
    /// Walkable path connecting the endpoints.
    pub path: Path,
}

/// Precomputes and serves routes between every reachable spawn/exit pair.
#[derive(Debug)]
pub struct PathManager {
    pathfinder: Pathfinder,
    cache: PathCache,
    routes: Vec<Route>,
    rng: ChaCha8Rng,
}

impl PathManager {
    /// Creates a manager and precomputes routes for the provided grid.
    #[must_use]
    pub fn new(config: PathfinderConfig, rng_seed: u64, grid: &GridMap) -> Self {
        let mut manager = Self {
            pathfinder: Pathfinder::new(config),
            cache: PathCache::new(),
            routes: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
        };
        manager.rebuild(grid);
        manager
    }

    /// Recomputes one route per reachable spawn/exit pair.
    fn rebuild(&mut self, grid: &GridMap) {
        self.routes.clear();
        for &spawn in grid.spawns() {
            for &exit in grid.exits() {
                let Some(path) =
                    self.cache
                        .find_path(&self.pathfinder, grid, spawn, exit)
                        .cloned()
                else {
                    continue;
                };
                self.routes.push(Route { spawn, exit, path });
            }
        }
    }

    /// Invalidates all cached paths and recomputes routes after a map edit.
    pub fn on_map_changed(&mut self, grid: &GridMap) {
        self.cache.invalidate();
        self.rebuild(grid);
    }

    /// Precomputed routes in deterministic spawn-major order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Retrieves a precomputed route by index.
    #[must_use]
    pub fn route(&self, index: usize) -> Option<&Route> {
        self.routes.get(index)
    }

    /// Selects a precomputed route uniformly at random.
    pub fn random_route(&mut self) -> Option<&Route> {
        if self.routes.is_empty() {
            return None;
        }
        let index = self.rng.gen_range(0..self.routes.len());
        self.routes.get(index)
    }

    /// Builds the straight-line route flying units ride.
    ///
    /// This is a business rule for terrain-ignoring entities, not a
    /// pathfinding result: the route holds only the two endpoints.
    #[must_use]
    pub fn flight_route(&self, spawn: GridPos, exit: GridPos) -> Route {
        let dx = spawn.x().abs_diff(exit.x());
        let dy = spawn.y().abs_diff(exit.y());
        Route {
            spawn,
            exit,
            path: Path {
                cells: vec![spawn, exit],
                cost: octile_distance(dx, dy),
            },
        }
    }

    /// Looks up or computes an arbitrary walkable path through the cache.
    pub fn find_path(
        &mut self,
        grid: &GridMap,
        start: GridPos,
        end: GridPos,
    ) -> Option<&Path> {
        self.cache.find_path(&self.pathfinder, grid, start, end)
    }

    /// Read-only access to cache statistics for diagnostics.
    #[must_use]
    pub const fn cache(&self) -> &PathCache {
        &self.cache
    }
}
