//! Integration coverage for the A* search, the memoizing cache, and the
//! route manager.

use gridspire_core::{CellKind, GridPos};
use gridspire_system_pathfinding::{
    DIAGONAL_COST, PathCache, PathManager, Pathfinder, PathfinderConfig, STRAIGHT_COST,
};
use gridspire_world::GridMap;

const CELL_SIZE: f32 = 32.0;

fn grid_from_rows(rows: &[&str]) -> GridMap {
    let height = rows.len() as u32;
    let width = rows[0].len() as u32;
    let kinds: Vec<CellKind> = rows
        .iter()
        .flat_map(|row| row.chars())
        .map(|symbol| match symbol {
            '.' => CellKind::Empty,
            '#' => CellKind::Blocked,
            '=' => CellKind::Path,
            'S' => CellKind::Spawn,
            'E' => CellKind::Exit,
            other => panic!("unknown layout symbol {other}"),
        })
        .collect();
    GridMap::from_layout(width, height, CELL_SIZE, &kinds).expect("layout dimensions must match")
}

fn four_connected() -> Pathfinder {
    Pathfinder::new(PathfinderConfig {
        allow_diagonal: false,
    })
}

fn eight_connected() -> Pathfinder {
    Pathfinder::new(PathfinderConfig {
        allow_diagonal: true,
    })
}

#[test]
fn straight_corridor_costs_one_step_per_cell() {
    let grid = grid_from_rows(&["S===E"]);
    let path = four_connected()
        .find(&grid, GridPos::new(0, 0), GridPos::new(4, 0))
        .expect("corridor is connected");

    assert_eq!(path.len(), 5);
    assert_eq!(path.cost(), 4 * STRAIGHT_COST);
    assert_eq!(path.cells()[0], GridPos::new(0, 0));
    assert_eq!(path.cells()[4], GridPos::new(4, 0));
}

#[test]
fn four_connected_cost_matches_manhattan_distance_on_open_ground() {
    let grid = grid_from_rows(&["S===", "====", "===E"]);
    let start = GridPos::new(0, 0);
    let end = GridPos::new(3, 2);
    let path = four_connected()
        .find(&grid, start, end)
        .expect("open ground is connected");

    assert_eq!(
        path.cost(),
        start.manhattan_distance(end) * STRAIGHT_COST
    );
}

#[test]
fn path_routes_around_obstacles() {
    let grid = grid_from_rows(&["S=#=E", "==#==", "====="]);
    let path = four_connected()
        .find(&grid, GridPos::new(0, 0), GridPos::new(4, 0))
        .expect("detour exists below the wall");

    assert!(path.cells().iter().all(|&cell| grid.is_walkable(cell)));
    // Down, across, and back up: two extra cells versus the blocked row.
    assert_eq!(path.cost(), 8 * STRAIGHT_COST);
}

#[test]
fn diagonal_steps_shorten_the_open_field_crossing() {
    let grid = grid_from_rows(&["S==", "===", "==E"]);
    let start = GridPos::new(0, 0);
    let end = GridPos::new(2, 2);

    let cardinal = four_connected()
        .find(&grid, start, end)
        .expect("connected without diagonals");
    let diagonal = eight_connected()
        .find(&grid, start, end)
        .expect("connected with diagonals");

    assert_eq!(cardinal.cost(), 4 * STRAIGHT_COST);
    assert_eq!(diagonal.cost(), 2 * DIAGONAL_COST);
    assert_eq!(diagonal.len(), 3);
}

#[test]
fn diagonal_steps_never_cut_corners() {
    // The only diagonal from the spawn would squeeze between two walls.
    let grid = grid_from_rows(&["S#", "#E"]);
    let result = eight_connected().find(&grid, GridPos::new(0, 0), GridPos::new(1, 1));

    assert!(result.is_none());
}

#[test]
fn unwalkable_endpoints_yield_no_path() {
    let grid = grid_from_rows(&["S=#", "===", "#=E"]);
    let pathfinder = four_connected();

    assert!(pathfinder
        .find(&grid, GridPos::new(2, 0), GridPos::new(2, 2))
        .is_none());
    assert!(pathfinder
        .find(&grid, GridPos::new(0, 0), GridPos::new(0, 2))
        .is_none());
}

#[test]
fn disconnected_regions_yield_no_path() {
    let grid = grid_from_rows(&["S=#=E"]);
    let result = four_connected().find(&grid, GridPos::new(0, 0), GridPos::new(4, 0));

    assert!(result.is_none());
}

#[test]
fn cache_serves_repeat_queries_without_searching_again() {
    let grid = grid_from_rows(&["S===E"]);
    let pathfinder = four_connected();
    let mut cache = PathCache::new();
    let start = GridPos::new(0, 0);
    let end = GridPos::new(4, 0);

    let first = cache
        .find_path(&pathfinder, &grid, start, end)
        .cloned()
        .expect("corridor is connected");
    assert_eq!(cache.searches_run(), 1);

    let second = cache
        .find_path(&pathfinder, &grid, start, end)
        .cloned()
        .expect("memoized result");
    assert_eq!(cache.searches_run(), 1);
    assert_eq!(first, second);
}

#[test]
fn cache_memoizes_unreachable_pairs() {
    let grid = grid_from_rows(&["S=#=E"]);
    let pathfinder = four_connected();
    let mut cache = PathCache::new();
    let start = GridPos::new(0, 0);
    let end = GridPos::new(4, 0);

    assert!(cache.find_path(&pathfinder, &grid, start, end).is_none());
    assert!(cache.find_path(&pathfinder, &grid, start, end).is_none());
    assert_eq!(cache.searches_run(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn invalidation_bumps_the_version_and_forces_a_fresh_search() {
    let mut grid = grid_from_rows(&["S=#=E"]);
    let pathfinder = four_connected();
    let mut cache = PathCache::new();
    let start = GridPos::new(0, 0);
    let end = GridPos::new(4, 0);

    assert!(cache.find_path(&pathfinder, &grid, start, end).is_none());
    assert_eq!(cache.version(), 0);

    assert!(grid.set_kind(GridPos::new(2, 0), CellKind::Path));
    cache.invalidate();
    assert_eq!(cache.version(), 1);
    assert!(cache.is_empty());

    let path = cache
        .find_path(&pathfinder, &grid, start, end)
        .expect("corridor opened up");
    assert_eq!(path.cost(), 4 * STRAIGHT_COST);
    assert_eq!(cache.searches_run(), 2);
}

#[test]
fn manager_precomputes_one_route_per_reachable_pair() {
    let grid = grid_from_rows(&["S===E", "#####", "S===E"]);
    let manager = PathManager::new(PathfinderConfig::default(), 7, &grid);

    // Two spawns and two exits, but the wall splits them into two pairs.
    assert_eq!(manager.routes().len(), 2);
    for route in manager.routes() {
        assert_eq!(route.path.cells().first(), Some(&route.spawn));
        assert_eq!(route.path.cells().last(), Some(&route.exit));
    }
}

#[test]
fn manager_rebuilds_routes_when_the_map_changes() {
    let mut grid = grid_from_rows(&["S=#=E"]);
    let mut manager = PathManager::new(PathfinderConfig::default(), 7, &grid);
    assert!(manager.routes().is_empty());

    assert!(grid.set_kind(GridPos::new(2, 0), CellKind::Path));
    manager.on_map_changed(&grid);

    assert_eq!(manager.routes().len(), 1);
    assert_eq!(manager.cache().version(), 1);
}

#[test]
fn random_route_selection_is_deterministic_per_seed() {
    let grid = grid_from_rows(&["S===E", "=====", "S===E", "=====", "S===E"]);

    let pick_sequence = |seed: u64| {
        let mut manager = PathManager::new(PathfinderConfig::default(), seed, &grid);
        (0..16)
            .map(|_| {
                let route = manager.random_route().expect("routes exist");
                (route.spawn, route.exit)
            })
            .collect::<Vec<_>>()
    };

    assert_eq!(pick_sequence(42), pick_sequence(42));
    assert_ne!(pick_sequence(42), pick_sequence(43));
}

#[test]
fn flight_routes_skip_terrain_entirely() {
    let grid = grid_from_rows(&["S#E"]);
    let manager = PathManager::new(PathfinderConfig::default(), 7, &grid);

    assert!(manager.routes().is_empty());

    let route = manager.flight_route(GridPos::new(0, 0), GridPos::new(2, 0));
    assert_eq!(route.path.cells(), [GridPos::new(0, 0), GridPos::new(2, 0)]);
    assert_eq!(route.path.cost(), 2 * STRAIGHT_COST);
}
