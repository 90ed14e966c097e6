//! Procedural road-grid generation and routing
//!
//! A logical `W x H` lattice of intersection candidates is expanded into a
//! `(2W+1) x (2H+1)` fine grid of wall/road cells. A noise-ranked
//! depth-first carve produces a fully connected maze, an extra-loop pass
//! opens additional walls so the network contains cycles, boundary exits
//! become spawn/despawn points, and high-degree cells get traffic signals.
//! The same structure doubles as the routing graph for vehicles.

use anyhow::{bail, Result};
use ordered_float::OrderedFloat;
use petgraph::algo::astar;
use petgraph::graph::{NodeIndex, UnGraph};
use rand::rngs::StdRng;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;

use super::noise::PerlinNoise;
use super::signal::Intersection;
use super::types::{Direction, GridPos};

/// Noise sampling scale for ranking carve candidates
const CARVE_NOISE_SCALE: f64 = 0.5;

/// Noise sampling scale and threshold for the extra-loop pass
const LOOP_NOISE_SCALE: f64 = 0.3;
const LOOP_NOISE_THRESHOLD: f64 = 0.2;

/// A single cell of the fine grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridCell {
    /// Impassable
    Wall,
    /// Passable, degree <= 2
    Road,
    /// Passable, degree >= 3, carries a traffic signal
    Intersection,
}

impl GridCell {
    pub fn is_passable(&self) -> bool {
        !matches!(self, GridCell::Wall)
    }

    /// Numeric encoding used in observation vectors
    pub fn value(&self) -> f32 {
        match self {
            GridCell::Wall => 0.0,
            GridCell::Road => 1.0,
            GridCell::Intersection => 2.0,
        }
    }
}

/// The generated road network: fine grid, signals, and routing graph
///
/// Immutable after generation apart from the signal state inside each
/// [`Intersection`].
pub struct GridMap {
    /// Logical lattice dimensions
    pub width: usize,
    pub height: usize,
    /// Fine grid dimensions, `2 * width + 1` by `2 * height + 1`
    pub fine_width: usize,
    pub fine_height: usize,
    grid: Vec<Vec<GridCell>>,
    intersections: HashMap<GridPos, Intersection>,

    /// Routing graph over passable cells, unit edge weights
    graph: UnGraph<GridPos, u32>,
    pos_to_node: HashMap<GridPos, NodeIndex>,
}

impl GridMap {
    /// Generate a connected road network for a `width x height` logical grid
    ///
    /// Consumes the episode RNG in a fixed order, so the same seed always
    /// produces the same network and the same initial signal phases. Cannot
    /// fail for positive dimensions.
    pub fn generate(width: usize, height: usize, rng: &mut StdRng) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("Grid dimensions must be at least 1x1, got {width}x{height}");
        }

        let fine_width = width * 2 + 1;
        let fine_height = height * 2 + 1;
        let mut map = Self {
            width,
            height,
            fine_width,
            fine_height,
            grid: vec![vec![GridCell::Wall; fine_width]; fine_height],
            intersections: HashMap::new(),
            graph: UnGraph::default(),
            pos_to_node: HashMap::new(),
        };

        let noise = PerlinNoise::new(rng);
        map.carve_maze(&noise);
        map.add_extra_loops(&noise);
        map.add_boundary_exits();
        map.classify_intersections(rng);
        map.build_graph();

        Ok(map)
    }

    /// Randomized depth-first spanning-tree carve over the logical lattice
    ///
    /// Visits every logical cell exactly once, so the result is a fully
    /// connected perfect maze before the loop pass runs.
    fn carve_maze(&mut self, noise: &PerlinNoise) {
        let mut visited = vec![vec![false; self.width]; self.height];
        let mut stack = vec![(0usize, 0usize)];
        visited[0][0] = true;
        self.grid[1][1] = GridCell::Road;

        while let Some(&(cx, cy)) = stack.last() {
            let mut candidates: Vec<(OrderedFloat<f64>, usize, usize, i32, i32)> = Vec::new();
            for direction in Direction::ALL {
                let (dx, dy) = direction.offset();
                let nx = cx as i64 + dx as i64;
                let ny = cy as i64 + dy as i64;
                if nx < 0 || ny < 0 || nx >= self.width as i64 || ny >= self.height as i64 {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                if visited[ny][nx] {
                    continue;
                }
                let rank = noise.noise(nx as f64 * CARVE_NOISE_SCALE, ny as f64 * CARVE_NOISE_SCALE);
                candidates.push((OrderedFloat(rank), nx, ny, dx, dy));
            }

            if let Some(&(_, nx, ny, dx, dy)) = candidates
                .iter()
                .min_by_key(|&&(rank, nx, ny, _, _)| Reverse((rank, nx, ny)))
            {
                // Open the wall between the two logical cells, then the cell itself
                let wall_x = (1 + cx * 2) as i64 + dx as i64;
                let wall_y = (1 + cy * 2) as i64 + dy as i64;
                self.grid[wall_y as usize][wall_x as usize] = GridCell::Road;
                self.grid[1 + ny * 2][1 + nx * 2] = GridCell::Road;

                visited[ny][nx] = true;
                stack.push((nx, ny));
            } else {
                stack.pop();
            }
        }
    }

    /// Open extra east/south walls where a second noise sample exceeds the
    /// threshold, introducing cycles for route diversity
    fn add_extra_loops(&mut self, noise: &PerlinNoise) {
        for y in (1..self.fine_height - 1).step_by(2) {
            for x in (1..self.fine_width - 1).step_by(2) {
                if self.grid[y][x] != GridCell::Road {
                    continue;
                }
                for (dx, dy) in [(1usize, 0usize), (0, 1)] {
                    let (wx, wy) = (x + dx, y + dy);
                    if wx < self.fine_width - 1
                        && wy < self.fine_height - 1
                        && self.grid[wy][wx] == GridCell::Wall
                        && noise.noise(wx as f64 * LOOP_NOISE_SCALE, wy as f64 * LOOP_NOISE_SCALE)
                            > LOOP_NOISE_THRESHOLD
                    {
                        self.grid[wy][wx] = GridCell::Road;
                    }
                }
            }
        }
    }

    /// Open the outward-facing boundary wall next to every border road cell,
    /// creating spawn/despawn points on the grid edge
    fn add_boundary_exits(&mut self) {
        for x in (1..self.fine_width - 1).step_by(2) {
            if self.grid[1][x] == GridCell::Road {
                self.grid[0][x] = GridCell::Road;
            }
            if self.grid[self.fine_height - 2][x] == GridCell::Road {
                self.grid[self.fine_height - 1][x] = GridCell::Road;
            }
        }
        for y in (1..self.fine_height - 1).step_by(2) {
            if self.grid[y][1] == GridCell::Road {
                self.grid[y][0] = GridCell::Road;
            }
            if self.grid[y][self.fine_width - 2] == GridCell::Road {
                self.grid[y][self.fine_width - 1] = GridCell::Road;
            }
        }
    }

    /// Reclassify every passable cell with 3 or more passable neighbors as a
    /// signalized intersection
    fn classify_intersections(&mut self, rng: &mut StdRng) {
        self.intersections.clear();

        for y in 0..self.fine_height {
            for x in 0..self.fine_width {
                if self.grid[y][x] == GridCell::Wall {
                    continue;
                }
                let pos = GridPos::new(x, y);
                if self.passable_neighbor_count(pos) >= 3 {
                    self.grid[y][x] = GridCell::Intersection;
                    self.intersections.insert(pos, Intersection::new(pos, rng));
                }
            }
        }
    }

    /// Build the routing graph: one node per passable cell, one unit-weight
    /// edge per adjacent passable pair
    fn build_graph(&mut self) {
        for y in 0..self.fine_height {
            for x in 0..self.fine_width {
                let pos = GridPos::new(x, y);
                if self.cell(pos).is_passable() {
                    let node = self.graph.add_node(pos);
                    self.pos_to_node.insert(pos, node);
                }
            }
        }

        // Scan order keeps edge insertion deterministic, so equal-length
        // route tie-breaks are identical across runs with the same seed
        for y in 0..self.fine_height {
            for x in 0..self.fine_width {
                let pos = GridPos::new(x, y);
                let node = match self.pos_to_node.get(&pos) {
                    Some(&node) => node,
                    None => continue,
                };
                // East and south only, so each undirected edge is added once
                for direction in [Direction::East, Direction::South] {
                    if let Some(neighbor) = pos.step(direction, self.fine_width, self.fine_height) {
                        if let Some(&neighbor_node) = self.pos_to_node.get(&neighbor) {
                            self.graph.add_edge(node, neighbor_node, 1);
                        }
                    }
                }
            }
        }
    }

    pub fn cell(&self, pos: GridPos) -> GridCell {
        self.grid[pos.y][pos.x]
    }

    pub fn is_passable(&self, pos: GridPos) -> bool {
        pos.x < self.fine_width && pos.y < self.fine_height && self.cell(pos).is_passable()
    }

    /// All passable 4-neighbors of a cell
    pub fn neighbors(&self, pos: GridPos) -> Vec<GridPos> {
        Direction::ALL
            .iter()
            .filter_map(|&d| pos.step(d, self.fine_width, self.fine_height))
            .filter(|&n| self.cell(n).is_passable())
            .collect()
    }

    fn passable_neighbor_count(&self, pos: GridPos) -> usize {
        self.neighbors(pos).len()
    }

    /// Passable cells on the outer edge of the fine grid, in scan order
    pub fn boundary_cells(&self) -> Vec<GridPos> {
        let mut boundary = Vec::new();
        for x in 0..self.fine_width {
            if self.grid[0][x].is_passable() {
                boundary.push(GridPos::new(x, 0));
            }
            if self.grid[self.fine_height - 1][x].is_passable() {
                boundary.push(GridPos::new(x, self.fine_height - 1));
            }
        }
        for y in 1..self.fine_height - 1 {
            if self.grid[y][0].is_passable() {
                boundary.push(GridPos::new(0, y));
            }
            if self.grid[y][self.fine_width - 1].is_passable() {
                boundary.push(GridPos::new(self.fine_width - 1, y));
            }
        }
        boundary
    }

    /// Finds an unweighted shortest path between two passable cells
    ///
    /// The returned path includes both endpoints. Returns `None` when either
    /// endpoint is impassable or no connection exists; callers treat that as
    /// "do not spawn this vehicle".
    pub fn find_path(&self, start: GridPos, end: GridPos) -> Option<Vec<GridPos>> {
        let start_node = *self.pos_to_node.get(&start)?;
        let end_node = *self.pos_to_node.get(&end)?;

        if start == end {
            return Some(vec![start]);
        }

        // Manhattan distance is admissible on a unit-weight grid, so this is
        // an exact shortest path
        let (_, node_path) = astar(
            &self.graph,
            start_node,
            |node| node == end_node,
            |edge| *edge.weight(),
            |node| self.graph[node].manhattan_distance(&end) as u32,
        )?;

        Some(node_path.iter().map(|&node| self.graph[node]).collect())
    }

    pub fn intersections(&self) -> &HashMap<GridPos, Intersection> {
        &self.intersections
    }

    pub fn intersection(&self, pos: GridPos) -> Option<&Intersection> {
        self.intersections.get(&pos)
    }

    pub fn intersection_mut(&mut self, pos: GridPos) -> Option<&mut Intersection> {
        self.intersections.get_mut(&pos)
    }

    pub fn intersection_count(&self) -> usize {
        self.intersections.len()
    }

    /// Run the autonomous signal update on every intersection
    ///
    /// Iterates in position order so RNG consumption stays deterministic.
    pub fn update_all_intersections(&mut self, rng: &mut StdRng) {
        let mut positions: Vec<GridPos> = self.intersections.keys().copied().collect();
        positions.sort();
        for pos in positions {
            if let Some(intersection) = self.intersections.get_mut(&pos) {
                intersection.update(rng);
            }
        }
    }

    /// Flattened fine-grid cell values for observation vectors
    pub fn cell_values(&self) -> Vec<f32> {
        self.grid
            .iter()
            .flat_map(|row| row.iter().map(|cell| cell.value()))
            .collect()
    }
}

impl fmt::Display for GridMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.grid {
            for cell in row {
                let symbol = match cell {
                    GridCell::Wall => '█',
                    GridCell::Road => ' ',
                    GridCell::Intersection => '+',
                };
                write!(f, "{}", symbol)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
