//! Screen meshes: which pixels to integrate, and in what order.
//!
//! A mesh plans queues of pixels across integration iterations. The closed
//! set of meshes:
//!
//! - [`SimpleSquareMesh`] -- one iteration over a uniform square grid
//! - [`InputPixelsMesh`] -- one iteration over an explicit pixel list
//! - [`SquareSubdivisionMesh`] -- the adaptive mesh: starts from a coarse
//!   uniform grid and iteratively subdivides the squares whose corner
//!   values differ the most, as measured by the value diagnostic's
//!   distance function.

use log::{debug, trace, warn};

use crate::diagnostics::Diagnostic;
use crate::tensor::{LargeCounter, PixelCoord, ScreenIndex, ScreenPoint};

/// The mesh in use. Dispatches to the concrete variant.
pub enum Mesh {
    SimpleSquare(SimpleSquareMesh),
    InputPixels(InputPixelsMesh),
    SquareSubdivision(SquareSubdivisionMesh),
}

impl Mesh {
    /// Number of pixels queued for the current iteration.
    pub fn current_count(&self) -> LargeCounter {
        match self {
            Mesh::SimpleSquare(m) => m.current_count(),
            Mesh::InputPixels(m) => m.current_count(),
            Mesh::SquareSubdivision(m) => m.current_count(),
        }
    }

    /// Unit screen point and screen index for queue slot `index`.
    /// Read-only: safe to call concurrently during an iteration.
    pub fn next(&self, index: LargeCounter) -> (ScreenPoint, ScreenIndex) {
        match self {
            Mesh::SimpleSquare(m) => m.next(index),
            Mesh::InputPixels(m) => m.next(index),
            Mesh::SquareSubdivision(m) => m.next(index),
        }
    }

    /// Record the finished ray's final value for queue slot `index`.
    pub fn geodesic_finished(&mut self, index: LargeCounter, final_values: Vec<f64>) {
        match self {
            Mesh::SimpleSquare(_) | Mesh::InputPixels(_) => {}
            Mesh::SquareSubdivision(m) => m.geodesic_finished(index, final_values),
        }
    }

    /// Close the current iteration and plan the next queue.
    pub fn end_current_loop(&mut self) {
        match self {
            Mesh::SimpleSquare(m) => m.end_current_loop(),
            Mesh::InputPixels(m) => m.end_current_loop(),
            Mesh::SquareSubdivision(m) => m.end_current_loop(),
        }
    }

    /// True when no further iteration is wanted.
    pub fn finished(&self) -> bool {
        match self {
            Mesh::SimpleSquare(m) => m.finished(),
            Mesh::InputPixels(m) => m.finished(),
            Mesh::SquareSubdivision(m) => m.finished(),
        }
    }

    pub fn description(&self) -> String {
        match self {
            Mesh::SimpleSquare(m) => m.description(),
            Mesh::InputPixels(m) => m.description(),
            Mesh::SquareSubdivision(m) => m.description(),
        }
    }
}

fn unit_point(index: ScreenIndex, row_col_size: PixelCoord) -> ScreenPoint {
    // Degenerate single-pixel screens map to the upper-left corner.
    let denom = row_col_size.saturating_sub(1).max(1) as f64;
    ScreenPoint::new(index.row as f64 / denom, index.col as f64 / denom)
}

// ---------------------------------------------------------------------
// SimpleSquareMesh
// ---------------------------------------------------------------------

/// One iteration over an evenly spaced square grid of pixels.
pub struct SimpleSquareMesh {
    total_pixels: LargeCounter,
    row_col_size: PixelCoord,
    done: bool,
}

impl SimpleSquareMesh {
    /// `total_pixels` is rounded down to a perfect square.
    pub fn new(total_pixels: LargeCounter) -> Self {
        let row_col_size = (total_pixels as f64).sqrt() as PixelCoord;
        Self {
            total_pixels: row_col_size * row_col_size,
            row_col_size,
            done: false,
        }
    }

    fn current_count(&self) -> LargeCounter {
        if self.done {
            0
        } else {
            self.total_pixels
        }
    }

    fn next(&self, index: LargeCounter) -> (ScreenPoint, ScreenIndex) {
        if index >= self.total_pixels {
            warn!("SimpleSquareMesh asked for pixel {index} beyond its grid");
        }
        let screen_index = ScreenIndex::new(index / self.row_col_size, index % self.row_col_size);
        (unit_point(screen_index, self.row_col_size), screen_index)
    }

    fn end_current_loop(&mut self) {
        self.done = true;
    }

    fn finished(&self) -> bool {
        self.done
    }

    fn description(&self) -> String {
        format!("Mesh: simple square grid ({}^2 pixels)", self.row_col_size)
    }
}

// ---------------------------------------------------------------------
// InputPixelsMesh
// ---------------------------------------------------------------------

/// One iteration over an explicit list of pixels on a virtual square grid.
pub struct InputPixelsMesh {
    row_col_size: PixelCoord,
    pixels: Vec<ScreenIndex>,
    done: bool,
}

impl InputPixelsMesh {
    /// `total_pixels` fixes the virtual grid size (rounded down to a
    /// square); out-of-range entries are dropped with a warning.
    pub fn new(total_pixels: LargeCounter, pixels: Vec<(PixelCoord, PixelCoord)>) -> Self {
        let row_col_size = (total_pixels as f64).sqrt() as PixelCoord;
        let mut kept = Vec::with_capacity(pixels.len());
        for (row, col) in pixels {
            if row >= row_col_size || col >= row_col_size {
                warn!(
                    "pixel ({row}, {col}) lies outside the {row_col_size}x{row_col_size} screen; dropped"
                );
                continue;
            }
            kept.push(ScreenIndex::new(row, col));
        }
        if kept.is_empty() {
            warn!("no pixels in the integration list");
        }
        Self {
            row_col_size,
            pixels: kept,
            done: false,
        }
    }

    fn current_count(&self) -> LargeCounter {
        if self.done {
            0
        } else {
            self.pixels.len() as LargeCounter
        }
    }

    fn next(&self, index: LargeCounter) -> (ScreenPoint, ScreenIndex) {
        let screen_index = self.pixels[index as usize];
        (unit_point(screen_index, self.row_col_size), screen_index)
    }

    fn end_current_loop(&mut self) {
        self.done = true;
    }

    fn finished(&self) -> bool {
        self.done || self.pixels.is_empty()
    }

    fn description(&self) -> String {
        format!("Mesh: user-input pixels ({} pixels)", self.pixels.len())
    }
}

// ---------------------------------------------------------------------
// SquareSubdivisionMesh
// ---------------------------------------------------------------------

/// Everything the adaptive mesh tracks about one pixel.
#[derive(Debug, Clone)]
pub struct PixelInfo {
    pub index: ScreenIndex,
    /// 0 means the pixel sits on the right/bottom boundary and can never be
    /// subdivided; the initial grid is at 1; each increment halves the cell.
    pub subdivide_level: u32,
    /// Negative means stale: neighbors unresolved, value missing, or the
    /// subdivision level just advanced.
    pub weight: f64,
    /// The value diagnostic's final data value, set when the ray finishes.
    pub diag_value: Vec<f64>,
    /// Positions of the lower/right neighbors in `all_pixels`. Index 0 is
    /// the "no neighbor" sentinel: pixel (0, 0) is always first in
    /// `all_pixels` and can never be anyone's lower or right neighbor.
    pub lower_nbr: usize,
    pub right_nbr: usize,
}

impl PixelInfo {
    fn new(index: ScreenIndex, subdivide_level: u32) -> Self {
        Self {
            index,
            subdivide_level,
            weight: -1.0,
            diag_value: Vec::new(),
            lower_nbr: 0,
            right_nbr: 0,
        }
    }
}

/// Adaptive square-subdivision mesh.
///
/// Each interior pixel is the upper-left corner of a square; its weight is
/// the maximum value-distance to the square's other three corners. Each
/// iteration the highest-weight squares are split in four, spawning up to
/// five new pixels per split.
pub struct SquareSubdivisionMesh {
    initial_pixels: LargeCounter,
    max_subdivide: u32,
    row_col_size: PixelCoord,
    iteration_pixels: LargeCounter,
    max_pixels: LargeCounter,
    infinite_pixels: bool,
    initial_subdivide_to_final: bool,

    pixels_left: LargeCounter,
    current_queue: Vec<PixelInfo>,
    current_done: Vec<bool>,
    all_pixels: Vec<PixelInfo>,
    /// Set when a neighbor lookup fails; the mesh then stops planning.
    broken: bool,

    value_diagnostic: Box<dyn Diagnostic>,
}

impl SquareSubdivisionMesh {
    /// - `max_pixels`: total pixel budget over all iterations (0 = infinite)
    /// - `initial_pixels`: size of the uniform starting grid (rounded down
    ///   to a square)
    /// - `max_subdivide`: deepest allowed subdivision level (the initial
    ///   grid is level 1)
    /// - `iteration_pixels`: squares subdivided per iteration (each split
    ///   queues at most 5 new pixels)
    /// - `initial_subdivide_to_final`: once a square is split, keep
    ///   splitting its pixels until `max_subdivide` even at zero weight
    /// - `value_diagnostic`: supplies the distance between pixel values
    pub fn new(
        max_pixels: LargeCounter,
        initial_pixels: LargeCounter,
        max_subdivide: u32,
        iteration_pixels: LargeCounter,
        initial_subdivide_to_final: bool,
        value_diagnostic: Box<dyn Diagnostic>,
    ) -> Self {
        let max_subdivide = max_subdivide.max(1);
        let init_row_col = ((initial_pixels as f64).sqrt() as PixelCoord).max(1);
        let row_col_size = (init_row_col - 1) * (1u64 << (max_subdivide - 1)) + 1;

        let mut mesh = Self {
            initial_pixels: init_row_col * init_row_col,
            max_subdivide,
            row_col_size,
            iteration_pixels,
            max_pixels,
            infinite_pixels: max_pixels == 0,
            initial_subdivide_to_final,
            pixels_left: max_pixels,
            current_queue: Vec::new(),
            current_done: Vec::new(),
            all_pixels: Vec::new(),
            broken: false,
            value_diagnostic,
        };
        debug!(
            "SquareSubdivisionMesh constructed: max pixels: {}; initial pixels: {}; virtual grid edge: {}",
            if mesh.infinite_pixels {
                "infinite".to_string()
            } else {
                max_pixels.to_string()
            },
            mesh.initial_pixels,
            mesh.row_col_size
        );
        mesh.initialize_first_grid();
        mesh
    }

    /// Screen-index step between a pixel at `level` and its neighbors.
    fn cell_step(&self, level: u32) -> PixelCoord {
        1u64 << (self.max_subdivide - level)
    }

    fn initialize_first_grid(&mut self) {
        let k = (self.initial_pixels as f64).sqrt() as PixelCoord;
        let step = 1u64 << (self.max_subdivide - 1);
        self.current_queue.reserve(self.initial_pixels as usize);

        for i in 0..self.initial_pixels {
            let row = i / k;
            let col = i % k;
            // Right/bottom edge pixels can never be square corners.
            let subdiv = if row == k - 1 || col == k - 1 { 0 } else { 1 };
            self.current_queue
                .push(PixelInfo::new(ScreenIndex::new(row * step, col * step), subdiv));
        }

        if !self.infinite_pixels {
            self.pixels_left = self
                .pixels_left
                .saturating_sub(self.current_queue.len() as LargeCounter);
        }
        self.current_done = vec![false; self.current_queue.len()];
    }

    fn current_count(&self) -> LargeCounter {
        self.current_queue.len() as LargeCounter
    }

    fn next(&self, index: LargeCounter) -> (ScreenPoint, ScreenIndex) {
        let screen_index = self.current_queue[index as usize].index;
        (unit_point(screen_index, self.row_col_size), screen_index)
    }

    fn geodesic_finished(&mut self, index: LargeCounter, final_values: Vec<f64>) {
        self.current_queue[index as usize].diag_value = final_values;
        self.current_done[index as usize] = true;
    }

    fn finished(&self) -> bool {
        self.current_queue.is_empty()
    }

    fn position_in(pixels: &[PixelInfo], row: PixelCoord, col: PixelCoord) -> Option<usize> {
        pixels
            .iter()
            .position(|p| p.index.row == row && p.index.col == col)
    }

    /// Resolve the lower/right neighbors of every pixel that should have
    /// them and does not yet. Returns false when a neighbor is missing,
    /// which can only happen through a planning bug.
    fn update_all_neighbors(&mut self) -> bool {
        trace!("updating all pixel neighbor information");
        for i in 0..self.all_pixels.len() {
            let pixel = &self.all_pixels[i];
            if !(pixel.subdivide_level > 0 && pixel.lower_nbr == 0 && pixel.right_nbr == 0) {
                continue;
            }
            let step = self.cell_step(pixel.subdivide_level);
            let (row, col) = (pixel.index.row, pixel.index.col);

            let Some(right) = Self::position_in(&self.all_pixels, row, col + step) else {
                warn!(
                    "pixel {} does not have a right neighbor",
                    self.all_pixels[i].index
                );
                return false;
            };
            let Some(lower) = Self::position_in(&self.all_pixels, row + step, col) else {
                warn!(
                    "pixel {} does not have a lower neighbor",
                    self.all_pixels[i].index
                );
                return false;
            };
            self.all_pixels[i].right_nbr = right;
            self.all_pixels[i].lower_nbr = lower;
        }
        trace!("done updating pixel neighbor information");
        true
    }

    /// Diagonal-corner lookup policy: prefer right.lower; when the right
    /// neighbor sits on the bottom boundary (sentinel link), fall back to
    /// lower.right; `None` for the one pixel diagonally adjacent to the
    /// lower-right screen corner, whose weight then reuses the lower
    /// distance.
    fn diagonal_corner(all: &[PixelInfo], pixel: &PixelInfo) -> Option<usize> {
        if pixel.right_nbr > 0 && all[pixel.right_nbr].lower_nbr > 0 {
            Some(all[pixel.right_nbr].lower_nbr)
        } else if pixel.lower_nbr > 0 && all[pixel.lower_nbr].right_nbr > 0 {
            Some(all[pixel.lower_nbr].right_nbr)
        } else {
            None
        }
    }

    /// Refresh every stale weight. Assumes neighbors are resolved.
    fn update_all_weights(&mut self) {
        trace!("updating all pixel weights");
        let mut refreshed: Vec<(usize, f64)> = Vec::new();
        {
            let all = &self.all_pixels;
            let diag = &self.value_diagnostic;
            for (i, pixel) in all.iter().enumerate() {
                if !(pixel.weight < 0.0
                    && pixel.subdivide_level > 0
                    && pixel.subdivide_level < self.max_subdivide)
                {
                    continue;
                }

                let d_right = diag.distance(&pixel.diag_value, &all[pixel.right_nbr].diag_value);
                let d_lower = diag.distance(&pixel.diag_value, &all[pixel.lower_nbr].diag_value);
                let d_diag = match Self::diagonal_corner(all, pixel) {
                    Some(j) => diag.distance(&pixel.diag_value, &all[j].diag_value),
                    None => d_lower,
                };

                refreshed.push((i, d_right.max(d_lower).max(d_diag)));
            }
        }
        for (i, weight) in refreshed {
            self.all_pixels[i].weight = weight;
        }
        trace!("done updating pixel weights");
    }

    /// Split the square whose upper-left corner is `all_pixels[ind]`,
    /// queueing up to five new pixels.
    fn subdivide_and_queue(&mut self, ind: usize) {
        let new_level = self.all_pixels[ind].subdivide_level + 1;
        let step = self.cell_step(new_level);
        let base = self.all_pixels[ind].index;

        // The promoted pixel is not re-integrated; it only needs fresh
        // neighbors and a fresh weight at the finer level.
        let promoted = &mut self.all_pixels[ind];
        promoted.subdivide_level = new_level;
        promoted.weight = -1.0;
        promoted.lower_nbr = 0;
        promoted.right_nbr = 0;

        // The first three descendants become corners of finer squares; the
        // last two sit on the new block's right/bottom strip and never have
        // neighbors of their own.
        let cornered = [(0, step), (step, 0), (step, step)];
        let strip = [(2 * step, step), (step, 2 * step)];

        for (dr, dc) in cornered {
            let (row, col) = (base.row + dr, base.col + dc);
            if let Some(j) = Self::position_in(&self.all_pixels, row, col) {
                // Already integrated: promote in place.
                let existing = &mut self.all_pixels[j];
                existing.subdivide_level = new_level;
                existing.weight = -1.0;
                existing.lower_nbr = 0;
                existing.right_nbr = 0;
            } else if let Some(j) = Self::position_in(&self.current_queue, row, col) {
                // Reached again through another parent's subdivision.
                let queued = &mut self.current_queue[j];
                queued.subdivide_level = queued.subdivide_level.max(new_level);
            } else {
                self.current_queue
                    .push(PixelInfo::new(ScreenIndex::new(row, col), new_level));
            }
        }

        for (dr, dc) in strip {
            let (row, col) = (base.row + dr, base.col + dc);
            if Self::position_in(&self.all_pixels, row, col).is_none()
                && Self::position_in(&self.current_queue, row, col).is_none()
            {
                self.current_queue
                    .push(PixelInfo::new(ScreenIndex::new(row, col), 0));
            }
        }
    }

    fn end_current_loop(&mut self) {
        if self.current_done.iter().any(|done| !done) {
            warn!("not all pixels of the current iteration have been integrated");
        }

        // Move the finished queue into the integrated set.
        self.all_pixels.append(&mut self.current_queue);
        self.current_done.clear();
        debug!("total integrated geodesics so far: {}", self.all_pixels.len());

        if self.broken || (!self.infinite_pixels && self.pixels_left == 0) {
            // Budget exhausted (or planning failed): the queue stays empty
            // and the driver will observe finished().
            return;
        }

        debug!("calculating pixels to subdivide next");

        if !self.update_all_neighbors() {
            self.broken = true;
            return;
        }
        self.update_all_weights();

        // Candidates: subdividable pixels with either a positive weight or,
        // under initial_subdivide_to_final, any prior subdivision.
        let mut candidates: Vec<usize> = Vec::with_capacity(self.all_pixels.len());
        for (i, pixel) in self.all_pixels.iter().enumerate() {
            if pixel.subdivide_level > 0
                && pixel.subdivide_level < self.max_subdivide
                && (pixel.weight > 0.0
                    || (self.initial_subdivide_to_final && pixel.subdivide_level > 1))
            {
                candidates.push(i);
            }
        }

        // Highest weight first; ties go to the less-subdivided pixel.
        let all = &self.all_pixels;
        candidates.sort_by(|&a, &b| {
            all[b]
                .weight
                .total_cmp(&all[a].weight)
                .then(all[a].subdivide_level.cmp(&all[b].subdivide_level))
        });
        candidates.truncate(self.iteration_pixels as usize);

        trace!("subdividing {} pixels", candidates.len());
        self.current_queue.reserve(5 * candidates.len());
        for ind in candidates {
            self.subdivide_and_queue(ind);
        }

        // Tail truncation drops the least important work thanks to the
        // candidate ordering above.
        if !self.infinite_pixels && self.current_queue.len() as LargeCounter > self.pixels_left {
            self.current_queue.truncate(self.pixels_left as usize);
        }
        if !self.infinite_pixels {
            self.pixels_left -= self.current_queue.len() as LargeCounter;
        }
        self.current_done = vec![false; self.current_queue.len()];

        debug!(
            "next iteration has {} pixels queued",
            self.current_queue.len()
        );
    }

    fn description(&self) -> String {
        format!(
            "Mesh: square subdivision (initial pixels: {}^2; max subdivision: {}; pixels subdivided per iteration: {}; max total pixels: {}; if pixel is initially subdivided, will continue to max: {})",
            (self.initial_pixels as f64).sqrt() as PixelCoord,
            self.max_subdivide,
            self.iteration_pixels,
            if self.infinite_pixels {
                "infinite".to_string()
            } else {
                self.max_pixels.to_string()
            },
            self.initial_subdivide_to_final
        )
    }

    /// Pixels integrated in prior iterations (test and inspection hook).
    pub fn all_pixels(&self) -> &[PixelInfo] {
        &self.all_pixels
    }

    /// Remaining total budget; meaningful only for finite budgets.
    pub fn pixels_left(&self) -> LargeCounter {
        self.pixels_left
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticSpec, UpdateFrequency};

    fn four_color_diag() -> Box<dyn Diagnostic> {
        DiagnosticSpec::FourColorScreen {
            frequency: UpdateFrequency {
                n_steps: 0,
                on_start: false,
                on_finish: true,
            },
        }
        .instantiate()
    }

    /// 4x4 initial grid, three subdivision levels: virtual edge 13.
    fn mesh_16(max_pixels: LargeCounter, iteration_pixels: LargeCounter) -> SquareSubdivisionMesh {
        SquareSubdivisionMesh::new(max_pixels, 16, 3, iteration_pixels, false, four_color_diag())
    }

    fn finish_all(mesh: &mut SquareSubdivisionMesh, value_for: impl Fn(ScreenIndex) -> f64) {
        for i in 0..mesh.current_count() {
            let (_, idx) = mesh.next(i);
            mesh.geodesic_finished(i, vec![value_for(idx)]);
        }
    }

    #[test]
    fn initial_grid_layout() {
        let mesh = mesh_16(0, 2);
        assert_eq!(mesh.current_count(), 16);
        assert_eq!(mesh.row_col_size, 13);

        let (unit, idx) = mesh.next(0);
        assert_eq!(idx, ScreenIndex::new(0, 0));
        assert_eq!((unit.x, unit.y), (0.0, 0.0));

        let (unit, idx) = mesh.next(5);
        assert_eq!(idx, ScreenIndex::new(4, 4));
        assert!((unit.x - 4.0 / 12.0).abs() < 1e-15);

        // Interior pixels are level 1; right/bottom edges are level 0.
        for i in 0..16 {
            let (_, idx) = mesh.next(i);
            let level = mesh.current_queue[i as usize].subdivide_level;
            if idx.row == 12 || idx.col == 12 {
                assert_eq!(level, 0, "edge pixel {idx} must be level 0");
            } else {
                assert_eq!(level, 1, "interior pixel {idx} must be level 1");
            }
        }
    }

    #[test]
    fn uniform_values_converge_immediately() {
        let mut mesh = mesh_16(0, 2);
        finish_all(&mut mesh, |_| 1.0);
        mesh.end_current_loop();
        // All weights are zero: nothing to subdivide.
        assert!(mesh.finished());
        assert_eq!(mesh.all_pixels().len(), 16);
    }

    #[test]
    fn subdivision_spawns_five_descendants() {
        let mut mesh = mesh_16(0, 1);
        // Only the (0, 0) square has discordant corners.
        finish_all(&mut mesh, |idx| {
            if idx == ScreenIndex::new(0, 4) {
                2.0
            } else {
                1.0
            }
        });
        mesh.end_current_loop();

        assert!(!mesh.finished());
        // Weight ties between (0,0) and (0,4) break by queue order; with
        // one subdivision per iteration only (0,0) splits: descendants at
        // (0,2), (2,0), (2,2) with neighbors and (4,2), (2,4) without.
        let queued: Vec<(ScreenIndex, u32)> = mesh
            .current_queue
            .iter()
            .map(|p| (p.index, p.subdivide_level))
            .collect();
        assert_eq!(
            queued,
            vec![
                (ScreenIndex::new(0, 2), 2),
                (ScreenIndex::new(2, 0), 2),
                (ScreenIndex::new(2, 2), 2),
                (ScreenIndex::new(4, 2), 0),
                (ScreenIndex::new(2, 4), 0),
            ]
        );

        // The promoted pixel advanced a level, went stale, and dropped its
        // neighbor links.
        let promoted = &mesh.all_pixels()[0];
        assert_eq!(promoted.index, ScreenIndex::new(0, 0));
        assert_eq!(promoted.subdivide_level, 2);
        assert!(promoted.weight < 0.0);
        assert_eq!((promoted.lower_nbr, promoted.right_nbr), (0, 0));
    }

    #[test]
    fn neighbors_resolve_after_each_loop() {
        let mut mesh = mesh_16(0, 1);
        finish_all(&mut mesh, |idx| {
            if idx == ScreenIndex::new(0, 4) {
                2.0
            } else {
                1.0
            }
        });
        mesh.end_current_loop();
        finish_all(&mut mesh, |_| 1.0);
        mesh.end_current_loop();

        // Every pixel that can have neighbors either has them resolved or
        // was promoted in this very call.
        for (i, pixel) in mesh.all_pixels().iter().enumerate() {
            if pixel.subdivide_level == 0 || pixel.weight < 0.0 {
                continue;
            }
            assert!(
                pixel.right_nbr != 0 && pixel.lower_nbr != 0,
                "pixel {} (entry {i}) has unresolved neighbors",
                pixel.index
            );
            let step = mesh.cell_step(pixel.subdivide_level);
            let right = &mesh.all_pixels()[pixel.right_nbr];
            let lower = &mesh.all_pixels()[pixel.lower_nbr];
            assert_eq!(right.index, ScreenIndex::new(pixel.index.row, pixel.index.col + step));
            assert_eq!(lower.index, ScreenIndex::new(pixel.index.row + step, pixel.index.col));
        }
    }

    #[test]
    fn all_pixels_grows_monotonically_and_budget_shrinks() {
        let mut mesh = mesh_16(40, 2);
        assert_eq!(mesh.pixels_left(), 40 - 16);

        let mut seen = mesh.all_pixels().len();
        let mut budget = mesh.pixels_left();
        // Alternate values force continued refinement until the budget runs
        // out.
        let mut round = 0;
        while !mesh.finished() && round < 20 {
            finish_all(&mut mesh, |idx| ((idx.row + idx.col) % 3) as f64);
            mesh.end_current_loop();
            assert!(mesh.all_pixels().len() >= seen);
            assert!(mesh.pixels_left() <= budget);
            seen = mesh.all_pixels().len();
            budget = mesh.pixels_left();
            round += 1;
        }
        assert!(mesh.finished());
        // Never integrated more than the total budget.
        assert!(mesh.all_pixels().len() as u64 <= 40);
    }

    #[test]
    fn queue_truncates_against_remaining_budget() {
        // Budget of 18 leaves room for only 2 pixels after the initial 16.
        let mut mesh = mesh_16(18, 4);
        finish_all(&mut mesh, |idx| ((idx.row / 4 + idx.col / 4) % 2) as f64);
        mesh.end_current_loop();
        assert_eq!(mesh.current_count(), 2);
        assert_eq!(mesh.pixels_left(), 0);

        finish_all(&mut mesh, |_| 0.0);
        mesh.end_current_loop();
        assert!(mesh.finished());
    }

    #[test]
    fn shared_descendants_are_queued_once() {
        // Two adjacent squares subdivide in the same iteration; the pixel
        // between them is proposed by both but must be queued once.
        let mut mesh = mesh_16(0, 2);
        finish_all(&mut mesh, |idx| {
            if idx == ScreenIndex::new(0, 4) {
                2.0
            } else {
                1.0
            }
        });
        mesh.end_current_loop();

        let mut counts = std::collections::HashMap::new();
        for p in &mesh.current_queue {
            *counts.entry(p.index).or_insert(0u32) += 1;
        }
        for (idx, count) in counts {
            assert_eq!(count, 1, "pixel {idx} queued {count} times");
        }
    }

    #[test]
    fn initial_subdivide_to_final_keeps_splitting() {
        let mut mesh =
            SquareSubdivisionMesh::new(0, 16, 3, 16, true, four_color_diag());
        // One discordant corner starts the refinement.
        finish_all(&mut mesh, |idx| {
            if idx == ScreenIndex::new(0, 4) {
                2.0
            } else {
                1.0
            }
        });
        mesh.end_current_loop();
        // Follow-up iterations: uniform values everywhere. Without the
        // flag this would converge at level 2; with it, the split pixels
        // keep refining to level 3.
        let mut rounds = 0;
        while !mesh.finished() && rounds < 10 {
            finish_all(&mut mesh, |_| 1.0);
            mesh.end_current_loop();
            rounds += 1;
        }
        assert!(mesh.finished());
        let max_level = mesh
            .all_pixels()
            .iter()
            .map(|p| p.subdivide_level)
            .max()
            .unwrap();
        assert_eq!(max_level, 3);
    }

    #[test]
    fn simple_square_mesh_runs_once() {
        let mut mesh = SimpleSquareMesh::new(9);
        assert_eq!(mesh.current_count(), 9);
        let (unit, idx) = mesh.next(4);
        assert_eq!(idx, ScreenIndex::new(1, 1));
        assert_eq!((unit.x, unit.y), (0.5, 0.5));
        assert!(!mesh.finished());
        mesh.end_current_loop();
        assert!(mesh.finished());
        assert_eq!(mesh.current_count(), 0);
    }

    #[test]
    fn single_pixel_simple_mesh_is_degenerate_but_finite() {
        let mesh = SimpleSquareMesh::new(1);
        let (unit, idx) = mesh.next(0);
        assert_eq!(idx, ScreenIndex::new(0, 0));
        assert_eq!((unit.x, unit.y), (0.0, 0.0));
    }

    #[test]
    fn input_pixels_mesh_drops_out_of_range() {
        let mut mesh = InputPixelsMesh::new(100, vec![(0, 0), (5, 7), (10, 3), (3, 10)]);
        assert_eq!(mesh.current_count(), 2);
        let (_, idx) = mesh.next(1);
        assert_eq!(idx, ScreenIndex::new(5, 7));
        mesh.end_current_loop();
        assert!(mesh.finished());
    }
}
