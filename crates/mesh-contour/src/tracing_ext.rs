//! Tracing extensions for contour extraction.
//!
//! Enable output by installing a subscriber in the application:
//!
//! ```rust,ignore
//! use tracing_subscriber::{fmt, prelude::*, EnvFilter};
//!
//! tracing_subscriber::registry()
//!     .with(fmt::layer())
//!     .with(EnvFilter::from_default_env())
//!     .init();
//!
//! // RUST_LOG=mesh_contour=debug for per-value output
//! ```
//!
//! # Log Levels
//!
//! - **WARN**: Skipped attribute arrays
//! - **INFO**: Per-call summaries, timing
//! - **DEBUG**: Per-value counts, scalar tree builds
//! - **TRACE**: Per-phase timing inside a value

use std::time::Instant;

use tracing::{debug, info, trace};

use crate::filter::ContourOutput;

/// A performance timer that logs duration on drop.
///
/// ```rust,ignore
/// use mesh_contour::tracing_ext::OperationTimer;
///
/// fn contour_mesh(cells: usize, points: usize) {
///     let _timer = OperationTimer::with_context("contour", cells, points);
///     // ... do work ...
/// } // Timer logs duration when dropped
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
}

impl OperationTimer {
    /// Create a timer carrying the input mesh size.
    pub fn with_context(name: &'static str, cell_count: usize, point_count: usize) -> Self {
        debug!(
            target: "mesh_contour::timing",
            operation = name,
            cells = cell_count,
            points = point_count,
            "Starting operation"
        );
        Self {
            name,
            start: Instant::now(),
        }
    }

    /// Get the elapsed time.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        info!(
            target: "mesh_contour::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", elapsed_ms),
            "Operation completed"
        );
    }
}

/// Guard that logs a phase's duration at trace level on drop.
pub struct PhaseGuard {
    phase: &'static str,
    start: Instant,
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        trace!(
            target: "mesh_contour::phase",
            phase = self.phase,
            elapsed_us = self.start.elapsed().as_micros() as u64,
            "Phase finished"
        );
    }
}

/// Time one phase of an extraction (map, sort, copy, ...).
pub fn log_phase(phase: &'static str) -> PhaseGuard {
    PhaseGuard {
        phase,
        start: Instant::now(),
    }
}

/// Log the result of one contour value at debug level.
pub fn log_value_result(index: usize, value: f64, points: usize, triangles: usize) {
    debug!(
        target: "mesh_contour::values",
        index,
        value,
        points,
        triangles,
        "Contour value extracted"
    );
}

/// Log a summary of a finished extraction at info level.
pub fn log_contour_stats(output: &ContourOutput) {
    let stats = &output.stats;
    info!(
        target: "mesh_contour::stats",
        points = output.point_count(),
        triangles = output.triangle_count(),
        values = stats.value_ranges.len(),
        merged = stats.merged,
        threads = stats.threads_used,
        large_ids = stats.large_ids,
        scalar_tree = stats.used_scalar_tree,
        cancelled = stats.cancelled,
        skipped_arrays = stats.skipped_arrays.len(),
        "Contour extraction finished"
    );
}
