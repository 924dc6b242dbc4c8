//! Ordered parallel map over blocks of work units.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

use hashbrown::HashSet;
use rayon::prelude::*;

/// Thread-local results of a map phase, in work order.
#[derive(Debug)]
pub(crate) struct MapOutput<L> {
    /// One buffer per fold split. Concatenating them in order yields the
    /// same sequence a sequential pass would produce.
    pub locals: Vec<L>,
    /// Distinct worker threads that took part.
    pub threads: usize,
}

/// Runs the per-cell map of one contour value on the current rayon pool.
///
/// Work units are grouped into blocks of `grain`. Each worker folds the
/// blocks it steals into its own buffer; the abort flag is read before
/// every block so a cancelled run stops after at most one block per worker.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MapPhase<'a> {
    abort: &'a AtomicBool,
}

impl<'a> MapPhase<'a> {
    pub fn new(abort: &'a AtomicBool) -> Self {
        Self { abort }
    }

    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    pub fn run<L, I, F>(&self, units: usize, grain: usize, init: I, work: F) -> MapOutput<L>
    where
        L: Send,
        I: Fn() -> L + Send + Sync,
        F: Fn(&mut L, Range<usize>) + Send + Sync,
    {
        let grain = grain.max(1);
        let blocks = units.div_ceil(grain);

        let locals: Vec<(Option<usize>, L)> = (0..blocks)
            .into_par_iter()
            .fold(
                || (rayon::current_thread_index(), init()),
                |mut local, block| {
                    if !self.is_aborted() {
                        let start = block * grain;
                        work(&mut local.1, start..(start + grain).min(units));
                    }
                    local
                },
            )
            .collect();

        let threads: HashSet<usize> = locals.iter().filter_map(|(thread, _)| *thread).collect();
        MapOutput {
            threads: threads.len().max(1),
            locals: locals.into_iter().map(|(_, local)| local).collect(),
        }
    }
}
