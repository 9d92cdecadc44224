// Copyright 2023 Daniel Harrison. All Rights Reserved.

//! Batches of overlapping windows over a dense `[rows, features]` array
//!
//! This is the boundary between index arithmetic and data movement. A
//! [Windowing] turns an array into a [Table] whose batches are contiguous row
//! spans (windows) of the array, optionally in a shuffled order.

use std::sync::Arc;

use ndarray::{s, Array2, ArrayView2, ArrayView3};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::Result;
use crate::Table;

/// Parameters for one pass of a [Windowing] over an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowOptions {
    /// The number of rows in each window.
    pub sequence_length: usize,
    /// The number of rows between the starts of successive windows.
    pub sequence_stride: usize,
    /// The maximum number of windows in each batch.
    pub batch_size: usize,
    /// Whether to visit windows in a random order.
    pub shuffle: bool,
    /// Seeds the window order when `shuffle` is set.
    pub seed: u64,
}

/// Chunks a dense array into batches of windows.
pub trait Windowing {
    /// The batches of one pass over the data.
    type Table: Table<Batch = WindowBatch>;

    /// Lays out the windows of `data` according to `options`.
    fn windows(&self, data: Arc<Array2<f32>>, options: &WindowOptions) -> Self::Table;
}

/// A reusable buffer of same-shaped windows.
///
/// Values are stored flat in `[window, row, feature]` order.
#[derive(Debug, Clone, Default)]
pub struct WindowBatch {
    values: Vec<f32>,
    windows: usize,
    window_len: usize,
    features: usize,
}

impl WindowBatch {
    /// Returns the number of windows in the batch.
    pub fn len(&self) -> usize {
        self.windows
    }

    /// Returns true if the batch holds no windows.
    pub fn is_empty(&self) -> bool {
        self.windows == 0
    }

    /// Appends a `[window_len, features]` window to the batch.
    ///
    /// The first window pushed after a clear fixes the shape of the batch.
    ///
    /// # Panics
    ///
    /// Panics if the window's shape differs from the batch's.
    pub fn push(&mut self, window: ArrayView2<'_, f32>) {
        let (window_len, features) = window.dim();
        if self.windows == 0 {
            self.window_len = window_len;
            self.features = features;
        }
        assert_eq!(
            (window_len, features),
            (self.window_len, self.features),
            "window shape should match the batch"
        );
        self.values.extend(window.iter().copied());
        self.windows += 1;
    }

    /// Clears all windows, leaving any allocations to be reused.
    pub fn clear(&mut self) {
        self.values.clear();
        self.windows = 0;
    }

    /// A `[windows, window_len, features]` view of the batch.
    pub fn view(&self) -> Result<ArrayView3<'_, f32>> {
        let shape = (self.windows, self.window_len, self.features);
        Ok(ArrayView3::from_shape(shape, &self.values[..])?)
    }
}

/// The default [Windowing].
///
/// Window starts are `0, stride, 2 * stride, ...` for as long as a whole
/// window fits in the data, so data shorter than one window yields nothing.
/// Windows are grouped in order into batches of `batch_size` and the last batch
/// may be short. When shuffling, the order of the window starts is permuted by
/// a generator seeded from the options, so a seed always gives the same order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeseriesWindowing;

impl Windowing for TimeseriesWindowing {
    type Table = TimeseriesWindows;

    fn windows(&self, data: Arc<Array2<f32>>, options: &WindowOptions) -> TimeseriesWindows {
        let num_rows = data.nrows();
        let stride = std::cmp::max(options.sequence_stride, 1);
        let mut starts = match num_rows.checked_sub(options.sequence_length) {
            Some(last) => (0..=last).step_by(stride).collect::<Vec<_>>(),
            None => Vec::new(),
        };
        if options.shuffle {
            let mut rng = SmallRng::seed_from_u64(options.seed);
            starts.shuffle(&mut rng);
        }
        log::trace!(
            "{} windows of {} rows over {} rows",
            starts.len(),
            options.sequence_length,
            num_rows
        );
        TimeseriesWindows {
            data,
            starts,
            sequence_length: options.sequence_length,
            batch_size: std::cmp::max(options.batch_size, 1),
        }
    }
}

/// The batches produced by [TimeseriesWindowing].
#[derive(Debug, Clone)]
pub struct TimeseriesWindows {
    data: Arc<Array2<f32>>,
    starts: Vec<usize>,
    sequence_length: usize,
    batch_size: usize,
}

impl TimeseriesWindows {
    /// The first row of each window, in visiting order.
    pub fn starts(&self) -> &[usize] {
        &self.starts
    }
}

impl Table for TimeseriesWindows {
    type Batch = WindowBatch;

    fn num_batches(&self) -> usize {
        self.starts.len().div_ceil(self.batch_size)
    }

    fn gen_batch(&self, idx: usize, batch: &mut WindowBatch) {
        batch.clear();
        let window_start = std::cmp::min(idx.saturating_mul(self.batch_size), self.starts.len());
        let window_end = std::cmp::min(
            window_start.saturating_add(self.batch_size),
            self.starts.len(),
        );
        for &start in &self.starts[window_start..window_end] {
            batch.push(self.data.slice(s![start..start + self.sequence_length, ..]));
        }
    }
}
