// Copyright 2022 Daniel Harrison. All Rights Reserved.

//! Sliding `(input, label)` windows over time-series tables
//!
//! A [WindowGenerator] is configured once with a window geometry and three
//! time-ordered [Frame]s (train, validation and test). It turns any of them
//! into a restartable [WindowDataset] of `(inputs, labels)` batches, each a
//! `[batch, time, feature]` array of `f32`.
//!
//! ```
//! use slidewin::{DatasetOptions, Frame, WindowConfig, WindowGenerator};
//!
//! let frame = Frame::new(vec![
//!     ("x".to_owned(), (0..10).map(|x| x as f32).collect()),
//!     ("y".to_owned(), (0..10).map(|x| (x * 10) as f32).collect()),
//! ])
//! .unwrap();
//! let generator = WindowGenerator::new(
//!     WindowConfig::new(3, 1, 1).with_label_columns(["y"]),
//!     frame.clone(),
//!     frame.clone(),
//!     frame,
//! )
//! .unwrap();
//!
//! let val = generator.val_with(DatasetOptions::eval().with_batch_size(4)).unwrap();
//! let (inputs, labels) = val.iter().next().unwrap().unwrap();
//! assert_eq!(inputs.shape(), &[4, 3, 2]);
//! assert_eq!(labels.shape(), &[4, 1, 1]);
//! assert_eq!(labels[[0, 0, 0]], 30.0);
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod error;
pub mod frame;
pub mod generator;
pub mod windows;

#[cfg(feature = "serde")]
pub mod serde;

pub use crate::error::{Error, Result};
pub use crate::frame::Frame;
pub use crate::generator::{
    Batch, Batches, DatasetOptions, ShapeSpec, Split, WindowConfig, WindowDataset, WindowGenerator,
};
pub use crate::windows::{TimeseriesWindowing, WindowBatch, WindowOptions, Windowing};

/// A set of data with a uniform schema, produced in batches.
///
/// Each batch can be generated purely as a function of its index and the
/// table's configuration, so a consumer may visit batches in any order.
pub trait Table {
    /// The batch type, reused across calls to [Table::gen_batch].
    type Batch;

    /// The number of batches of data in this table.
    fn num_batches(&self) -> usize;

    /// Generates the requested batch's data.
    ///
    /// This clears the given batch and reuses allocations when possible. If the
    /// requested index is out of bounds, an empty batch is generated.
    fn gen_batch(&self, idx: usize, batch: &mut Self::Batch);
}
