// Copyright 2023 Daniel Harrison. All Rights Reserved.

//! `(input, label)` windows for supervised sequence learning
//!
//! A window is `input_width + shift` consecutive rows. The first `input_width`
//! rows are the inputs and the last `label_width` rows are the labels, so with
//! `shift == label_width` the labels immediately follow the inputs and with a
//! larger shift there is a gap between them.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use ndarray::{s, Array2, Array3, ArrayView3, Axis};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::windows::{TimeseriesWindowing, WindowBatch, WindowOptions, Windowing};
use crate::Table;

/// An `(inputs, labels)` pair of `[batch, time, feature]` arrays.
pub type Batch = (Array3<f32>, Array3<f32>);

/// Configuration for [WindowGenerator].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct WindowConfig {
    /// The number of input rows in each window.
    pub input_width: usize,
    /// The number of label rows in each window.
    pub label_width: usize,
    /// The offset of the last label row from the last input row.
    pub shift: usize,
    /// The columns to keep in the labels, in order. All columns are kept if
    /// unset.
    pub label_columns: Option<Vec<String>>,
}

impl WindowConfig {
    /// A configuration with the given geometry whose labels keep all columns.
    pub fn new(input_width: usize, label_width: usize, shift: usize) -> Self {
        WindowConfig {
            input_width,
            label_width,
            shift,
            label_columns: None,
        }
    }

    /// Restricts the labels to the given columns, in the given order.
    pub fn with_label_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.label_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }
}

/// How a [WindowDataset] walks its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    any(test, feature = "serde"),
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct DatasetOptions {
    /// The number of rows between the starts of successive windows.
    pub sequence_stride: usize,
    /// Whether each pass visits windows in a fresh random order.
    pub shuffle: bool,
    /// The maximum number of windows in each batch.
    pub batch_size: usize,
    /// Seeds the shuffle. A random seed is picked per dataset if unset.
    pub seed: Option<u64>,
}

impl DatasetOptions {
    /// The defaults for training: stride 1, shuffled, batches of 32.
    pub const fn train() -> Self {
        DatasetOptions {
            sequence_stride: 1,
            shuffle: true,
            batch_size: 32,
            seed: None,
        }
    }

    /// The defaults for validation and testing: stride 1, in order, batches of
    /// 32.
    pub const fn eval() -> Self {
        DatasetOptions {
            shuffle: false,
            ..DatasetOptions::train()
        }
    }

    /// Sets the stride.
    pub fn with_sequence_stride(mut self, sequence_stride: usize) -> Self {
        self.sequence_stride = sequence_stride;
        self
    }

    /// Sets whether to shuffle.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Sets the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Fixes the shuffle seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// One of the three tables held by a [WindowGenerator].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    /// The training table.
    Train,
    /// The validation table.
    Val,
    /// The test table.
    Test,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        })
    }
}

/// The static shape of a `[batch, time, feature]` array. `None` axes vary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeSpec(pub [Option<usize>; 3]);

impl ShapeSpec {
    /// Returns true if `shape` has three axes that agree with every fixed one.
    pub fn matches(&self, shape: &[usize]) -> bool {
        shape.len() == 3
            && self
                .0
                .iter()
                .zip(shape)
                .all(|(spec, len)| spec.map_or(true, |x| x == *len))
    }
}

impl fmt::Display for ShapeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (idx, axis) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            match axis {
                Some(x) => write!(f, "{}", x)?,
                None => f.write_str("None")?,
            }
        }
        f.write_str(")")
    }
}

/// Slices time-series tables into `(input, label)` windows.
///
/// The geometry and all derived indexes are fixed at construction. The only
/// state that changes afterward is the cached [WindowGenerator::example].
#[derive(Debug)]
pub struct WindowGenerator<W = TimeseriesWindowing> {
    config: WindowConfig,
    total_window_size: usize,
    input_slice: Range<usize>,
    label_slice: Range<usize>,
    column_indices: HashMap<String, usize>,
    label_columns_indices: HashMap<String, usize>,
    // Schema positions of the label columns, in label order.
    label_gather: Option<Vec<usize>>,
    train_df: Frame,
    val_df: Frame,
    test_df: Frame,
    windowing: W,
    example: OnceLock<Batch>,
}

impl WindowGenerator<TimeseriesWindowing> {
    /// Constructs a generator over the given tables.
    ///
    /// `val` and `test` must have exactly the columns of `train`, in the same
    /// order.
    pub fn new(config: WindowConfig, train: Frame, val: Frame, test: Frame) -> Result<Self> {
        WindowGenerator::with_windowing(TimeseriesWindowing, config, train, val, test)
    }
}

impl<W: Windowing> WindowGenerator<W> {
    /// Like [WindowGenerator::new] but with a custom [Windowing].
    pub fn with_windowing(
        windowing: W,
        config: WindowConfig,
        train: Frame,
        val: Frame,
        test: Frame,
    ) -> Result<Self> {
        let WindowConfig {
            input_width,
            label_width,
            shift,
            ..
        } = config;
        for (name, x) in [
            ("input_width", input_width),
            ("label_width", label_width),
            ("shift", shift),
        ] {
            if x == 0 {
                return Err(Error::ZeroWidth { name });
            }
        }
        if shift < label_width {
            return Err(Error::LabelBeforeWindow { shift, label_width });
        }
        for (split, frame) in [(Split::Val, &val), (Split::Test, &test)] {
            if frame.columns() != train.columns() {
                return Err(Error::SchemaMismatch {
                    split,
                    expected: train.columns().to_vec(),
                    actual: frame.columns().to_vec(),
                });
            }
        }

        let column_indices = train.column_indices();
        let (label_columns_indices, label_gather) = match &config.label_columns {
            Some(names) => {
                let gather = names
                    .iter()
                    .map(|name| {
                        column_indices
                            .get(name)
                            .copied()
                            .ok_or_else(|| Error::UnknownColumn(name.clone()))
                    })
                    .collect::<Result<Vec<_>>>()?;
                let indices = names
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| (name.clone(), idx))
                    .collect();
                (indices, Some(gather))
            }
            None => (HashMap::new(), None),
        };

        let total_window_size = input_width + shift;
        let label_start = total_window_size - label_width;
        let generator = WindowGenerator {
            config,
            total_window_size,
            input_slice: 0..input_width,
            label_slice: label_start..total_window_size,
            column_indices,
            label_columns_indices,
            label_gather,
            train_df: train,
            val_df: val,
            test_df: test,
            windowing,
            example: OnceLock::new(),
        };
        log::debug!(
            "window generator: total {} inputs {:?} labels {:?} label columns {:?}",
            generator.total_window_size,
            generator.input_slice,
            generator.label_slice,
            generator.config.label_columns
        );
        Ok(generator)
    }

    /// The configuration this generator was built with.
    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// The number of input rows in each window.
    pub fn input_width(&self) -> usize {
        self.config.input_width
    }

    /// The number of label rows in each window.
    pub fn label_width(&self) -> usize {
        self.config.label_width
    }

    /// The offset of the last label row from the last input row.
    pub fn shift(&self) -> usize {
        self.config.shift
    }

    /// The number of consecutive rows consumed by each window.
    pub fn total_window_size(&self) -> usize {
        self.total_window_size
    }

    /// The row within a window at which the labels start.
    pub fn label_start(&self) -> usize {
        self.label_slice.start
    }

    /// The input rows within a window.
    pub fn input_slice(&self) -> Range<usize> {
        self.input_slice.clone()
    }

    /// The label rows within a window.
    pub fn label_slice(&self) -> Range<usize> {
        self.label_slice.clone()
    }

    /// The input rows within a window, as a list.
    pub fn input_indices(&self) -> Vec<usize> {
        self.input_slice().collect()
    }

    /// The label rows within a window, as a list.
    pub fn label_indices(&self) -> Vec<usize> {
        self.label_slice().collect()
    }

    /// A map from each column name to its position in the schema.
    pub fn column_indices(&self) -> &HashMap<String, usize> {
        &self.column_indices
    }

    /// The columns kept in the labels, if restricted.
    pub fn label_columns(&self) -> Option<&[String]> {
        self.config.label_columns.as_deref()
    }

    /// A map from each label column name to its position in the labels.
    ///
    /// Empty when the labels keep all columns.
    pub fn label_columns_indices(&self) -> &HashMap<String, usize> {
        &self.label_columns_indices
    }

    /// The table for the given split.
    pub fn frame(&self, split: Split) -> &Frame {
        match split {
            Split::Train => &self.train_df,
            Split::Val => &self.val_df,
            Split::Test => &self.test_df,
        }
    }

    /// The training table.
    pub fn train_df(&self) -> &Frame {
        &self.train_df
    }

    /// The validation table.
    pub fn val_df(&self) -> &Frame {
        &self.val_df
    }

    /// The test table.
    pub fn test_df(&self) -> &Frame {
        &self.test_df
    }

    /// The static shapes of the inputs and labels produced by
    /// [WindowGenerator::split_window].
    ///
    /// The batch and feature axes vary; the time axes are fixed.
    pub fn element_spec(&self) -> (ShapeSpec, ShapeSpec) {
        (
            ShapeSpec([None, Some(self.config.input_width), None]),
            ShapeSpec([None, Some(self.config.label_width), None]),
        )
    }

    /// Splits a `[batch, total_window_size, features]` batch of windows into
    /// inputs and labels.
    ///
    /// Inputs are `[batch, input_width, features]`. Labels are `[batch,
    /// label_width, features]`, with the feature axis narrowed to the label
    /// columns if set.
    pub fn split_window(&self, batch: ArrayView3<'_, f32>) -> Result<Batch> {
        let (_, window_len, features) = batch.dim();
        if window_len != self.total_window_size {
            return Err(Error::WindowLength {
                expected: self.total_window_size,
                actual: window_len,
            });
        }
        if features != self.column_indices.len() {
            return Err(Error::FeatureCount {
                expected: self.column_indices.len(),
                actual: features,
            });
        }

        let inputs = batch.slice(s![.., self.input_slice.clone(), ..]).to_owned();
        let labels = batch.slice(s![.., self.label_slice.clone(), ..]);
        let labels = match &self.label_gather {
            Some(gather) => labels.select(Axis(2), gather),
            None => labels.to_owned(),
        };
        Ok((inputs, labels))
    }

    /// Builds a dataset of `(inputs, labels)` batches over `data`.
    ///
    /// Nothing is windowed until the dataset is iterated.
    pub fn make_dataset(
        &self,
        data: &Frame,
        options: DatasetOptions,
    ) -> Result<WindowDataset<'_, W>> {
        if options.sequence_stride == 0 {
            return Err(Error::ZeroStride);
        }
        if options.batch_size == 0 {
            return Err(Error::ZeroBatchSize);
        }
        let seed = match options.seed {
            Some(seed) => seed,
            None => SmallRng::from_entropy().gen(),
        };
        log::debug!(
            "dataset over {} rows: stride {} shuffle {} batch_size {} seed {}",
            data.num_rows(),
            options.sequence_stride,
            options.shuffle,
            options.batch_size,
            seed
        );
        Ok(WindowDataset {
            generator: self,
            data: Arc::new(data.to_array()),
            options,
            seed,
            epochs: AtomicU64::new(0),
        })
    }

    /// A dataset over the given split's table.
    pub fn dataset(&self, split: Split, options: DatasetOptions) -> Result<WindowDataset<'_, W>> {
        self.make_dataset(self.frame(split), options)
    }

    /// A shuffled dataset over the training table with
    /// [DatasetOptions::train].
    pub fn train(&self) -> Result<WindowDataset<'_, W>> {
        self.train_with(DatasetOptions::train())
    }

    /// A dataset over the training table.
    pub fn train_with(&self, options: DatasetOptions) -> Result<WindowDataset<'_, W>> {
        self.dataset(Split::Train, options)
    }

    /// An in-order dataset over the validation table with
    /// [DatasetOptions::eval].
    pub fn val(&self) -> Result<WindowDataset<'_, W>> {
        self.val_with(DatasetOptions::eval())
    }

    /// A dataset over the validation table.
    pub fn val_with(&self, options: DatasetOptions) -> Result<WindowDataset<'_, W>> {
        self.dataset(Split::Val, options)
    }

    /// An in-order dataset over the test table with [DatasetOptions::eval].
    pub fn test(&self) -> Result<WindowDataset<'_, W>> {
        self.test_with(DatasetOptions::eval())
    }

    /// A dataset over the test table.
    pub fn test_with(&self, options: DatasetOptions) -> Result<WindowDataset<'_, W>> {
        self.dataset(Split::Test, options)
    }

    /// The first batch of [WindowGenerator::train], for inspecting shapes.
    ///
    /// Computed on first use and cached for the life of the generator.
    pub fn example(&self) -> Result<&Batch> {
        self.example_with(DatasetOptions::train())
    }

    /// Like [WindowGenerator::example], with the options used if the example
    /// has not been computed yet.
    pub fn example_with(&self, options: DatasetOptions) -> Result<&Batch> {
        if let Some(example) = self.example.get() {
            return Ok(example);
        }
        let dataset = self.train_with(options)?;
        let batch = dataset
            .iter()
            .next()
            .ok_or(Error::EmptyDataset(Split::Train))??;
        // A concurrent caller may have won the race; either batch is valid.
        Ok(self.example.get_or_init(|| batch))
    }
}

impl<W> fmt::Display for WindowGenerator<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn indices(f: &mut fmt::Formatter<'_>, range: &Range<usize>) -> fmt::Result {
            f.write_str("[")?;
            for x in range.clone() {
                if x > range.start {
                    f.write_str(" ")?;
                }
                write!(f, "{}", x)?;
            }
            f.write_str("]")
        }

        writeln!(f, "Total window size: {}", self.total_window_size)?;
        f.write_str("Input indices: ")?;
        indices(f, &self.input_slice)?;
        f.write_str("\nLabel indices: ")?;
        indices(f, &self.label_slice)?;
        f.write_str("\nLabel column name(s): ")?;
        match &self.config.label_columns {
            Some(names) => {
                f.write_str("[")?;
                for (idx, name) in names.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "'{}'", name)?;
                }
                f.write_str("]")
            }
            None => f.write_str("None"),
        }
    }
}

/// A restartable sequence of `(inputs, labels)` batches over one table.
///
/// Every call to [WindowDataset::iter] is a new pass (epoch) that redoes the
/// windowing. Shuffled datasets visit windows in a different order each pass.
#[derive(Debug)]
pub struct WindowDataset<'g, W = TimeseriesWindowing> {
    generator: &'g WindowGenerator<W>,
    data: Arc<Array2<f32>>,
    options: DatasetOptions,
    seed: u64,
    epochs: AtomicU64,
}

impl<'g, W: Windowing> WindowDataset<'g, W> {
    /// The options this dataset was built with.
    pub fn options(&self) -> &DatasetOptions {
        &self.options
    }

    /// The base shuffle seed. Pass `n` is shuffled with `seed + n`.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The number of batches in each pass.
    pub fn num_batches(&self) -> usize {
        self.table(self.seed).num_batches()
    }

    /// Starts a new pass over the batches.
    pub fn iter(&self) -> Batches<'g, W> {
        let epoch = self.epochs.fetch_add(1, Ordering::Relaxed);
        log::trace!("dataset epoch {}", epoch);
        Batches {
            generator: self.generator,
            table: self.table(self.seed.wrapping_add(epoch)),
            idx: 0,
            batch: WindowBatch::default(),
        }
    }

    fn table(&self, seed: u64) -> W::Table {
        let options = WindowOptions {
            sequence_length: self.generator.total_window_size,
            sequence_stride: self.options.sequence_stride,
            batch_size: self.options.batch_size,
            shuffle: self.options.shuffle,
            seed,
        };
        self.generator
            .windowing
            .windows(Arc::clone(&self.data), &options)
    }
}

impl<'a, 'g, W: Windowing> IntoIterator for &'a WindowDataset<'g, W> {
    type Item = Result<Batch>;
    type IntoIter = Batches<'g, W>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One pass over a [WindowDataset].
pub struct Batches<'g, W: Windowing = TimeseriesWindowing> {
    generator: &'g WindowGenerator<W>,
    table: W::Table,
    idx: usize,
    // For allocation reuse
    batch: WindowBatch,
}

impl<W: Windowing> fmt::Debug for Batches<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batches")
            .field("idx", &self.idx)
            .field("num_batches", &self.table.num_batches())
            .finish_non_exhaustive()
    }
}

impl<W: Windowing> Iterator for Batches<'_, W> {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.table.num_batches() {
            return None;
        }
        self.table.gen_batch(self.idx, &mut self.batch);
        self.idx += 1;
        let view = match self.batch.view() {
            Ok(x) => x,
            Err(err) => return Some(Err(err)),
        };
        Some(self.generator.split_window(view))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.table.num_batches().saturating_sub(self.idx);
        (remaining, Some(remaining))
    }
}

impl<W: Windowing> ExactSizeIterator for Batches<'_, W> {}

#[cfg(test)]
mod tests {
    use super::*;

    /// Columns `a`, `b` and `y` where row `r` of column `c` holds `10 * r + c`.
    fn frame(rows: usize) -> Frame {
        let col = |c: usize| (0..rows).map(|r| (10 * r + c) as f32).collect::<Vec<_>>();
        Frame::new(vec![
            ("a".to_owned(), col(0)),
            ("b".to_owned(), col(1)),
            ("y".to_owned(), col(2)),
        ])
        .unwrap()
    }

    fn generator(config: WindowConfig, rows: usize) -> WindowGenerator {
        WindowGenerator::new(config, frame(rows), frame(rows), frame(rows)).unwrap()
    }

    fn collect<W: Windowing>(dataset: &WindowDataset<'_, W>) -> Vec<Batch> {
        dataset.iter().collect::<Result<Vec<_>>>().unwrap()
    }

    #[test]
    fn geometry() {
        #[track_caller]
        fn test_case(input_width: usize, label_width: usize, shift: usize) {
            let g = generator(WindowConfig::new(input_width, label_width, shift), 10);
            let total = input_width + shift;
            assert_eq!(g.total_window_size(), total);
            assert_eq!(g.label_start(), total - label_width);
            assert_eq!(g.input_indices(), (0..input_width).collect::<Vec<_>>());
            assert_eq!(g.label_indices(), (total - label_width..total).collect::<Vec<_>>());
            assert_eq!(g.label_slice().len(), label_width);
        }

        test_case(6, 1, 1);
        test_case(24, 24, 24);
        test_case(3, 1, 3);
        test_case(1, 2, 5);

        let g = generator(WindowConfig::new(3, 1, 1), 10);
        assert_eq!(g.column_indices()["y"], 2);
        assert_eq!(g.label_columns(), None);
        assert!(g.label_columns_indices().is_empty());

        let g = generator(WindowConfig::new(3, 1, 1).with_label_columns(["y", "a"]), 10);
        assert_eq!(g.label_columns_indices()["y"], 0);
        assert_eq!(g.label_columns_indices()["a"], 1);
    }

    #[test]
    fn invalid() {
        #[track_caller]
        fn test_case(config: WindowConfig, val: Frame, expected: &str) {
            let err = WindowGenerator::new(config, frame(10), val, frame(10)).unwrap_err();
            assert_eq!(err.to_string(), expected);
        }

        test_case(WindowConfig::new(0, 1, 1), frame(10), "input_width must be positive");
        test_case(WindowConfig::new(1, 0, 1), frame(10), "label_width must be positive");
        test_case(WindowConfig::new(1, 1, 0), frame(10), "shift must be positive");
        test_case(
            WindowConfig::new(3, 2, 1),
            frame(10),
            "shift (1) must be at least label_width (2)",
        );
        test_case(
            WindowConfig::new(3, 1, 1).with_label_columns(["y", "z"]),
            frame(10),
            "unknown column: z",
        );
        test_case(
            WindowConfig::new(3, 1, 1),
            Frame::new(vec![("a".to_owned(), vec![0.0; 10])]).unwrap(),
            r#"val columns ["a"] do not match train columns ["a", "b", "y"]"#,
        );
    }

    #[test]
    fn split_window() {
        let g = generator(WindowConfig::new(3, 2, 2), 10);
        let batch = frame(10)
            .to_array()
            .slice(s![0..5, ..])
            .to_owned()
            .insert_axis(Axis(0));
        let (inputs, labels) = g.split_window(batch.view()).unwrap();
        assert_eq!(inputs.shape(), &[1, 3, 3]);
        assert_eq!(labels.shape(), &[1, 2, 3]);
        assert_eq!(inputs[[0, 2, 1]], 21.0);
        assert_eq!(labels[[0, 0, 0]], 30.0);
        assert_eq!(labels[[0, 1, 2]], 42.0);

        let (input_spec, label_spec) = g.element_spec();
        assert!(input_spec.matches(inputs.shape()));
        assert!(label_spec.matches(labels.shape()));
        assert!(!label_spec.matches(inputs.shape()));
        assert_eq!(input_spec.to_string(), "(None, 3, None)");

        let short = batch.slice(s![.., 0..4, ..]);
        assert!(matches!(
            g.split_window(short),
            Err(Error::WindowLength {
                expected: 5,
                actual: 4
            })
        ));
        let narrow = batch.slice(s![.., .., 0..2]);
        assert!(matches!(
            g.split_window(narrow),
            Err(Error::FeatureCount {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn label_columns() {
        let g = generator(WindowConfig::new(4, 2, 3).with_label_columns(["y"]), 20);
        let dataset = g.val_with(DatasetOptions::eval().with_batch_size(5)).unwrap();
        let data = frame(20).to_array();
        let mut window = 0;
        for (inputs, labels) in collect(&dataset) {
            assert_eq!(inputs.shape()[1..], [4, 3]);
            assert_eq!(labels.shape()[1..], [2, 1]);
            for b in 0..labels.shape()[0] {
                for t in 0..2 {
                    let row = window + g.label_start() + t;
                    assert_eq!(labels[[b, t, 0]], data[[row, 2]]);
                }
                window += 1;
            }
        }
        assert_eq!(window, 20 - 7 + 1);

        // Labels follow the configured column order.
        let g = generator(WindowConfig::new(2, 1, 1).with_label_columns(["y", "a"]), 5);
        let dataset = g.test().unwrap();
        let (_, labels) = dataset.iter().next().unwrap().unwrap();
        assert_eq!(labels.shape(), &[3, 1, 2]);
        assert_eq!(labels[[0, 0, 0]], 22.0);
        assert_eq!(labels[[0, 0, 1]], 20.0);
    }

    #[test]
    fn dataset_len() {
        #[track_caller]
        fn test_case(rows: usize, stride: usize, batch_size: usize, expected: &[usize]) {
            let g = generator(WindowConfig::new(3, 1, 1), rows);
            let options = DatasetOptions::eval()
                .with_sequence_stride(stride)
                .with_batch_size(batch_size);
            let dataset = g.train_with(options).unwrap();
            let sizes = collect(&dataset)
                .iter()
                .map(|(inputs, _)| inputs.shape()[0])
                .collect::<Vec<_>>();
            assert_eq!(sizes, expected);
            assert_eq!(dataset.num_batches(), expected.len());
        }

        // Exactly one window of rows.
        test_case(4, 1, 32, &[1]);
        // Less than one window of rows.
        test_case(3, 1, 32, &[]);
        test_case(0, 1, 32, &[]);
        test_case(10, 1, 32, &[7]);
        test_case(10, 1, 3, &[3, 3, 1]);
        test_case(10, 2, 32, &[4]);
        test_case(10, 3, 2, &[2, 1]);
        test_case(100, 1, 32, &[32, 32, 32, 1]);
        test_case(10, 1, usize::MAX, &[7]);
        test_case(10, 2, usize::MAX, &[4]);
    }

    #[test]
    fn defaults() {
        let g = WindowGenerator::new(
            WindowConfig::new(6, 1, 1),
            frame(100),
            frame(40),
            frame(20),
        )
        .unwrap();
        for split in [Split::Train, Split::Val, Split::Test] {
            let dataset = match split {
                Split::Train => g.train(),
                Split::Val => g.val(),
                Split::Test => g.test(),
            }
            .unwrap();
            assert_eq!(dataset.options().shuffle, split == Split::Train);
            assert_eq!(dataset.options().batch_size, 32);
            assert_eq!(dataset.options().sequence_stride, 1);
            for (inputs, labels) in collect(&dataset) {
                assert_eq!(inputs.shape()[1..], [6, 3], "{}", split);
                assert_eq!(labels.shape()[1..], [1, 3], "{}", split);
            }
        }

        assert!(matches!(
            g.train_with(DatasetOptions::train().with_batch_size(0)),
            Err(Error::ZeroBatchSize)
        ));
        assert!(matches!(
            g.train_with(DatasetOptions::train().with_sequence_stride(0)),
            Err(Error::ZeroStride)
        ));
    }

    #[test]
    fn epochs() {
        let g = generator(WindowConfig::new(3, 1, 1), 100);

        // In order, every pass is the same.
        let dataset = g.val().unwrap();
        assert_eq!(collect(&dataset), collect(&dataset));
        let (inputs, _) = dataset.iter().next().unwrap().unwrap();
        assert_eq!(inputs[[1, 0, 0]], 10.0);

        // Shuffled, passes differ but seeds repeat.
        let options = DatasetOptions::train().with_batch_size(128).with_seed(3);
        let a = g.train_with(options).unwrap();
        let b = g.train_with(options).unwrap();
        let a1 = collect(&a);
        let a2 = collect(&a);
        assert_eq!(a1, collect(&b));
        assert_ne!(a1, a2);
        assert_eq!(a1[0].0.shape(), &[97, 3, 3]);

        // Every window is still visited exactly once per pass.
        let mut firsts = a2[0]
            .0
            .outer_iter()
            .map(|window| window[[0, 0]] as usize / 10)
            .collect::<Vec<_>>();
        firsts.sort_unstable();
        assert_eq!(firsts, (0..97).collect::<Vec<_>>());
    }

    #[test]
    fn example() {
        let g = generator(WindowConfig::new(6, 1, 1).with_label_columns(["y"]), 50);
        let first = g.example().unwrap();
        let second = g.example().unwrap();
        assert!(std::ptr::eq(first, second));
        assert_eq!(first.0.shape(), &[32, 6, 3]);
        assert_eq!(first.1.shape(), &[32, 1, 1]);

        // The options only matter for the first call.
        let third = g
            .example_with(DatasetOptions::eval().with_batch_size(2))
            .unwrap();
        assert!(std::ptr::eq(first, third));

        let g = generator(WindowConfig::new(6, 1, 1), 5);
        assert!(matches!(g.example(), Err(Error::EmptyDataset(Split::Train))));
        assert!(g.example.get().is_none());
    }

    #[test]
    fn display() {
        let g = generator(WindowConfig::new(6, 1, 1).with_label_columns(["y"]), 10);
        const EXPECTED: &str = "\
Total window size: 7
Input indices: [0 1 2 3 4 5]
Label indices: [6]
Label column name(s): ['y']";
        assert_eq!(g.to_string(), EXPECTED);

        let g = generator(WindowConfig::new(2, 2, 3), 10);
        const EXPECTED_ALL: &str = "\
Total window size: 5
Input indices: [0 1]
Label indices: [3 4]
Label column name(s): None";
        assert_eq!(g.to_string(), EXPECTED_ALL);
    }

    #[test]
    fn config_json() {
        const CONFIG: &str = r#"{
            "input_width": 24,
            "label_width": 24,
            "shift": 24,
            "label_columns": ["T (degC)"]
        }"#;
        let config: WindowConfig = serde_json::from_str(CONFIG).unwrap();
        assert_eq!(
            config,
            WindowConfig::new(24, 24, 24).with_label_columns(["T (degC)"])
        );

        let options = DatasetOptions::eval().with_seed(9);
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(
            json,
            r#"{"sequence_stride":1,"shuffle":false,"batch_size":32,"seed":9}"#
        );
    }

    /// Yields only the last window of the data, in a single batch.
    #[derive(Debug)]
    struct LastWindow;

    struct LastWindowTable(Arc<Array2<f32>>, usize);

    impl Table for LastWindowTable {
        type Batch = WindowBatch;

        fn num_batches(&self) -> usize {
            usize::from(self.0.nrows() >= self.1)
        }

        fn gen_batch(&self, idx: usize, batch: &mut WindowBatch) {
            batch.clear();
            if idx < self.num_batches() {
                let start = self.0.nrows() - self.1;
                batch.push(self.0.slice(s![start.., ..]));
            }
        }
    }

    impl Windowing for LastWindow {
        type Table = LastWindowTable;

        fn windows(&self, data: Arc<Array2<f32>>, options: &WindowOptions) -> LastWindowTable {
            LastWindowTable(data, options.sequence_length)
        }
    }

    #[test]
    fn custom_windowing() {
        let g = WindowGenerator::with_windowing(
            LastWindow,
            WindowConfig::new(2, 1, 1),
            frame(10),
            frame(10),
            frame(10),
        )
        .unwrap();
        let dataset = g.train().unwrap();
        assert_eq!(dataset.num_batches(), 1);
        let batches = collect(&dataset);
        assert_eq!(batches.len(), 1);
        let (inputs, labels) = &batches[0];
        assert_eq!(inputs.shape(), &[1, 2, 3]);
        assert_eq!(inputs[[0, 0, 0]], 70.0);
        assert_eq!(labels[[0, 0, 0]], 90.0);
    }
}
