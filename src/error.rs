// Copyright 2023 Daniel Harrison. All Rights Reserved.

//! Errors returned by this crate

use crate::generator::Split;

/// A convenience alias for results with this crate's [Error].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error from building frames, generators or datasets.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A window dimension was zero.
    #[error("{name} must be positive")]
    ZeroWidth {
        /// Which dimension.
        name: &'static str,
    },
    /// The label window would start before the first row of the window.
    #[error("shift ({shift}) must be at least label_width ({label_width})")]
    LabelBeforeWindow {
        /// The configured shift.
        shift: usize,
        /// The configured label width.
        label_width: usize,
    },
    /// A column name was not part of the schema.
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    /// A column name appeared twice in one frame.
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
    /// A column had a different number of rows than the first column.
    #[error("column {column} has {len} rows, expected {expected}")]
    RaggedColumn {
        /// The offending column.
        column: String,
        /// Its length.
        len: usize,
        /// The length of the first column.
        expected: usize,
    },
    /// A split's schema did not match the train schema.
    #[error("{split} columns {actual:?} do not match train columns {expected:?}")]
    SchemaMismatch {
        /// The mismatched split.
        split: Split,
        /// The train columns.
        expected: Vec<String>,
        /// The split's columns.
        actual: Vec<String>,
    },
    /// A batch's time axis was not the total window size.
    #[error("batch windows have {actual} rows, expected {expected}")]
    WindowLength {
        /// The generator's total window size.
        expected: usize,
        /// The batch's window length.
        actual: usize,
    },
    /// A batch's feature axis did not match the schema.
    #[error("batch has {actual} features, expected {expected}")]
    FeatureCount {
        /// The number of columns in the schema.
        expected: usize,
        /// The batch's feature count.
        actual: usize,
    },
    /// A dataset was requested with a zero stride.
    #[error("sequence_stride must be positive")]
    ZeroStride,
    /// A dataset was requested with a zero batch size.
    #[error("batch_size must be positive")]
    ZeroBatchSize,
    /// A dataset produced no batches where one was required.
    #[error("{0} dataset has no complete window")]
    EmptyDataset(Split),
    /// A split fraction was out of range.
    #[error("invalid split fractions: train {train}, val {val}")]
    InvalidFraction {
        /// The train fraction.
        train: f64,
        /// The validation fraction.
        val: f64,
    },
    /// A CSV field could not be parsed as a number.
    #[error("row {row}, column {column}: cannot parse {value:?} as f32")]
    ParseValue {
        /// The zero-based data row (the header is not counted).
        row: usize,
        /// The column name.
        column: String,
        /// The raw field.
        value: String,
    },
    /// A batch buffer did not match its declared shape.
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
    /// The underlying CSV reader failed.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
