// Copyright 2023 Daniel Harrison. All Rights Reserved.

//! A tiny columnar table of named `f32` features

use std::collections::HashMap;
use std::io;
use std::ops::Range;

use ndarray::Array2;

use crate::error::{Error, Result};

/// A table of time-ordered rows with named numeric columns.
///
/// Data is stored column-major. Every column has the same number of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    names: Vec<String>,
    cols: Vec<Vec<f32>>,
    num_rows: usize,
}

impl Frame {
    /// Constructs a frame from `(name, values)` pairs, in column order.
    pub fn new(columns: Vec<(String, Vec<f32>)>) -> Result<Self> {
        let num_rows = columns.first().map_or(0, |(_, values)| values.len());
        let mut frame = Frame {
            names: Vec::with_capacity(columns.len()),
            cols: Vec::with_capacity(columns.len()),
            num_rows,
        };
        for (name, values) in columns {
            if frame.names.contains(&name) {
                return Err(Error::DuplicateColumn(name));
            }
            if values.len() != num_rows {
                return Err(Error::RaggedColumn {
                    column: name,
                    len: values.len(),
                    expected: num_rows,
                });
            }
            frame.names.push(name);
            frame.cols.push(values);
        }
        Ok(frame)
    }

    /// Constructs a frame from column names and row-major data.
    pub fn from_rows<S, R>(names: &[S], rows: &[R]) -> Result<Self>
    where
        S: AsRef<str>,
        R: AsRef<[f32]>,
    {
        let mut cols = vec![Vec::with_capacity(rows.len()); names.len()];
        for row in rows {
            let row = row.as_ref();
            for (col, value) in cols.iter_mut().zip(row) {
                col.push(*value);
            }
            if row.len() != names.len() {
                let idx = std::cmp::min(row.len(), names.len().saturating_sub(1));
                let column = names
                    .get(idx)
                    .map_or_else(String::new, |x| x.as_ref().to_owned());
                return Err(Error::RaggedColumn {
                    column,
                    len: cols.get(idx).map_or(0, |x| x.len()),
                    expected: cols.first().map_or(0, |x| x.len()),
                });
            }
        }
        let columns = names
            .iter()
            .map(|x| x.as_ref().to_owned())
            .zip(cols)
            .collect();
        Frame::new(columns)
    }

    /// Reads a frame from CSV.
    ///
    /// The header row names the columns and every other field must parse as
    /// an `f32`. Surrounding whitespace is ignored.
    pub fn from_csv<R: io::Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let names = reader
            .headers()?
            .iter()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        let mut cols = vec![Vec::new(); names.len()];
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            for ((col, field), name) in cols.iter_mut().zip(record.iter()).zip(names.iter()) {
                let value = field.parse::<f32>().map_err(|_| Error::ParseValue {
                    row,
                    column: name.clone(),
                    value: field.to_owned(),
                })?;
                col.push(value);
            }
        }
        Frame::new(names.into_iter().zip(cols).collect())
    }

    /// The column names, in order.
    pub fn columns(&self) -> &[String] {
        &self.names
    }

    /// The values of the named column, if present.
    pub fn column(&self, name: &str) -> Option<&[f32]> {
        let idx = self.names.iter().position(|x| x == name)?;
        Some(&self.cols[idx])
    }

    /// Returns the number of rows.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Returns the number of columns.
    pub fn num_columns(&self) -> usize {
        self.names.len()
    }

    /// A map from each column name to its position.
    pub fn column_indices(&self) -> HashMap<String, usize> {
        self.names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect()
    }

    /// Copies the frame into a dense `[rows, columns]` array.
    pub fn to_array(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.num_rows, self.cols.len()), |(row, col)| {
            self.cols[col][row]
        })
    }

    /// Returns the given rows as a new frame with the same schema.
    ///
    /// The range is clamped to the frame's rows.
    pub fn slice(&self, rows: Range<usize>) -> Frame {
        let end = std::cmp::min(rows.end, self.num_rows);
        let start = std::cmp::min(rows.start, end);
        Frame {
            names: self.names.clone(),
            cols: self.cols.iter().map(|x| x[start..end].to_vec()).collect(),
            num_rows: end - start,
        }
    }

    /// Splits the rows, in time order, into train, validation and test frames.
    ///
    /// The first `floor(n * train)` rows are train, the next up to
    /// `floor(n * train + n * val)` are validation and the rest are test.
    pub fn split_fractions(&self, train: f64, val: f64) -> Result<(Frame, Frame, Frame)> {
        let valid = |x: f64| x.is_finite() && (0.0..=1.0).contains(&x);
        if !valid(train) || !valid(val) || train + val > 1.0 {
            return Err(Error::InvalidFraction { train, val });
        }
        let n = self.num_rows as f64;
        let train_end = (n * train) as usize;
        let val_end = std::cmp::max(train_end, (n * train + n * val) as usize);
        Ok((
            self.slice(0..train_end),
            self.slice(train_end..val_end),
            self.slice(val_end..self.num_rows),
        ))
    }
}
