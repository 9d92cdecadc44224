// Copyright 2022 Daniel Harrison. All Rights Reserved.

//! [serde::Serializer] implementations for crate types.

use ndarray::ArrayView2;
use serde::ser::{Error as _, SerializeSeq, SerializeTuple};

use crate::generator::WindowDataset;
use crate::windows::Windowing;

/// Window-oriented serialization of one pass over a [WindowDataset].
///
/// Each window is an `[inputs, labels]` pair of row lists. Serializing starts a
/// new pass, so shuffled datasets serialize in a new order every time.
#[derive(Debug)]
pub struct Windows<'d, 'g, W: Windowing>(pub &'d WindowDataset<'g, W>);

impl<W: Windowing> serde::Serialize for Windows<'_, '_, W> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let Windows(dataset) = self;
        let mut seq = serializer.serialize_seq(None)?;
        for batch in dataset.iter() {
            let (inputs, labels) = batch.map_err(S::Error::custom)?;
            for (inputs, labels) in inputs.outer_iter().zip(labels.outer_iter()) {
                seq.serialize_element(&Window(inputs, labels))?;
            }
        }
        seq.end()
    }
}

struct Window<'a>(ArrayView2<'a, f32>, ArrayView2<'a, f32>);

impl serde::Serialize for Window<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let Window(inputs, labels) = self;
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&Rows(inputs))?;
        tuple.serialize_element(&Rows(labels))?;
        tuple.end()
    }
}

struct Rows<'a, 'v>(&'a ArrayView2<'v, f32>);

impl serde::Serialize for Rows<'_, '_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let Rows(rows) = self;
        serializer.collect_seq(rows.outer_iter().map(|row| row.to_vec()))
    }
}
