use std::io::{Read, Write};

use num::Float;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;
use crate::vectorizer::TermSpace;

/// Write any artifact as CBOR.
pub fn to_cbor_writer<T, W>(value: &T, writer: W) -> Result<()>
where
    T: Serialize,
    W: Write,
{
    serde_cbor::to_writer(writer, value)?;
    Ok(())
}

/// Read an artifact written by [`to_cbor_writer`].
pub fn from_cbor_reader<T, R>(reader: R) -> Result<T>
where
    T: DeserializeOwned,
    R: Read,
{
    Ok(serde_cbor::from_reader(reader)?)
}

impl<N> TermSpace<N>
where
    N: Float + Serialize + DeserializeOwned,
{
    /// Serialize matrix, vocabulary and IDF as CBOR.
    /// The vocabulary keeps its column order, so the reverse lookup survives the round trip.
    pub fn to_cbor_writer<W: Write>(&self, writer: W) -> Result<()> {
        to_cbor_writer(self, writer)
    }

    pub fn from_cbor_reader<R: Read>(reader: R) -> Result<Self> {
        from_cbor_reader(reader)
    }
}
