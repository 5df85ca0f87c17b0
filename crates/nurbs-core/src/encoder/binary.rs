//! Little-endian primitives of the `.nurbs` format

use std::io::{self, Read, Write};

use super::{DecodeError, EncodeError};

pub(crate) fn write_i32<W: Write>(writer: &mut W, value: i32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

pub(crate) fn write_f32<W: Write>(writer: &mut W, value: f32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Write a count or degree as `i32`
pub(crate) fn write_count<W: Write>(
    writer: &mut W,
    field: &'static str,
    value: usize,
) -> Result<(), EncodeError> {
    let value = i32::try_from(value).map_err(|_| EncodeError::CountOverflow { field, value })?;
    Ok(write_i32(writer, value)?)
}

pub(crate) fn write_f32s<W: Write>(writer: &mut W, values: &[f64]) -> io::Result<()> {
    values.iter().try_for_each(|&v| write_f32(writer, v as f32))
}

pub(crate) fn read_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

pub(crate) fn read_f32<R: Read>(reader: &mut R) -> io::Result<f32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

/// Read an `i32` that must be non-negative
pub(crate) fn read_count<R: Read>(reader: &mut R, field: &'static str) -> Result<usize, DecodeError> {
    let value = read_i32(reader)?;
    usize::try_from(value).map_err(|_| DecodeError::NegativeCount { field, value })
}

pub(crate) fn read_f64s<R: Read>(reader: &mut R, count: usize) -> io::Result<Vec<f64>> {
    (0..count).map(|_| read_f32(reader).map(f64::from)).collect()
}

pub(crate) fn read_counts<R: Read>(
    reader: &mut R,
    field: &'static str,
    count: usize,
) -> Result<Vec<usize>, DecodeError> {
    (0..count).map(|_| read_count(reader, field)).collect()
}
