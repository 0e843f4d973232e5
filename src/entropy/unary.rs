use crate::bit_io::{BitReader, BitWriter};
use crate::error::Ccsds123Error;
use std::io::{Read, Write};

/// Writes `value` zeros followed by a single one.
pub fn write_unary<W: Write>(writer: &mut BitWriter<W>, value: u32) -> Result<(), Ccsds123Error> {
    let mut zeros = value;
    while zeros >= 32 {
        writer.write_bits(32, 0)?;
        zeros -= 32;
    }
    writer.write_bits(zeros, 0)?;
    writer.write_bit(true)
}

/// Counts zeros up to the terminating one.
pub fn read_unary<R: Read>(reader: &mut BitReader<R>) -> Result<u32, Ccsds123Error> {
    let mut count = 0u32;
    while !reader.read_bit()? {
        count = count
            .checked_add(1)
            .ok_or(Ccsds123Error::UnaryLengthExceeded)?;
    }
    Ok(count)
}
