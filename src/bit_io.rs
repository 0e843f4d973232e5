//! MSB-first bit packing over byte streams.
//!
//! Fields of 0 to 32 bits are appended to (or taken from) the stream without
//! regard to byte boundaries. `flush` zero-pads the last partial byte so that
//! the next field starts on a byte boundary, which is how the header sections
//! are aligned.
//!
//! Both ends buffer the underlying stream, so a raw `File` can be handed over
//! directly.

use crate::error::Ccsds123Error;
use std::io::{BufReader, BufWriter, Read, Write};

const MAXIMUM_FIELD_BITS: u32 = 32;

fn low_bits(value: u64, bit_count: u32) -> u64 {
    value & ((1u64 << bit_count) - 1)
}

pub struct BitWriter<W: Write> {
    destination: BufWriter<W>,
    bit_buffer: u32,
    // Free bits left in the byte being assembled, 8 when it is empty.
    free_bit_count: u32,
    bytes_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(destination: W) -> Self {
        Self {
            destination: BufWriter::new(destination),
            bit_buffer: 0,
            free_bit_count: 8,
            bytes_written: 0,
        }
    }

    /// Appends the `bit_count` rightmost bits of `value`.
    pub fn write_bits(&mut self, bit_count: u32, value: u32) -> Result<(), Ccsds123Error> {
        if bit_count > MAXIMUM_FIELD_BITS {
            return Err(Ccsds123Error::InvalidArgument);
        }
        let value = low_bits(value as u64, bit_count);
        let mut remaining = bit_count;

        while remaining >= self.free_bit_count {
            remaining -= self.free_bit_count;
            let chunk = low_bits(value >> remaining, self.free_bit_count) as u32;
            let byte = (self.bit_buffer << self.free_bit_count) | chunk;
            self.emit(byte as u8)?;
        }
        if remaining > 0 {
            self.bit_buffer = (self.bit_buffer << remaining) | low_bits(value, remaining) as u32;
            self.free_bit_count -= remaining;
        }
        Ok(())
    }

    pub fn write_bit(&mut self, bit: bool) -> Result<(), Ccsds123Error> {
        self.write_bits(1, bit as u32)
    }

    fn emit(&mut self, byte: u8) -> Result<(), Ccsds123Error> {
        self.destination.write_all(&[byte])?;
        self.bytes_written += 1;
        self.bit_buffer = 0;
        self.free_bit_count = 8;
        Ok(())
    }

    /// Zero-pads a partial byte and writes it out. Does nothing on a byte boundary.
    pub fn flush(&mut self) -> Result<(), Ccsds123Error> {
        if self.free_bit_count != 8 {
            let byte = self.bit_buffer << self.free_bit_count;
            self.emit(byte as u8)?;
        }
        self.destination.flush()?;
        Ok(())
    }

    /// Number of whole bytes handed to the destination so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn bits_written(&self) -> u64 {
        self.bytes_written * 8 + (8 - self.free_bit_count) as u64
    }

    /// Flushes and releases the destination.
    pub fn close(mut self) -> Result<W, Ccsds123Error> {
        self.flush()?;
        self.destination
            .into_inner()
            .map_err(|e| Ccsds123Error::Io(e.into_error()))
    }
}

pub struct BitReader<R: Read> {
    source: BufReader<R>,
    bit_buffer: u32,
    bits_left: u32,
    bytes_read: u64,
}

impl<R: Read> BitReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source: BufReader::new(source),
            bit_buffer: 0,
            bits_left: 0,
            bytes_read: 0,
        }
    }

    fn fill(&mut self) -> Result<(), Ccsds123Error> {
        let mut byte = [0u8; 1];
        self.source.read_exact(&mut byte).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                Ccsds123Error::EndOfStream
            } else {
                Ccsds123Error::Io(e)
            }
        })?;
        self.bit_buffer = byte[0] as u32;
        self.bits_left = 8;
        self.bytes_read += 1;
        Ok(())
    }

    /// Reads a `bit_count` wide field, right aligned in the result.
    pub fn read_bits(&mut self, bit_count: u32) -> Result<u32, Ccsds123Error> {
        if bit_count > MAXIMUM_FIELD_BITS {
            return Err(Ccsds123Error::InvalidArgument);
        }
        let mut value = 0u64;
        let mut remaining = bit_count;

        while remaining > self.bits_left {
            value = (value << self.bits_left) | low_bits(self.bit_buffer as u64, self.bits_left);
            remaining -= self.bits_left;
            self.bits_left = 0;
            self.fill()?;
        }
        if remaining > 0 {
            let shift = self.bits_left - remaining;
            value = (value << remaining) | low_bits((self.bit_buffer >> shift) as u64, remaining);
            self.bits_left -= remaining;
        }
        Ok(value as u32)
    }

    pub fn read_bit(&mut self) -> Result<bool, Ccsds123Error> {
        if self.bits_left == 0 {
            self.fill()?;
        }
        self.bits_left -= 1;
        Ok((self.bit_buffer >> self.bits_left) & 1 == 1)
    }

    /// Drops the rest of a partially consumed byte.
    pub fn align(&mut self) {
        self.bits_left = 0;
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_msb_first() -> Result<(), Ccsds123Error> {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(3, 0b101)?;
        writer.write_bits(5, 0b00111)?;
        writer.write_bits(4, 0xF)?;
        let data = writer.close()?;
        assert_eq!(data, vec![0b1010_0111, 0b1111_0000]);
        Ok(())
    }

    #[test]
    fn test_write_masks_value() -> Result<(), Ccsds123Error> {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(4, 0xFFFF_FFF5)?;
        writer.write_bits(4, 0)?;
        assert_eq!(writer.close()?, vec![0x50]);
        Ok(())
    }

    #[test]
    fn test_flush_is_idempotent() -> Result<(), Ccsds123Error> {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(1, 1)?;
        writer.flush()?;
        assert_eq!(writer.bits_written(), 8);
        writer.flush()?;
        assert_eq!(writer.bytes_written(), 1);
        writer.write_bits(0, 0)?;
        assert_eq!(writer.close()?, vec![0x80]);
        Ok(())
    }

    #[test]
    fn test_full_width_fields() -> Result<(), Ccsds123Error> {
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(1, 1)?;
        writer.write_bits(32, 0xDEAD_BEEF)?;
        writer.write_bits(32, 0)?;
        let data = writer.close()?;
        assert_eq!(data.len(), 9);

        let mut reader = BitReader::new(data.as_slice());
        assert_eq!(reader.read_bits(1)?, 1);
        assert_eq!(reader.read_bits(32)?, 0xDEAD_BEEF);
        assert_eq!(reader.read_bits(32)?, 0);
        Ok(())
    }

    #[test]
    fn test_field_sequence_symmetry() -> Result<(), Ccsds123Error> {
        let fields: Vec<(u32, u32)> = (0..200u32)
            .map(|i| {
                let width = (i * 7) % 33;
                let value = i.wrapping_mul(0x9E37_79B9) & ((1u64 << width) - 1) as u32;
                (width, value)
            })
            .collect();

        let mut writer = BitWriter::new(Vec::new());
        for &(width, value) in &fields {
            writer.write_bits(width, value)?;
        }
        let data = writer.close()?;

        let mut reader = BitReader::new(data.as_slice());
        for &(width, value) in &fields {
            assert_eq!(reader.read_bits(width)?, value);
        }
        Ok(())
    }

    #[test]
    fn test_read_past_end() {
        let data = [0xABu8];
        let mut reader = BitReader::new(&data[..]);
        assert_eq!(reader.read_bits(4).ok(), Some(0xA));
        assert!(matches!(
            reader.read_bits(8),
            Err(Ccsds123Error::EndOfStream)
        ));
    }

    #[test]
    fn test_align_skips_partial_byte() -> Result<(), Ccsds123Error> {
        let data = [0xF0u8, 0x0F];
        let mut reader = BitReader::new(&data[..]);
        assert!(reader.read_bit()?);
        reader.align();
        assert_eq!(reader.read_bits(8)?, 0x0F);
        assert_eq!(reader.bytes_read(), 2);
        Ok(())
    }

    #[test]
    fn test_field_too_wide() {
        let mut writer = BitWriter::new(Vec::new());
        assert!(matches!(
            writer.write_bits(33, 0),
            Err(Ccsds123Error::InvalidArgument)
        ));
    }

    struct CountingSink {
        writes: usize,
        data: Vec<u8>,
    }

    impl Write for CountingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.writes += 1;
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct CountingSource<'a> {
        reads: usize,
        data: &'a [u8],
    }

    impl Read for CountingSource<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.reads += 1;
            let count = buf.len().min(self.data.len());
            buf[..count].copy_from_slice(&self.data[..count]);
            self.data = &self.data[count..];
            Ok(count)
        }
    }

    #[test]
    fn test_streams_are_buffered() -> Result<(), Ccsds123Error> {
        let mut writer = BitWriter::new(CountingSink {
            writes: 0,
            data: Vec::new(),
        });
        for i in 0..4096u32 {
            writer.write_bits(8, i)?;
        }
        let sink = writer.close()?;
        assert_eq!(sink.writes, 1);
        assert_eq!(sink.data.len(), 4096);

        let mut reader = BitReader::new(CountingSource {
            reads: 0,
            data: &sink.data,
        });
        for i in 0..4096u32 {
            assert_eq!(reader.read_bits(8)?, i & 0xFF);
        }
        assert_eq!(reader.bytes_read(), 4096);
        assert_eq!(reader.source.get_ref().reads, 1);
        Ok(())
    }
}
