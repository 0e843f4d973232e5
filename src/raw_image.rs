//! Raw image files: headerless sample arrays in BSQ, BIL or BIP layout.

use crate::cube::Cube;
use crate::error::Ccsds123Error;
use crate::CubeInfo;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Sample type of a raw file, numbered as on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SampleFormat {
    U8 = 1,
    U16 = 2,
    I16 = 3,
}

impl SampleFormat {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::U16 | SampleFormat::I16 => 2,
        }
    }

    pub fn is_signed(self) -> bool {
        self == SampleFormat::I16
    }

    pub fn range(self) -> (i32, i32) {
        match self {
            SampleFormat::U8 => (0, u8::MAX as i32),
            SampleFormat::U16 => (0, u16::MAX as i32),
            SampleFormat::I16 => (i16::MIN as i32, i16::MAX as i32),
        }
    }

    /// Smallest format able to hold samples of a cube with `dynamic_range` bits.
    pub fn for_samples(signed: bool, dynamic_range: u32) -> Self {
        if signed {
            SampleFormat::I16
        } else if dynamic_range <= 8 {
            SampleFormat::U8
        } else {
            SampleFormat::U16
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    BigEndian,
    LittleEndian,
}

/// Order of the samples in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum PixelOrder {
    #[default]
    Bsq = 0,
    Bil = 1,
    Bip = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawLayout {
    pub format: SampleFormat,
    pub byte_order: ByteOrder,
    pub pixel_order: PixelOrder,
}

impl RawLayout {
    pub fn new(format: SampleFormat, byte_order: ByteOrder, pixel_order: PixelOrder) -> Self {
        Self {
            format,
            byte_order,
            pixel_order,
        }
    }

    /// Offset in samples of (z, y, x) in the file.
    fn sample_offset(&self, info: &CubeInfo, z: usize, y: usize, x: usize) -> usize {
        let (bands, columns) = (info.bands as usize, info.columns as usize);
        match self.pixel_order {
            PixelOrder::Bsq => (z * info.rows as usize + y) * columns + x,
            PixelOrder::Bil => (y * bands + z) * columns + x,
            PixelOrder::Bip => (y * columns + x) * bands + z,
        }
    }

    fn decode_sample(&self, bytes: &[u8]) -> i32 {
        match (self.format, self.byte_order) {
            (SampleFormat::U8, _) => bytes[0] as i32,
            (SampleFormat::U16, ByteOrder::BigEndian) => u16::from_be_bytes([bytes[0], bytes[1]]) as i32,
            (SampleFormat::U16, ByteOrder::LittleEndian) => u16::from_le_bytes([bytes[0], bytes[1]]) as i32,
            (SampleFormat::I16, ByteOrder::BigEndian) => i16::from_be_bytes([bytes[0], bytes[1]]) as i32,
            (SampleFormat::I16, ByteOrder::LittleEndian) => i16::from_le_bytes([bytes[0], bytes[1]]) as i32,
        }
    }

    fn encode_sample(&self, value: i32, bytes: &mut [u8]) {
        match (self.format, self.byte_order) {
            (SampleFormat::U8, _) => bytes[0] = value as u8,
            (SampleFormat::U16 | SampleFormat::I16, ByteOrder::BigEndian) => {
                bytes.copy_from_slice(&(value as u16).to_be_bytes())
            }
            (SampleFormat::U16 | SampleFormat::I16, ByteOrder::LittleEndian) => {
                bytes.copy_from_slice(&(value as u16).to_le_bytes())
            }
        }
    }
}

/// Reads a Z x Y x X cube from raw bytes. Only I16 samples are signed.
pub fn read_raw_cube(
    data: &[u8],
    bands: u32,
    rows: u32,
    columns: u32,
    layout: RawLayout,
) -> Result<Cube, Ccsds123Error> {
    let info = CubeInfo::new(bands, rows, columns, layout.format.is_signed());
    let width = layout.format.bytes_per_sample();
    if data.len() < info.sample_count() * width {
        return Err(Ccsds123Error::EndOfStream);
    }

    let mut cube = Cube::new(info);
    for z in 0..bands as usize {
        for y in 0..rows as usize {
            for x in 0..columns as usize {
                let start = layout.sample_offset(&info, z, y, x) * width;
                cube.set(z, y, x, layout.decode_sample(&data[start..start + width]));
            }
        }
    }
    Ok(cube)
}

/// Writes `cube` as raw bytes, failing if a sample does not fit the format.
pub fn write_raw_cube(cube: &Cube, layout: RawLayout) -> Result<Vec<u8>, Ccsds123Error> {
    let info = cube.info();
    let width = layout.format.bytes_per_sample();
    let (minimum, maximum) = layout.format.range();
    let mut data = vec![0u8; info.sample_count() * width];

    for z in 0..info.bands as usize {
        for y in 0..info.rows as usize {
            for x in 0..info.columns as usize {
                let value = cube.get(z, y, x);
                if value < minimum || value > maximum {
                    return Err(Ccsds123Error::SampleOutOfRange);
                }
                let start = layout.sample_offset(&info, z, y, x) * width;
                layout.encode_sample(value, &mut data[start..start + width]);
            }
        }
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn numbered(signed: bool) -> Result<Cube, Ccsds123Error> {
        let info = CubeInfo::new(2, 2, 3, signed);
        let offset = if signed { -6 } else { 0 };
        Cube::from_samples(info, (0..12).map(|v| v + offset).collect())
    }

    #[test]
    fn test_pixel_orders() -> Result<(), Ccsds123Error> {
        let cube = numbered(false)?;
        let bsq = write_raw_cube(&cube, RawLayout::new(SampleFormat::U8, ByteOrder::BigEndian, PixelOrder::Bsq))?;
        assert_eq!(bsq, (0..12).collect::<Vec<u8>>());

        let bil = write_raw_cube(&cube, RawLayout::new(SampleFormat::U8, ByteOrder::BigEndian, PixelOrder::Bil))?;
        assert_eq!(bil, vec![0, 1, 2, 6, 7, 8, 3, 4, 5, 9, 10, 11]);

        let bip = write_raw_cube(&cube, RawLayout::new(SampleFormat::U8, ByteOrder::BigEndian, PixelOrder::Bip))?;
        assert_eq!(bip, vec![0, 6, 1, 7, 2, 8, 3, 9, 4, 10, 5, 11]);

        for (data, order) in [(bil, PixelOrder::Bil), (bip, PixelOrder::Bip)] {
            let layout = RawLayout::new(SampleFormat::U8, ByteOrder::BigEndian, order);
            assert_eq!(read_raw_cube(&data, 2, 2, 3, layout)?, cube);
        }
        Ok(())
    }

    #[test]
    fn test_byte_orders() -> Result<(), Ccsds123Error> {
        let info = CubeInfo::new(1, 1, 2, false);
        let cube = Cube::from_samples(info, vec![0x1234, 0xFFFE])?;
        let big = RawLayout::new(SampleFormat::U16, ByteOrder::BigEndian, PixelOrder::Bsq);
        let little = RawLayout::new(SampleFormat::U16, ByteOrder::LittleEndian, PixelOrder::Bsq);
        assert_eq!(write_raw_cube(&cube, big)?, vec![0x12, 0x34, 0xFF, 0xFE]);
        assert_eq!(write_raw_cube(&cube, little)?, vec![0x34, 0x12, 0xFE, 0xFF]);
        assert_eq!(read_raw_cube(&[0x34, 0x12, 0xFE, 0xFF], 1, 1, 2, little)?, cube);
        Ok(())
    }

    #[test]
    fn test_signed_samples() -> Result<(), Ccsds123Error> {
        let cube = numbered(true)?;
        let layout = RawLayout::new(SampleFormat::I16, ByteOrder::LittleEndian, PixelOrder::Bip);
        let data = write_raw_cube(&cube, layout)?;
        assert_eq!(&data[..2], &[0xFA, 0xFF]);
        let read = read_raw_cube(&data, 2, 2, 3, layout)?;
        assert!(read.info().signed);
        assert_eq!(read, cube);
        Ok(())
    }

    #[test]
    fn test_out_of_range_sample() -> Result<(), Ccsds123Error> {
        let cube = numbered(true)?;
        let layout = RawLayout::new(SampleFormat::U16, ByteOrder::BigEndian, PixelOrder::Bsq);
        let error = write_raw_cube(&cube, layout).unwrap_err();
        assert!(matches!(error, Ccsds123Error::SampleOutOfRange));
        assert_eq!(error.kind(), ErrorKind::Precision);

        let info = CubeInfo::new(1, 1, 1, false);
        let cube = Cube::from_samples(info, vec![256])?;
        let layout = RawLayout::new(SampleFormat::U8, ByteOrder::BigEndian, PixelOrder::Bsq);
        assert!(write_raw_cube(&cube, layout).is_err());
        Ok(())
    }

    #[test]
    fn test_short_input() {
        let layout = RawLayout::new(SampleFormat::U16, ByteOrder::BigEndian, PixelOrder::Bsq);
        assert!(matches!(
            read_raw_cube(&[0; 7], 1, 2, 2, layout),
            Err(Ccsds123Error::EndOfStream)
        ));
    }

    #[test]
    fn test_format_for_samples() {
        assert_eq!(SampleFormat::for_samples(false, 8), SampleFormat::U8);
        assert_eq!(SampleFormat::for_samples(false, 12), SampleFormat::U16);
        assert_eq!(SampleFormat::for_samples(true, 4), SampleFormat::I16);
        assert_eq!(SampleFormat::try_from(3u8).ok(), Some(SampleFormat::I16));
    }
}
