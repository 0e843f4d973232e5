use crate::error::Ccsds123Error;
use crate::{CubeInfo, SampleEncodingOrder};

/// An image cube held in memory, band after band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cube {
    info: CubeInfo,
    samples: Vec<i32>,
}

impl Cube {
    pub fn new(info: CubeInfo) -> Self {
        Self {
            info,
            samples: vec![0; info.sample_count()],
        }
    }

    /// Wraps band sequential `samples`.
    pub fn from_samples(info: CubeInfo, samples: Vec<i32>) -> Result<Self, Ccsds123Error> {
        if samples.len() != info.sample_count() {
            return Err(Ccsds123Error::InvalidArgument);
        }
        Ok(Self { info, samples })
    }

    pub fn info(&self) -> CubeInfo {
        self.info
    }

    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<i32> {
        self.samples
    }

    fn index(&self, z: usize, y: usize, x: usize) -> usize {
        (z * self.info.rows as usize + y) * self.info.columns as usize + x
    }

    pub fn get(&self, z: usize, y: usize, x: usize) -> i32 {
        self.samples[self.index(z, y, x)]
    }

    pub fn set(&mut self, z: usize, y: usize, x: usize, value: i32) {
        let index = self.index(z, y, x);
        self.samples[index] = value;
    }

    pub fn row(&self, z: usize, y: usize) -> &[i32] {
        let start = self.index(z, y, 0);
        &self.samples[start..start + self.info.columns as usize]
    }

    pub fn row_mut(&mut self, z: usize, y: usize) -> &mut [i32] {
        let start = self.index(z, y, 0);
        let columns = self.info.columns as usize;
        &mut self.samples[start..start + columns]
    }
}

/// Supplies image rows in the order the compressor consumes them.
pub trait RowSource {
    fn read_row(&mut self, row: &mut [i32]) -> Result<(), Ccsds123Error>;
}

/// Accepts reconstructed rows in the order the decompressor produces them.
pub trait RowSink {
    fn write_row(&mut self, row: &[i32]) -> Result<(), Ccsds123Error>;
}

/// Row position of the n-th row in BSQ (band, row) or BI (row, band) order.
fn row_position(info: &CubeInfo, order: SampleEncodingOrder, n: usize) -> (usize, usize) {
    match order {
        SampleEncodingOrder::BandSequential => {
            (n / info.rows as usize, n % info.rows as usize)
        }
        SampleEncodingOrder::BandInterleaved => {
            (n % info.bands as usize, n / info.bands as usize)
        }
    }
}

fn row_count(info: &CubeInfo) -> usize {
    info.bands as usize * info.rows as usize
}

pub struct CubeRowReader<'a> {
    cube: &'a Cube,
    order: SampleEncodingOrder,
    next: usize,
}

impl<'a> CubeRowReader<'a> {
    pub fn new(cube: &'a Cube, order: SampleEncodingOrder) -> Self {
        Self {
            cube,
            order,
            next: 0,
        }
    }
}

impl RowSource for CubeRowReader<'_> {
    fn read_row(&mut self, row: &mut [i32]) -> Result<(), Ccsds123Error> {
        if self.next >= row_count(&self.cube.info) {
            return Err(Ccsds123Error::EndOfStream);
        }
        let (z, y) = row_position(&self.cube.info, self.order, self.next);
        row.copy_from_slice(self.cube.row(z, y));
        self.next += 1;
        Ok(())
    }
}

pub struct CubeRowWriter {
    cube: Cube,
    order: SampleEncodingOrder,
    next: usize,
}

impl CubeRowWriter {
    pub fn new(info: CubeInfo, order: SampleEncodingOrder) -> Self {
        Self {
            cube: Cube::new(info),
            order,
            next: 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.next == row_count(&self.cube.info)
    }

    pub fn into_cube(self) -> Cube {
        self.cube
    }
}

impl RowSink for CubeRowWriter {
    fn write_row(&mut self, row: &[i32]) -> Result<(), Ccsds123Error> {
        if self.next >= row_count(&self.cube.info) {
            return Err(Ccsds123Error::InvalidOperation);
        }
        let (z, y) = row_position(&self.cube.info, self.order, self.next);
        self.cube.row_mut(z, y).copy_from_slice(row);
        self.next += 1;
        Ok(())
    }
}
