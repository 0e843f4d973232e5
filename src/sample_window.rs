//! Sample history seen by the predictor.
//!
//! The predictor addresses samples by absolute (band, row, column). A window
//! only has to keep what the predictor can still reach from the current
//! position: the P previous bands in full for band sequential coding, and the
//! current and previous row of every band for band interleaved coding.

use crate::cube::Cube;

pub trait SampleWindow {
    fn sample(&self, z: usize, y: usize, x: usize) -> i32;

    fn set_sample(&mut self, z: usize, y: usize, x: usize, value: i32);
}

impl SampleWindow for Cube {
    fn sample(&self, z: usize, y: usize, x: usize) -> i32 {
        self.get(z, y, x)
    }

    fn set_sample(&mut self, z: usize, y: usize, x: usize, value: i32) {
        self.set(z, y, x, value);
    }
}

/// Ring of P + 1 whole band planes.
pub struct BandSequentialWindow {
    columns: usize,
    planes: Vec<Vec<i32>>,
}

impl BandSequentialWindow {
    pub fn new(prediction_bands: usize, rows: usize, columns: usize) -> Self {
        Self {
            columns,
            planes: vec![vec![0; rows * columns]; prediction_bands + 1],
        }
    }

    fn plane(&self, z: usize) -> usize {
        z % self.planes.len()
    }

    pub fn row(&self, z: usize, y: usize) -> &[i32] {
        let start = y * self.columns;
        &self.planes[self.plane(z)][start..start + self.columns]
    }

    pub fn row_mut(&mut self, z: usize, y: usize) -> &mut [i32] {
        let plane = self.plane(z);
        let start = y * self.columns;
        &mut self.planes[plane][start..start + self.columns]
    }
}

impl SampleWindow for BandSequentialWindow {
    fn sample(&self, z: usize, y: usize, x: usize) -> i32 {
        self.planes[self.plane(z)][y * self.columns + x]
    }

    fn set_sample(&mut self, z: usize, y: usize, x: usize, value: i32) {
        let plane = self.plane(z);
        self.planes[plane][y * self.columns + x] = value;
    }
}

/// Current and previous row of every band.
pub struct BandInterleavedWindow {
    rows: Vec<[Vec<i32>; 2]>,
}

impl BandInterleavedWindow {
    pub fn new(bands: usize, columns: usize) -> Self {
        Self {
            rows: vec![[vec![0; columns], vec![0; columns]]; bands],
        }
    }

    pub fn row(&self, z: usize, y: usize) -> &[i32] {
        &self.rows[z][y % 2]
    }

    pub fn row_mut(&mut self, z: usize, y: usize) -> &mut [i32] {
        &mut self.rows[z][y % 2]
    }
}

impl SampleWindow for BandInterleavedWindow {
    fn sample(&self, z: usize, y: usize, x: usize) -> i32 {
        self.rows[z][y % 2][x]
    }

    fn set_sample(&mut self, z: usize, y: usize, x: usize, value: i32) {
        self.rows[z][y % 2][x] = value;
    }
}
