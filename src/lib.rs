//! Lossless compression of hyperspectral and multispectral image cubes.
//!
//! The codec follows CCSDS 123.0-B-1: an adaptive linear predictor turns every
//! sample into a mapped prediction residual, which is then entropy coded either
//! with the sample-adaptive Golomb coder of CCSDS 123.0 or with the CCSDS 121.0
//! block-adaptive coder. The produced stream starts with a bit-packed header
//! carrying the geometry and every coding parameter, so that a decoder can
//! rebuild the cube without side information.

pub mod bit_io;
pub mod coding_parameters;
pub mod constants;
pub mod cube;
pub mod decoder;
pub mod encoder;
pub mod entropy;
pub mod error;
pub mod header_reader;
pub mod header_writer;
pub mod log;
pub mod options;
pub mod predictor;
pub mod raw_image;
pub mod sample_window;

pub use coding_parameters::{
    BlockAdaptiveParameters, CodingParameters, PredictorParameters, SampleAdaptiveParameters,
};
pub use cube::Cube;
pub use decoder::Ccsds123Decoder;
pub use encoder::Ccsds123Encoder;
pub use error::{Ccsds123Error, ErrorKind};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Order in which samples are visited by the compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum SampleEncodingOrder {
    BandInterleaved = 0,
    BandSequential = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum EntropyCoderType {
    SampleAdaptive = 0,
    BlockAdaptive = 1,
}

/// Full prediction adds the north, west and north-west differences of the
/// current band to the inter-band differences used by reduced prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum PredictionMode {
    Full = 0,
    Reduced = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum LocalSumMode {
    NeighborOriented = 0,
    ColumnOriented = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum WeightInitMethod {
    Default = 0,
    Custom = 1,
}

/// Geometry of an image cube: Z bands of Y rows by X columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CubeInfo {
    pub bands: u32,
    pub rows: u32,
    pub columns: u32,
    pub signed: bool,
}

impl CubeInfo {
    pub fn new(bands: u32, rows: u32, columns: u32, signed: bool) -> Self {
        Self {
            bands,
            rows,
            columns,
            signed,
        }
    }

    pub fn samples_per_band(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    pub fn sample_count(&self) -> usize {
        self.bands as usize * self.samples_per_band()
    }
}

/// Compresses `cube` into a self-describing byte stream.
pub fn compress(cube: &Cube, parameters: &CodingParameters) -> Result<Vec<u8>, Ccsds123Error> {
    let mut encoder = Ccsds123Encoder::new();
    encoder.set_cube_info(cube.info())?;
    encoder.set_coding_parameters(parameters.clone())?;
    encoder.encode_cube(cube)
}

/// Rebuilds the cube stored in `data`.
pub fn decompress(data: &[u8]) -> Result<Cube, Ccsds123Error> {
    let mut decoder = Ccsds123Decoder::new(data);
    decoder.read_header()?;
    decoder.decode_cube()
}
