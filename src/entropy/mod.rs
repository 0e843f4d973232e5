//! Entropy coders for mapped prediction residuals.
//!
//! Both coders see the residuals one at a time, together with the index `t`
//! of the sample inside its band and the band index `z`. The encoder and
//! decoder sides do not own the bit stream; every call receives it
//! explicitly so that the header and the body share one writer or reader.

pub mod block_adaptive;
pub mod rice;
pub mod sample_adaptive;
pub mod unary;

use crate::bit_io::{BitReader, BitWriter};
use crate::error::Ccsds123Error;
use std::io::{Read, Write};

pub use block_adaptive::{BlockAdaptiveDecoder, BlockAdaptiveEncoder};
pub use sample_adaptive::{SampleAdaptiveDecoder, SampleAdaptiveEncoder};

pub trait EntropyEncoder {
    /// Resets per-band state before the first sample of band `z`.
    fn init_band(&mut self, z: usize);

    fn code_sample<W: Write>(
        &mut self,
        writer: &mut BitWriter<W>,
        sample: u32,
        t: usize,
        z: usize,
    ) -> Result<(), Ccsds123Error>;

    /// Adapts the statistics after `sample` has been coded.
    fn update(&mut self, sample: u32, t: usize, z: usize);

    /// Emits anything still buffered and flushes the bit stream. Called once.
    fn terminate<W: Write>(&mut self, writer: &mut BitWriter<W>) -> Result<(), Ccsds123Error>;
}

pub trait EntropyDecoder {
    fn init_band(&mut self, z: usize);

    fn decode_sample<R: Read>(
        &mut self,
        reader: &mut BitReader<R>,
        t: usize,
        z: usize,
    ) -> Result<u32, Ccsds123Error>;

    fn update(&mut self, sample: u32, t: usize, z: usize);
}
