//! CCSDS 123.0 sample-adaptive entropy coder.
//!
//! Every band keeps an accumulator of recent residual magnitudes and a counter;
//! their ratio selects the Golomb power-of-two parameter k of the next sample.
//! Codewords are length limited: a unary prefix reaching the limit is followed
//! by the raw residual.

use super::unary::write_unary;
use super::{EntropyDecoder, EntropyEncoder};
use crate::bit_io::{BitReader, BitWriter};
use crate::coding_parameters::CodingParameters;
use crate::constants::ACCUMULATOR_TABLE_CONSTANT;
use crate::error::Ccsds123Error;
use std::io::{Read, Write};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct BandStatistics {
    accumulator: u64,
    counter: u64,
}

/// Adaptive statistics shared by the encoder and the decoder.
#[derive(Debug, Clone)]
pub struct SampleAdaptiveStatistics {
    dynamic_range: u32,
    rescaling_counter_size: u32,
    initial_count_exponent: u32,
    accumulator_init_constant: u32,
    accumulator_init_table: Option<Vec<u32>>,
    bands: Vec<BandStatistics>,
}

impl SampleAdaptiveStatistics {
    pub fn new(parameters: &CodingParameters, bands: usize) -> Result<Self, Ccsds123Error> {
        let coder = &parameters.sample_adaptive;
        let accumulator_init_table = if coder.accumulator_init_constant == ACCUMULATOR_TABLE_CONSTANT
        {
            let table = coder
                .accumulator_init_table
                .clone()
                .ok_or(Ccsds123Error::MissingAccumulatorInitTable)?;
            if table.len() != bands {
                return Err(Ccsds123Error::InvalidParameterAccumulatorInitTable);
            }
            Some(table)
        } else {
            None
        };
        Ok(Self {
            dynamic_range: parameters.dynamic_range,
            rescaling_counter_size: coder.rescaling_counter_size,
            initial_count_exponent: coder.initial_count_exponent,
            accumulator_init_constant: coder.accumulator_init_constant,
            accumulator_init_table,
            bands: vec![BandStatistics::default(); bands],
        })
    }

    pub fn init_band(&mut self, z: usize) {
        let kappa = match &self.accumulator_init_table {
            Some(table) => table[z],
            None => self.accumulator_init_constant,
        } as u64;
        let counter = 1u64 << self.initial_count_exponent;
        let accumulator = ((3 * (1u64 << (kappa + 6)) - 49) * counter) >> 7;
        self.bands[z] = BandStatistics {
            accumulator,
            counter,
        };
    }

    /// Golomb parameter of the next sample of band `z`.
    pub fn coding_parameter(&self, z: usize) -> u32 {
        let statistics = &self.bands[z];
        let ratio =
            (statistics.accumulator + ((49 * statistics.counter) >> 7)) / statistics.counter;
        let k = if ratio == 0 { 0 } else { ratio.ilog2() };
        k.min(self.dynamic_range - 2)
    }

    pub fn update(&mut self, sample: u32, t: usize, z: usize) {
        if t == 0 {
            return;
        }
        let limit = (1u64 << self.rescaling_counter_size) - 1;
        let statistics = &mut self.bands[z];
        if statistics.counter < limit {
            statistics.accumulator += sample as u64;
            statistics.counter += 1;
        } else {
            statistics.accumulator = (statistics.accumulator + sample as u64 + 1) >> 1;
            statistics.counter = (statistics.counter + 1) >> 1;
        }
    }

    pub fn accumulator(&self, z: usize) -> u64 {
        self.bands[z].accumulator
    }

    pub fn counter(&self, z: usize) -> u64 {
        self.bands[z].counter
    }
}

pub struct SampleAdaptiveEncoder {
    statistics: SampleAdaptiveStatistics,
    dynamic_range: u32,
    unary_length_limit: u32,
}

impl SampleAdaptiveEncoder {
    pub fn new(parameters: &CodingParameters, bands: usize) -> Result<Self, Ccsds123Error> {
        debug!(
            unary_length_limit = parameters.sample_adaptive.unary_length_limit,
            rescaling_counter_size = parameters.sample_adaptive.rescaling_counter_size,
            initial_count_exponent = parameters.sample_adaptive.initial_count_exponent,
            "sample-adaptive encoder"
        );
        Ok(Self {
            statistics: SampleAdaptiveStatistics::new(parameters, bands)?,
            dynamic_range: parameters.dynamic_range,
            unary_length_limit: parameters.sample_adaptive.unary_length_limit,
        })
    }

    pub fn statistics(&self) -> &SampleAdaptiveStatistics {
        &self.statistics
    }
}

impl EntropyEncoder for SampleAdaptiveEncoder {
    fn init_band(&mut self, z: usize) {
        self.statistics.init_band(z);
    }

    fn code_sample<W: Write>(
        &mut self,
        writer: &mut BitWriter<W>,
        sample: u32,
        t: usize,
        z: usize,
    ) -> Result<(), Ccsds123Error> {
        if (sample as u64) >> self.dynamic_range != 0 {
            return Err(Ccsds123Error::InvalidArgument);
        }
        if t == 0 {
            return writer.write_bits(self.dynamic_range, sample);
        }

        let k = self.statistics.coding_parameter(z);
        let high_bits = sample >> k;
        if high_bits < self.unary_length_limit {
            write_unary(writer, high_bits)?;
            writer.write_bits(k, sample)
        } else {
            writer.write_bits(self.unary_length_limit, 0)?;
            writer.write_bits(self.dynamic_range, sample)
        }
    }

    fn update(&mut self, sample: u32, t: usize, z: usize) {
        self.statistics.update(sample, t, z);
    }

    fn terminate<W: Write>(&mut self, writer: &mut BitWriter<W>) -> Result<(), Ccsds123Error> {
        writer.flush()
    }
}

pub struct SampleAdaptiveDecoder {
    statistics: SampleAdaptiveStatistics,
    dynamic_range: u32,
    unary_length_limit: u32,
}

impl SampleAdaptiveDecoder {
    pub fn new(parameters: &CodingParameters, bands: usize) -> Result<Self, Ccsds123Error> {
        debug!(
            unary_length_limit = parameters.sample_adaptive.unary_length_limit,
            "sample-adaptive decoder"
        );
        Ok(Self {
            statistics: SampleAdaptiveStatistics::new(parameters, bands)?,
            dynamic_range: parameters.dynamic_range,
            unary_length_limit: parameters.sample_adaptive.unary_length_limit,
        })
    }
}

impl EntropyDecoder for SampleAdaptiveDecoder {
    fn init_band(&mut self, z: usize) {
        self.statistics.init_band(z);
    }

    fn decode_sample<R: Read>(
        &mut self,
        reader: &mut BitReader<R>,
        t: usize,
        z: usize,
    ) -> Result<u32, Ccsds123Error> {
        if t == 0 {
            return reader.read_bits(self.dynamic_range);
        }

        let k = self.statistics.coding_parameter(z);
        // The unary prefix stops at the length limit
        let mut high_bits = 0;
        while high_bits < self.unary_length_limit {
            if reader.read_bit()? {
                return Ok((high_bits << k) | reader.read_bits(k)?);
            }
            high_bits += 1;
        }
        reader.read_bits(self.dynamic_range)
    }

    fn update(&mut self, sample: u32, t: usize, z: usize) {
        self.statistics.update(sample, t, z);
    }
}
