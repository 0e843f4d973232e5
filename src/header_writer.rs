//! Header writer utilities.
//!
//! This module provides the `HeaderWriter` which emits the bit-packed header
//! that starts every compressed stream: image metadata, predictor metadata and
//! the metadata of the selected entropy coder, each padded to a byte boundary.

use crate::bit_io::BitWriter;
use crate::coding_parameters::CodingParameters;
use crate::constants::MAXIMUM_DIMENSION;
use crate::error::Ccsds123Error;
use crate::{CubeInfo, EntropyCoderType, SampleEncodingOrder, WeightInitMethod};
use std::io::Write;

/// Values equal to the field range wrap to 0, as the header convention demands.
fn wrapped(value: u32, bits: u32) -> u32 {
    if value == 1 << bits { 0 } else { value }
}

pub struct HeaderWriter<'a, W: Write> {
    writer: &'a mut BitWriter<W>,
}

impl<'a, W: Write> HeaderWriter<'a, W> {
    pub fn new(writer: &'a mut BitWriter<W>) -> Self {
        Self { writer }
    }

    pub fn write_header(
        &mut self,
        info: &CubeInfo,
        parameters: &CodingParameters,
    ) -> Result<(), Ccsds123Error> {
        self.write_image_metadata(info, parameters)?;
        self.write_predictor_metadata(parameters)?;
        match parameters.entropy_coder_type {
            EntropyCoderType::SampleAdaptive => self.write_sample_adaptive_metadata(parameters),
            EntropyCoderType::BlockAdaptive => self.write_block_adaptive_metadata(parameters),
        }
    }

    pub fn write_image_metadata(
        &mut self,
        info: &CubeInfo,
        parameters: &CodingParameters,
    ) -> Result<(), Ccsds123Error> {
        // User defined data
        self.writer.write_bits(8, 0)?;
        self.writer.write_bits(16, wrapped(info.columns, 16))?;
        self.writer.write_bits(16, wrapped(info.rows, 16))?;
        self.writer.write_bits(16, wrapped(info.bands, 16))?;

        self.writer.write_bit(info.signed)?;
        self.writer.write_bits(2, 0)?;
        self.writer.write_bits(4, wrapped(parameters.dynamic_range, 4))?;
        let order: u8 = parameters.sample_encoding_order.into();
        self.writer.write_bits(1, order as u32)?;

        let depth = match parameters.sample_encoding_order {
            SampleEncodingOrder::BandInterleaved => {
                wrapped(parameters.subframe_interleaving_depth, 16)
            }
            SampleEncodingOrder::BandSequential => {
                parameters.subframe_interleaving_depth % MAXIMUM_DIMENSION
            }
        };
        self.writer.write_bits(16, depth)?;

        self.writer.write_bits(2, 0)?;
        self.writer.write_bits(3, wrapped(parameters.output_word_size, 3))?;
        let coder: u8 = parameters.entropy_coder_type.into();
        self.writer.write_bits(1, coder as u32)?;
        self.writer.write_bits(10, 0)?;
        self.writer.flush()
    }

    pub fn write_predictor_metadata(
        &mut self,
        parameters: &CodingParameters,
    ) -> Result<(), Ccsds123Error> {
        let predictor = &parameters.predictor;
        self.writer.write_bits(2, 0)?;
        self.writer.write_bits(4, predictor.prediction_bands)?;
        let mode: u8 = predictor.prediction_mode.into();
        self.writer.write_bits(1, mode as u32)?;
        self.writer.write_bits(1, 0)?;

        let sum_mode: u8 = predictor.local_sum_mode.into();
        self.writer.write_bits(1, sum_mode as u32)?;
        self.writer.write_bits(1, 0)?;
        self.writer.write_bits(6, wrapped(predictor.register_size, 6))?;

        self.writer.write_bits(4, predictor.weight_resolution - 4)?;
        self.writer.write_bits(4, predictor.weight_update_interval - 4)?;
        self.writer.write_bits(4, (predictor.weight_update_initial_exponent + 6) as u32)?;
        self.writer.write_bits(4, (predictor.weight_update_final_exponent + 6) as u32)?;

        self.writer.write_bits(1, 0)?;
        let method: u8 = predictor.weight_init_method.into();
        self.writer.write_bits(1, method as u32)?;
        self.writer.write_bit(predictor.weight_init_table_flag)?;
        self.writer.write_bits(5, predictor.weight_init_resolution)?;
        self.writer.flush()?;

        if predictor.weight_init_method == WeightInitMethod::Custom
            && predictor.weight_init_table_flag
        {
            let table = predictor
                .weight_init_table
                .as_ref()
                .ok_or(Ccsds123Error::MissingWeightInitTable)?;
            for row in table {
                for &weight in row {
                    self.writer.write_bits(predictor.weight_init_resolution, weight as u32)?;
                }
            }
            self.writer.flush()?;
        }
        Ok(())
    }

    pub fn write_sample_adaptive_metadata(
        &mut self,
        parameters: &CodingParameters,
    ) -> Result<(), Ccsds123Error> {
        let coder = &parameters.sample_adaptive;
        self.writer.write_bits(5, wrapped(coder.unary_length_limit, 5))?;
        self.writer.write_bits(3, coder.rescaling_counter_size - 4)?;
        self.writer.write_bits(3, wrapped(coder.initial_count_exponent, 3))?;
        self.writer.write_bits(4, coder.accumulator_init_constant)?;
        self.writer.write_bit(coder.accumulator_init_table_flag)?;
        self.writer.flush()?;

        if coder.accumulator_init_table_flag {
            let table = coder
                .accumulator_init_table
                .as_ref()
                .ok_or(Ccsds123Error::MissingAccumulatorInitTable)?;
            for &k in table {
                self.writer.write_bits(4, k)?;
            }
            if table.len() % 2 == 1 {
                self.writer.write_bits(4, 0)?;
            }
            self.writer.flush()?;
        }
        Ok(())
    }

    pub fn write_block_adaptive_metadata(
        &mut self,
        parameters: &CodingParameters,
    ) -> Result<(), Ccsds123Error> {
        let coder = &parameters.block_adaptive;
        self.writer.write_bits(1, 0)?;
        self.writer.write_bits(2, (coder.block_size / 8).ilog2())?;
        self.writer.write_bit(parameters.restricted_id_bits())?;
        self.writer.write_bits(12, wrapped(coder.reference_sample_interval, 12))?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(info: &CubeInfo, parameters: &CodingParameters) -> Result<Vec<u8>, Ccsds123Error> {
        let mut writer = BitWriter::new(Vec::new());
        HeaderWriter::new(&mut writer).write_header(info, parameters)?;
        writer.close()
    }

    #[test]
    fn test_default_header_layout() -> Result<(), Ccsds123Error> {
        let info = CubeInfo::new(3, 2, 5, false);
        let bytes = header(&info, &CodingParameters::default())?;
        assert_eq!(
            bytes,
            vec![
                0x00, // user data
                0x00, 0x05, 0x00, 0x02, 0x00, 0x03, // X, Y, Z
                0x01, // unsigned, D = 16 wraps to 0, BSQ
                0x00, 0x00, // M
                0x20, 0x00, // B = 4, sample-adaptive
                0x3C, // P = 15, full
                0x20, // neighbor sums, R = 32
                0x92, // omega = 13, tinc = 6
                0x59, // vmin = -1, vmax = 3
                0x00, // default weights
                0x82, 0x2A, // Umax = 16, gamma* = 6, gamma0 = 1, K = 5
            ]
        );
        Ok(())
    }

    #[test]
    fn test_maximum_dimensions_wrap() -> Result<(), Ccsds123Error> {
        let info = CubeInfo::new(1 << 16, 1, 1 << 16, true);
        let mut parameters = CodingParameters::default();
        parameters.predictor.register_size = 64;
        parameters.output_word_size = 8;
        let bytes = header(&info, &parameters)?;
        assert_eq!(&bytes[1..7], &[0, 0, 0, 1, 0, 0]);
        assert_eq!(bytes[7], 0x81);
        assert_eq!(bytes[10], 0x00);
        assert_eq!(bytes[13], 0x00);
        Ok(())
    }

    #[test]
    fn test_block_adaptive_section() -> Result<(), Ccsds123Error> {
        let info = CubeInfo::new(1, 1, 1, false);
        let mut parameters = CodingParameters {
            dynamic_range: 4,
            entropy_coder_type: EntropyCoderType::BlockAdaptive,
            ..Default::default()
        };
        parameters.block_adaptive.block_size = 64;
        parameters.block_adaptive.restricted_code_options = true;
        parameters.block_adaptive.reference_sample_interval = 4096;
        let bytes = header(&info, &parameters)?;
        assert_eq!(bytes.len(), 19);
        assert_eq!(&bytes[17..], &[0b0111_0000, 0x00]);

        // The restricted flag is only effective for low dynamic ranges
        parameters.dynamic_range = 5;
        let bytes = header(&info, &parameters)?;
        assert_eq!(&bytes[17..], &[0b0110_0000, 0x00]);
        Ok(())
    }

    #[test]
    fn test_tables_are_embedded() -> Result<(), Ccsds123Error> {
        let info = CubeInfo::new(1, 2, 2, false);
        let mut parameters = CodingParameters::default();
        parameters.predictor.prediction_bands = 0;
        parameters.predictor.weight_init_method = WeightInitMethod::Custom;
        parameters.predictor.weight_init_table_flag = true;
        parameters.predictor.weight_init_resolution = 4;
        parameters.predictor.weight_init_table = Some(vec![vec![-1, 7, 0]]);
        parameters.sample_adaptive.accumulator_init_constant = 15;
        parameters.sample_adaptive.accumulator_init_table_flag = true;
        parameters.sample_adaptive.accumulator_init_table = Some(vec![9]);
        let bytes = header(&info, &parameters)?;
        // Weight table: 1111 0111 0000, padded
        assert_eq!(&bytes[17..19], &[0xF7, 0x00]);
        // Accumulator table: one nibble plus a pad nibble
        assert_eq!(bytes[21], 0x90);
        assert_eq!(bytes.len(), 22);
        Ok(())
    }
}
