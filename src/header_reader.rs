//! Header reader utilities.
//!
//! `HeaderReader` parses the bit-packed header written by
//! [`HeaderWriter`](crate::header_writer::HeaderWriter) back into the cube
//! geometry and the coding parameters. Range validation is left to
//! [`CodingParameters::validate`], since tables that are absent from the header
//! may still be supplied to the decoder afterwards.

use crate::bit_io::BitReader;
use crate::coding_parameters::CodingParameters;
use crate::error::Ccsds123Error;
use crate::{
    CubeInfo, EntropyCoderType, LocalSumMode, PredictionMode, SampleEncodingOrder,
    WeightInitMethod,
};
use std::convert::TryFrom;
use std::io::Read;
use tracing::debug;

/// A zero field stands for the full range of a field of `bits` bits.
fn unwrapped(value: u32, bits: u32) -> u32 {
    if value == 0 { 1 << bits } else { value }
}

pub struct HeaderReader<'a, R: Read> {
    reader: &'a mut BitReader<R>,
}

impl<'a, R: Read> HeaderReader<'a, R> {
    pub fn new(reader: &'a mut BitReader<R>) -> Self {
        Self { reader }
    }

    pub fn read_header(&mut self) -> Result<(CubeInfo, CodingParameters), Ccsds123Error> {
        let mut parameters = CodingParameters::default();
        let info = self.read_image_metadata(&mut parameters)?;
        self.read_predictor_metadata(&info, &mut parameters)?;
        match parameters.entropy_coder_type {
            EntropyCoderType::SampleAdaptive => {
                self.read_sample_adaptive_metadata(&info, &mut parameters)?
            }
            EntropyCoderType::BlockAdaptive => self.read_block_adaptive_metadata(&mut parameters)?,
        }
        Ok((info, parameters))
    }

    pub fn read_image_metadata(
        &mut self,
        parameters: &mut CodingParameters,
    ) -> Result<CubeInfo, Ccsds123Error> {
        let _user_data = self.reader.read_bits(8)?;
        let columns = unwrapped(self.reader.read_bits(16)?, 16);
        let rows = unwrapped(self.reader.read_bits(16)?, 16);
        let bands = unwrapped(self.reader.read_bits(16)?, 16);

        let signed = self.reader.read_bit()?;
        self.reader.read_bits(2)?;
        parameters.dynamic_range = unwrapped(self.reader.read_bits(4)?, 4);
        parameters.sample_encoding_order =
            SampleEncodingOrder::try_from(self.reader.read_bits(1)? as u8)
                .map_err(|_| Ccsds123Error::InvalidParameterSampleEncodingOrder)?;

        let depth = self.reader.read_bits(16)?;
        parameters.subframe_interleaving_depth = match parameters.sample_encoding_order {
            SampleEncodingOrder::BandInterleaved => unwrapped(depth, 16),
            SampleEncodingOrder::BandSequential => depth,
        };

        self.reader.read_bits(2)?;
        parameters.output_word_size = unwrapped(self.reader.read_bits(3)?, 3);
        parameters.entropy_coder_type = EntropyCoderType::try_from(self.reader.read_bits(1)? as u8)
            .map_err(|_| Ccsds123Error::InvalidParameterEntropyCoderType)?;
        self.reader.read_bits(10)?;
        self.reader.align();

        let info = CubeInfo::new(bands, rows, columns, signed);
        debug!(
            bands,
            rows,
            columns,
            signed,
            dynamic_range = parameters.dynamic_range,
            order = ?parameters.sample_encoding_order,
            depth = parameters.subframe_interleaving_depth,
            output_word_size = parameters.output_word_size,
            coder = ?parameters.entropy_coder_type,
            "image metadata"
        );
        Ok(info)
    }

    pub fn read_predictor_metadata(
        &mut self,
        info: &CubeInfo,
        parameters: &mut CodingParameters,
    ) -> Result<(), Ccsds123Error> {
        let predictor = &mut parameters.predictor;
        self.reader.read_bits(2)?;
        predictor.prediction_bands = self.reader.read_bits(4)?;
        predictor.prediction_mode = PredictionMode::try_from(self.reader.read_bits(1)? as u8)
            .map_err(|_| Ccsds123Error::InvalidParameterPredictionMode)?;
        self.reader.read_bits(1)?;

        predictor.local_sum_mode = LocalSumMode::try_from(self.reader.read_bits(1)? as u8)
            .map_err(|_| Ccsds123Error::InvalidParameterLocalSumMode)?;
        self.reader.read_bits(1)?;
        predictor.register_size = unwrapped(self.reader.read_bits(6)?, 6);

        predictor.weight_resolution = self.reader.read_bits(4)? + 4;
        predictor.weight_update_interval = self.reader.read_bits(4)? + 4;
        predictor.weight_update_initial_exponent = self.reader.read_bits(4)? as i32 - 6;
        predictor.weight_update_final_exponent = self.reader.read_bits(4)? as i32 - 6;

        self.reader.read_bits(1)?;
        predictor.weight_init_method = WeightInitMethod::try_from(self.reader.read_bits(1)? as u8)
            .map_err(|_| Ccsds123Error::InvalidParameterWeightInitMethod)?;
        predictor.weight_init_table_flag = self.reader.read_bit()?;
        predictor.weight_init_resolution = self.reader.read_bits(5)?;
        self.reader.align();

        debug!(
            prediction_bands = predictor.prediction_bands,
            mode = ?predictor.prediction_mode,
            local_sum_mode = ?predictor.local_sum_mode,
            register_size = predictor.register_size,
            weight_resolution = predictor.weight_resolution,
            weight_update_interval = predictor.weight_update_interval,
            vmin = predictor.weight_update_initial_exponent,
            vmax = predictor.weight_update_final_exponent,
            method = ?predictor.weight_init_method,
            table = predictor.weight_init_table_flag,
            resolution = predictor.weight_init_resolution,
            "predictor metadata"
        );

        if predictor.weight_init_method == WeightInitMethod::Custom
            && predictor.weight_init_table_flag
        {
            let resolution = predictor.weight_init_resolution;
            if resolution == 0 {
                return Err(Ccsds123Error::InvalidHeader);
            }
            let sign = 1i64 << (resolution - 1);
            let mut table = Vec::with_capacity(info.bands as usize);
            for z in 0..info.bands {
                let count = predictor.local_difference_count(z);
                let mut row = Vec::with_capacity(count);
                for _ in 0..count {
                    let value = self.reader.read_bits(resolution)? as i64;
                    let value = if value >= sign { value - 2 * sign } else { value };
                    row.push(value as i32);
                }
                table.push(row);
            }
            self.reader.align();
            predictor.weight_init_table = Some(table);
        }
        Ok(())
    }

    pub fn read_sample_adaptive_metadata(
        &mut self,
        info: &CubeInfo,
        parameters: &mut CodingParameters,
    ) -> Result<(), Ccsds123Error> {
        let coder = &mut parameters.sample_adaptive;
        coder.unary_length_limit = unwrapped(self.reader.read_bits(5)?, 5);
        coder.rescaling_counter_size = self.reader.read_bits(3)? + 4;
        coder.initial_count_exponent = unwrapped(self.reader.read_bits(3)?, 3);
        coder.accumulator_init_constant = self.reader.read_bits(4)?;
        coder.accumulator_init_table_flag = self.reader.read_bit()?;
        self.reader.align();

        debug!(
            unary_length_limit = coder.unary_length_limit,
            rescaling_counter_size = coder.rescaling_counter_size,
            initial_count_exponent = coder.initial_count_exponent,
            accumulator_init_constant = coder.accumulator_init_constant,
            table = coder.accumulator_init_table_flag,
            "sample-adaptive metadata"
        );

        if coder.accumulator_init_table_flag {
            let mut table = Vec::with_capacity(info.bands as usize);
            for _ in 0..info.bands {
                table.push(self.reader.read_bits(4)?);
            }
            if info.bands % 2 == 1 {
                self.reader.read_bits(4)?;
            }
            self.reader.align();
            coder.accumulator_init_table = Some(table);
        }
        Ok(())
    }

    pub fn read_block_adaptive_metadata(
        &mut self,
        parameters: &mut CodingParameters,
    ) -> Result<(), Ccsds123Error> {
        let coder = &mut parameters.block_adaptive;
        self.reader.read_bits(1)?;
        coder.block_size = 8 << self.reader.read_bits(2)?;
        coder.restricted_code_options = self.reader.read_bit()?;
        coder.reference_sample_interval = unwrapped(self.reader.read_bits(12)?, 12);
        self.reader.align();

        debug!(
            block_size = coder.block_size,
            restricted = coder.restricted_code_options,
            reference_sample_interval = coder.reference_sample_interval,
            "block-adaptive metadata"
        );
        Ok(())
    }
}
