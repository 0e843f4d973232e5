use crate::bit_io::BitWriter;
use crate::coding_parameters::{CodingParameters, validate_geometry};
use crate::cube::{Cube, CubeRowReader, RowSource};
use crate::entropy::{BlockAdaptiveEncoder, EntropyEncoder, SampleAdaptiveEncoder};
use crate::error::Ccsds123Error;
use crate::header_writer::HeaderWriter;
use crate::predictor::Predictor;
use crate::sample_window::{BandInterleavedWindow, BandSequentialWindow};
use crate::{CubeInfo, EntropyCoderType, SampleEncodingOrder};
use std::cmp::min;
use std::io::Write;
use tracing::{info, trace};

/// Compresses image cubes row by row.
///
/// The geometry and coding parameters are set first; `encode` then pulls rows
/// from a [`RowSource`] in the configured sample encoding order and writes the
/// header followed by the coded residuals.
#[derive(Debug, Clone, Default)]
pub struct Ccsds123Encoder {
    cube_info: Option<CubeInfo>,
    parameters: CodingParameters,
    pedantic: bool,
}

impl Ccsds123Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cube_info(&mut self, cube_info: CubeInfo) -> Result<(), Ccsds123Error> {
        validate_geometry(&cube_info)?;
        self.cube_info = Some(cube_info);
        Ok(())
    }

    pub fn set_coding_parameters(
        &mut self,
        parameters: CodingParameters,
    ) -> Result<(), Ccsds123Error> {
        if let Some(info) = &self.cube_info {
            parameters.validate(info)?;
        }
        self.parameters = parameters;
        Ok(())
    }

    pub fn coding_parameters(&self) -> &CodingParameters {
        &self.parameters
    }

    /// Rejects cubes that have no more bands than prediction bands.
    pub fn set_pedantic(&mut self, pedantic: bool) {
        self.pedantic = pedantic;
    }

    /// Compresses every row of `source` into `destination`. Returns the number
    /// of bytes written, header and padding included.
    pub fn encode<S: RowSource, W: Write>(
        &mut self,
        source: &mut S,
        destination: W,
    ) -> Result<usize, Ccsds123Error> {
        let info = self.cube_info.ok_or(Ccsds123Error::InvalidOperation)?;
        self.parameters.validate(&info)?;
        if self.pedantic && info.bands <= self.parameters.predictor.prediction_bands {
            return Err(Ccsds123Error::PedanticPredictionBands);
        }

        info!(
            bands = info.bands,
            rows = info.rows,
            columns = info.columns,
            dynamic_range = self.parameters.dynamic_range,
            order = ?self.parameters.sample_encoding_order,
            coder = ?self.parameters.entropy_coder_type,
            "compression started"
        );

        let mut writer = BitWriter::new(destination);
        HeaderWriter::new(&mut writer).write_header(&info, &self.parameters)?;
        let header_bytes = writer.bytes_written();

        let mut predictor = Predictor::new(&info, &self.parameters)?;
        match self.parameters.entropy_coder_type {
            EntropyCoderType::SampleAdaptive => {
                let mut coder = SampleAdaptiveEncoder::new(&self.parameters, info.bands as usize)?;
                self.encode_body(&info, source, &mut writer, &mut predictor, &mut coder)?;
            }
            EntropyCoderType::BlockAdaptive => {
                let mut coder = BlockAdaptiveEncoder::from_parameters(&self.parameters)?;
                self.encode_body(&info, source, &mut writer, &mut predictor, &mut coder)?;
            }
        }

        let word_size = self.parameters.output_word_size as u64;
        let padding = (word_size - writer.bytes_written() % word_size) % word_size;
        for _ in 0..padding {
            writer.write_bits(8, 0)?;
        }
        let total = writer.bytes_written();
        writer.close()?;

        info!(header_bytes, bytes = total, "compression finished");
        Ok(total as usize)
    }

    /// Compresses an in-memory cube whose geometry matches the configured one.
    pub fn encode_cube(&mut self, cube: &Cube) -> Result<Vec<u8>, Ccsds123Error> {
        let info = self.cube_info.ok_or(Ccsds123Error::InvalidOperation)?;
        if cube.info() != info {
            return Err(Ccsds123Error::InvalidArgument);
        }
        let mut reader = CubeRowReader::new(cube, self.parameters.sample_encoding_order);
        let mut data = Vec::new();
        self.encode(&mut reader, &mut data)?;
        Ok(data)
    }

    fn encode_body<S: RowSource, W: Write, E: EntropyEncoder>(
        &self,
        info: &CubeInfo,
        source: &mut S,
        writer: &mut BitWriter<W>,
        predictor: &mut Predictor,
        coder: &mut E,
    ) -> Result<(), Ccsds123Error> {
        match self.parameters.sample_encoding_order {
            SampleEncodingOrder::BandSequential => {
                self.encode_band_sequential(info, source, writer, predictor, coder)?
            }
            SampleEncodingOrder::BandInterleaved => {
                self.encode_band_interleaved(info, source, writer, predictor, coder)?
            }
        }
        predictor.end();
        coder.terminate(writer)
    }

    fn encode_band_sequential<S: RowSource, W: Write, E: EntropyEncoder>(
        &self,
        info: &CubeInfo,
        source: &mut S,
        writer: &mut BitWriter<W>,
        predictor: &mut Predictor,
        coder: &mut E,
    ) -> Result<(), Ccsds123Error> {
        let (bands, rows, columns) = (
            info.bands as usize,
            info.rows as usize,
            info.columns as usize,
        );
        let prediction_bands = self.parameters.predictor.prediction_bands as usize;
        let mut window = BandSequentialWindow::new(prediction_bands, rows, columns);

        for z in 0..bands {
            trace!(band = z, "encoding band");
            coder.init_band(z);
            for y in 0..rows {
                source.read_row(window.row_mut(z, y))?;
                for x in 0..columns {
                    let mapped = predictor.compress(&window, z, y, x)?;
                    let t = y * columns + x;
                    coder.code_sample(writer, mapped, t, z)?;
                    coder.update(mapped, t, z);
                }
            }
        }
        Ok(())
    }

    fn encode_band_interleaved<S: RowSource, W: Write, E: EntropyEncoder>(
        &self,
        info: &CubeInfo,
        source: &mut S,
        writer: &mut BitWriter<W>,
        predictor: &mut Predictor,
        coder: &mut E,
    ) -> Result<(), Ccsds123Error> {
        let (bands, rows, columns) = (
            info.bands as usize,
            info.rows as usize,
            info.columns as usize,
        );
        let depth = self.parameters.subframe_interleaving_depth as usize;
        let mut window = BandInterleavedWindow::new(bands, columns);

        for y in 0..rows {
            trace!(row = y, "encoding row");
            for z in 0..bands {
                source.read_row(window.row_mut(z, y))?;
            }
            for first in (0..bands).step_by(depth) {
                let last = min(first + depth, bands);
                for x in 0..columns {
                    for z in first..last {
                        if x == 0 && y == 0 {
                            coder.init_band(z);
                        }
                        let mapped = predictor.compress(&window, z, y, x)?;
                        let t = y * columns + x;
                        coder.code_sample(writer, mapped, t, z)?;
                        coder.update(mapped, t, z);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAXIMUM_PREDICTION_BANDS;

    fn ramp_cube(info: CubeInfo) -> Cube {
        let mut cube = Cube::new(info);
        for z in 0..info.bands as usize {
            for y in 0..info.rows as usize {
                for x in 0..info.columns as usize {
                    cube.set(z, y, x, ((x * 5 + y * 3 + z * 11) % 200) as i32);
                }
            }
        }
        cube
    }

    #[test]
    fn test_encode_requires_geometry() {
        let mut encoder = Ccsds123Encoder::new();
        let info = CubeInfo::new(1, 1, 1, false);
        assert!(matches!(
            encoder.encode_cube(&Cube::new(info)),
            Err(Ccsds123Error::InvalidOperation)
        ));
    }

    #[test]
    fn test_invalid_geometry_is_rejected() {
        let mut encoder = Ccsds123Encoder::new();
        assert!(matches!(
            encoder.set_cube_info(CubeInfo::new(0, 4, 4, false)),
            Err(Ccsds123Error::InvalidParameterBands)
        ));
        assert!(matches!(
            encoder.set_cube_info(CubeInfo::new(1, 4, (1 << 16) + 1, false)),
            Err(Ccsds123Error::InvalidParameterColumns)
        ));
    }

    #[test]
    fn test_parameters_are_checked_against_geometry() -> Result<(), Ccsds123Error> {
        let mut encoder = Ccsds123Encoder::new();
        encoder.set_cube_info(CubeInfo::new(2, 4, 4, false))?;
        let parameters = CodingParameters {
            sample_encoding_order: SampleEncodingOrder::BandInterleaved,
            subframe_interleaving_depth: 3,
            ..Default::default()
        };
        assert!(matches!(
            encoder.set_coding_parameters(parameters),
            Err(Ccsds123Error::InvalidParameterSubframeInterleavingDepth)
        ));
        Ok(())
    }

    #[test]
    fn test_pedantic_prediction_bands() -> Result<(), Ccsds123Error> {
        let info = CubeInfo::new(3, 2, 2, false);
        let cube = ramp_cube(info);
        let mut encoder = Ccsds123Encoder::new();
        encoder.set_cube_info(info)?;
        encoder.set_coding_parameters(CodingParameters {
            dynamic_range: 8,
            ..Default::default()
        })?;
        assert_eq!(
            encoder.coding_parameters().predictor.prediction_bands,
            MAXIMUM_PREDICTION_BANDS
        );
        encoder.encode_cube(&cube)?;

        encoder.set_pedantic(true);
        assert!(matches!(
            encoder.encode_cube(&cube),
            Err(Ccsds123Error::PedanticPredictionBands)
        ));
        Ok(())
    }

    #[test]
    fn test_output_is_padded_to_word_size() -> Result<(), Ccsds123Error> {
        let info = CubeInfo::new(2, 3, 5, false);
        let cube = ramp_cube(info);
        for word_size in 1..=8 {
            for coder in [EntropyCoderType::SampleAdaptive, EntropyCoderType::BlockAdaptive] {
                let mut encoder = Ccsds123Encoder::new();
                encoder.set_cube_info(info)?;
                encoder.set_coding_parameters(CodingParameters {
                    dynamic_range: 8,
                    output_word_size: word_size,
                    entropy_coder_type: coder,
                    ..Default::default()
                })?;
                let data = encoder.encode_cube(&cube)?;
                assert_eq!(data.len() % word_size as usize, 0);
            }
        }
        Ok(())
    }

    #[test]
    fn test_encode_reports_byte_count() -> Result<(), Ccsds123Error> {
        let info = CubeInfo::new(1, 4, 4, false);
        let cube = ramp_cube(info);
        let mut encoder = Ccsds123Encoder::new();
        encoder.set_cube_info(info)?;
        let mut reader = CubeRowReader::new(&cube, SampleEncodingOrder::BandSequential);
        let mut data = Vec::new();
        let written = encoder.encode(&mut reader, &mut data)?;
        assert_eq!(written, data.len());
        Ok(())
    }

    #[test]
    fn test_out_of_range_sample_is_reported() -> Result<(), Ccsds123Error> {
        let info = CubeInfo::new(1, 1, 2, false);
        let cube = Cube::from_samples(info, vec![3, 4])?;
        let mut encoder = Ccsds123Encoder::new();
        encoder.set_cube_info(info)?;
        let mut parameters = CodingParameters {
            dynamic_range: 2,
            ..Default::default()
        };
        parameters.sample_adaptive.accumulator_init_constant = 0;
        encoder.set_coding_parameters(parameters)?;
        assert!(matches!(
            encoder.encode_cube(&cube),
            Err(Ccsds123Error::SampleOutOfRange)
        ));
        Ok(())
    }
}
