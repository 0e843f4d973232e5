use crate::bit_io::BitReader;
use crate::coding_parameters::CodingParameters;
use crate::cube::{Cube, CubeRowWriter, RowSink};
use crate::entropy::{BlockAdaptiveDecoder, EntropyDecoder, SampleAdaptiveDecoder};
use crate::error::Ccsds123Error;
use crate::header_reader::HeaderReader;
use crate::options::Options;
use crate::predictor::Predictor;
use crate::sample_window::{BandInterleavedWindow, BandSequentialWindow};
use crate::{CubeInfo, EntropyCoderType, SampleEncodingOrder, WeightInitMethod};
use std::cmp::min;
use std::io::Read;
use tracing::{info, trace};

/// Rebuilds image cubes from compressed streams.
///
/// `read_header` must run first. Initialization tables that the stream uses
/// without embedding them, and the block-adaptive segment size, have to be
/// supplied through the setters or an options text before decoding.
pub struct Ccsds123Decoder<R: Read> {
    reader: BitReader<R>,
    cube_info: Option<CubeInfo>,
    parameters: CodingParameters,
    options: Options,
    weight_init_table: Option<Vec<Vec<i32>>>,
    accumulator_init_table: Option<Vec<u32>>,
    segment_size: Option<u32>,
}

impl<R: Read> Ccsds123Decoder<R> {
    pub fn new(source: R) -> Self {
        Self {
            reader: BitReader::new(source),
            cube_info: None,
            parameters: CodingParameters::default(),
            options: Options::default(),
            weight_init_table: None,
            accumulator_init_table: None,
            segment_size: None,
        }
    }

    pub fn read_header(&mut self) -> Result<CubeInfo, Ccsds123Error> {
        if self.cube_info.is_some() {
            return Err(Ccsds123Error::InvalidOperation);
        }
        let (info, parameters) = HeaderReader::new(&mut self.reader).read_header()?;
        info!(
            bands = info.bands,
            rows = info.rows,
            columns = info.columns,
            signed = info.signed,
            header_bytes = self.reader.bytes_read(),
            "header read"
        );
        self.cube_info = Some(info);
        self.parameters = parameters;
        Ok(info)
    }

    pub fn cube_info(&self) -> Option<CubeInfo> {
        self.cube_info
    }

    /// Parameters read from the header.
    pub fn coding_parameters(&self) -> &CodingParameters {
        &self.parameters
    }

    /// Layers an options text on the options already given. Only the
    /// initialization tables and the segment size are taken from it; every
    /// other parameter comes from the header.
    pub fn set_options(&mut self, text: &str) -> Result<(), Ccsds123Error> {
        self.options.merge(Options::parse(text)?);
        Ok(())
    }

    pub fn set_weight_init_table(&mut self, table: Vec<Vec<i32>>) {
        self.weight_init_table = Some(table);
    }

    pub fn set_accumulator_init_table(&mut self, table: Vec<u32>) {
        self.accumulator_init_table = Some(table);
    }

    pub fn set_segment_size(&mut self, segment_size: u32) {
        self.segment_size = Some(segment_size);
    }

    /// Header parameters completed with the tables and segment size supplied
    /// by the caller.
    fn effective_parameters(&self, info: &CubeInfo) -> Result<CodingParameters, Ccsds123Error> {
        let mut parameters = self.parameters.clone();
        let mut supplied = parameters.clone();
        supplied.predictor.weight_init_table = None;
        supplied.sample_adaptive.accumulator_init_table = None;
        if !self.options.is_empty() {
            self.options.apply_tables(info, &mut supplied)?;
        }

        let predictor = &mut parameters.predictor;
        if predictor.weight_init_method == WeightInitMethod::Custom
            && predictor.weight_init_table.is_none()
        {
            predictor.weight_init_table = self
                .weight_init_table
                .clone()
                .or(supplied.predictor.weight_init_table);
        }
        let coder = &mut parameters.sample_adaptive;
        if coder.accumulator_init_table.is_none() {
            coder.accumulator_init_table = self
                .accumulator_init_table
                .clone()
                .or(supplied.sample_adaptive.accumulator_init_table);
        }
        if let Some(segment_size) = self.segment_size.or(self.options.segment_size()?) {
            parameters.block_adaptive.segment_size = segment_size;
        }
        Ok(parameters)
    }

    /// Decodes the body, handing reconstructed rows to `sink` in the sample
    /// encoding order of the stream.
    pub fn decode<K: RowSink>(&mut self, sink: &mut K) -> Result<(), Ccsds123Error> {
        let info = self.cube_info.ok_or(Ccsds123Error::InvalidOperation)?;
        let parameters = self.effective_parameters(&info)?;
        parameters.validate(&info)?;

        info!(
            dynamic_range = parameters.dynamic_range,
            order = ?parameters.sample_encoding_order,
            coder = ?parameters.entropy_coder_type,
            "decompression started"
        );

        let mut predictor = Predictor::new(&info, &parameters)?;
        match parameters.entropy_coder_type {
            EntropyCoderType::SampleAdaptive => {
                let mut coder = SampleAdaptiveDecoder::new(&parameters, info.bands as usize)?;
                self.decode_body(&info, &parameters, sink, &mut predictor, &mut coder)?;
            }
            EntropyCoderType::BlockAdaptive => {
                let mut coder = BlockAdaptiveDecoder::from_parameters(&parameters)?;
                self.decode_body(&info, &parameters, sink, &mut predictor, &mut coder)?;
            }
        }

        info!(bytes = self.reader.bytes_read(), "decompression finished");
        Ok(())
    }

    pub fn decode_cube(&mut self) -> Result<Cube, Ccsds123Error> {
        let info = self.cube_info.ok_or(Ccsds123Error::InvalidOperation)?;
        let mut writer = CubeRowWriter::new(info, self.parameters.sample_encoding_order);
        self.decode(&mut writer)?;
        Ok(writer.into_cube())
    }

    fn decode_body<K: RowSink, D: EntropyDecoder>(
        &mut self,
        info: &CubeInfo,
        parameters: &CodingParameters,
        sink: &mut K,
        predictor: &mut Predictor,
        coder: &mut D,
    ) -> Result<(), Ccsds123Error> {
        match parameters.sample_encoding_order {
            SampleEncodingOrder::BandSequential => {
                let prediction_bands = parameters.predictor.prediction_bands as usize;
                self.decode_band_sequential(info, prediction_bands, sink, predictor, coder)?
            }
            SampleEncodingOrder::BandInterleaved => {
                let depth = parameters.subframe_interleaving_depth as usize;
                self.decode_band_interleaved(info, depth, sink, predictor, coder)?
            }
        }
        predictor.end();
        Ok(())
    }

    fn decode_band_sequential<K: RowSink, D: EntropyDecoder>(
        &mut self,
        info: &CubeInfo,
        prediction_bands: usize,
        sink: &mut K,
        predictor: &mut Predictor,
        coder: &mut D,
    ) -> Result<(), Ccsds123Error> {
        let (bands, rows, columns) = (
            info.bands as usize,
            info.rows as usize,
            info.columns as usize,
        );
        let mut window = BandSequentialWindow::new(prediction_bands, rows, columns);

        for z in 0..bands {
            trace!(band = z, "decoding band");
            coder.init_band(z);
            for y in 0..rows {
                for x in 0..columns {
                    let t = y * columns + x;
                    let mapped = coder.decode_sample(&mut self.reader, t, z)?;
                    coder.update(mapped, t, z);
                    predictor.decompress(&mut window, z, y, x, mapped);
                }
                sink.write_row(window.row(z, y))?;
            }
        }
        Ok(())
    }

    fn decode_band_interleaved<K: RowSink, D: EntropyDecoder>(
        &mut self,
        info: &CubeInfo,
        depth: usize,
        sink: &mut K,
        predictor: &mut Predictor,
        coder: &mut D,
    ) -> Result<(), Ccsds123Error> {
        let (bands, rows, columns) = (
            info.bands as usize,
            info.rows as usize,
            info.columns as usize,
        );
        let mut window = BandInterleavedWindow::new(bands, columns);

        for y in 0..rows {
            trace!(row = y, "decoding row");
            for first in (0..bands).step_by(depth) {
                let last = min(first + depth, bands);
                for x in 0..columns {
                    for z in first..last {
                        if x == 0 && y == 0 {
                            coder.init_band(z);
                        }
                        let t = y * columns + x;
                        let mapped = coder.decode_sample(&mut self.reader, t, z)?;
                        coder.update(mapped, t, z);
                        predictor.decompress(&mut window, z, y, x, mapped);
                    }
                }
            }
            for z in 0..bands {
                sink.write_row(window.row(z, y))?;
            }
        }
        Ok(())
    }
}
