use crate::constants::*;
use crate::error::Ccsds123Error;
use crate::{
    CubeInfo, EntropyCoderType, LocalSumMode, PredictionMode, SampleEncodingOrder,
    WeightInitMethod,
};
use std::cmp::{max, min};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictorParameters {
    pub prediction_bands: u32,
    pub prediction_mode: PredictionMode,
    pub local_sum_mode: LocalSumMode,
    pub register_size: u32,
    /// Weight component resolution (omega).
    pub weight_resolution: u32,
    /// Weight update scaling exponent change interval (t_inc), as a power of two.
    pub weight_update_interval: u32,
    /// Weight update scaling exponent initial parameter (v_min).
    pub weight_update_initial_exponent: i32,
    /// Weight update scaling exponent final parameter (v_max).
    pub weight_update_final_exponent: i32,
    pub weight_init_method: WeightInitMethod,
    /// Whether the custom weight table is embedded in the header.
    pub weight_init_table_flag: bool,
    /// Weight initialization resolution (Q), 0 for the default method.
    pub weight_init_resolution: u32,
    /// One row per band holding `local_difference_count(z)` entries.
    pub weight_init_table: Option<Vec<Vec<i32>>>,
}

impl Default for PredictorParameters {
    fn default() -> Self {
        Self {
            prediction_bands: DEFAULT_PREDICTION_BANDS,
            prediction_mode: PredictionMode::Full,
            local_sum_mode: LocalSumMode::NeighborOriented,
            register_size: DEFAULT_REGISTER_SIZE,
            weight_resolution: DEFAULT_WEIGHT_RESOLUTION,
            weight_update_interval: DEFAULT_WEIGHT_UPDATE_INTERVAL,
            weight_update_initial_exponent: DEFAULT_WEIGHT_UPDATE_INITIAL_EXPONENT,
            weight_update_final_exponent: DEFAULT_WEIGHT_UPDATE_FINAL_EXPONENT,
            weight_init_method: WeightInitMethod::Default,
            weight_init_table_flag: false,
            weight_init_resolution: 0,
            weight_init_table: None,
        }
    }
}

impl PredictorParameters {
    /// Length of the local difference and weight vectors of band `band`.
    pub fn local_difference_count(&self, band: u32) -> usize {
        let central = match self.prediction_mode {
            PredictionMode::Full => 3,
            PredictionMode::Reduced => 0,
        };
        min(self.prediction_bands, band) as usize + central
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleAdaptiveParameters {
    pub unary_length_limit: u32,
    pub rescaling_counter_size: u32,
    pub initial_count_exponent: u32,
    /// Accumulator initialization constant (K). 15 selects the per-band table.
    pub accumulator_init_constant: u32,
    /// Whether the accumulator table is embedded in the header.
    pub accumulator_init_table_flag: bool,
    pub accumulator_init_table: Option<Vec<u32>>,
}

impl Default for SampleAdaptiveParameters {
    fn default() -> Self {
        Self {
            unary_length_limit: DEFAULT_UNARY_LENGTH_LIMIT,
            rescaling_counter_size: DEFAULT_RESCALING_COUNTER_SIZE,
            initial_count_exponent: DEFAULT_INITIAL_COUNT_EXPONENT,
            accumulator_init_constant: DEFAULT_ACCUMULATOR_INIT_CONSTANT,
            accumulator_init_table_flag: false,
            accumulator_init_table: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockAdaptiveParameters {
    pub block_size: u32,
    pub reference_sample_interval: u32,
    pub restricted_code_options: bool,
    /// Blocks per segment. Not carried in the header, both ends must agree.
    pub segment_size: u32,
    pub reference_samples: bool,
}

impl Default for BlockAdaptiveParameters {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            reference_sample_interval: DEFAULT_REFERENCE_SAMPLE_INTERVAL,
            restricted_code_options: false,
            segment_size: DEFAULT_SEGMENT_SIZE,
            reference_samples: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodingParameters {
    pub dynamic_range: u32,
    pub sample_encoding_order: SampleEncodingOrder,
    pub subframe_interleaving_depth: u32,
    /// Output word size in bytes; the stream length is a multiple of it.
    pub output_word_size: u32,
    pub entropy_coder_type: EntropyCoderType,
    pub predictor: PredictorParameters,
    pub sample_adaptive: SampleAdaptiveParameters,
    pub block_adaptive: BlockAdaptiveParameters,
}

impl Default for CodingParameters {
    fn default() -> Self {
        Self {
            dynamic_range: DEFAULT_DYNAMIC_RANGE,
            sample_encoding_order: SampleEncodingOrder::BandSequential,
            subframe_interleaving_depth: 0,
            output_word_size: DEFAULT_OUTPUT_WORD_SIZE,
            entropy_coder_type: EntropyCoderType::SampleAdaptive,
            predictor: PredictorParameters::default(),
            sample_adaptive: SampleAdaptiveParameters::default(),
            block_adaptive: BlockAdaptiveParameters::default(),
        }
    }
}

/// Smallest, largest and center sample value for a dynamic range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLimits {
    pub minimum: i64,
    pub maximum: i64,
    pub mid: i64,
}

impl SampleLimits {
    pub fn new(dynamic_range: u32, signed: bool) -> Self {
        let half = 1i64 << (dynamic_range - 1);
        if signed {
            Self {
                minimum: -half,
                maximum: half - 1,
                mid: 0,
            }
        } else {
            Self {
                minimum: 0,
                maximum: (1i64 << dynamic_range) - 1,
                mid: half,
            }
        }
    }

    pub fn contains(&self, sample: i64) -> bool {
        sample >= self.minimum && sample <= self.maximum
    }
}

impl CodingParameters {
    pub fn sample_limits(&self, signed: bool) -> SampleLimits {
        SampleLimits::new(self.dynamic_range, signed)
    }

    /// The restricted code option set only applies to low dynamic ranges.
    pub fn restricted_id_bits(&self) -> bool {
        self.block_adaptive.restricted_code_options && self.dynamic_range <= 4
    }

    /// Checks every parameter against its range and against the cube geometry.
    pub fn validate(&self, info: &CubeInfo) -> Result<(), Ccsds123Error> {
        validate_geometry(info)?;
        self.validate_image_parameters(info)?;
        self.validate_predictor_parameters(info)?;
        match self.entropy_coder_type {
            EntropyCoderType::SampleAdaptive => self.validate_sample_adaptive_parameters(info),
            EntropyCoderType::BlockAdaptive => self.validate_block_adaptive_parameters(),
        }
    }

    fn validate_image_parameters(&self, info: &CubeInfo) -> Result<(), Ccsds123Error> {
        if !(MINIMUM_DYNAMIC_RANGE..=MAXIMUM_DYNAMIC_RANGE).contains(&self.dynamic_range) {
            return Err(Ccsds123Error::InvalidParameterDynamicRange);
        }
        match self.sample_encoding_order {
            SampleEncodingOrder::BandInterleaved => {
                if self.subframe_interleaving_depth < 1
                    || self.subframe_interleaving_depth > info.bands
                {
                    return Err(Ccsds123Error::InvalidParameterSubframeInterleavingDepth);
                }
            }
            SampleEncodingOrder::BandSequential => {
                if self.subframe_interleaving_depth >= MAXIMUM_DIMENSION {
                    return Err(Ccsds123Error::InvalidParameterSubframeInterleavingDepth);
                }
            }
        }
        if !(MINIMUM_OUTPUT_WORD_SIZE..=MAXIMUM_OUTPUT_WORD_SIZE).contains(&self.output_word_size) {
            return Err(Ccsds123Error::InvalidParameterOutputWordSize);
        }
        Ok(())
    }

    fn validate_predictor_parameters(&self, info: &CubeInfo) -> Result<(), Ccsds123Error> {
        let predictor = &self.predictor;
        if predictor.prediction_bands > MAXIMUM_PREDICTION_BANDS {
            return Err(Ccsds123Error::InvalidParameterPredictionBands);
        }
        if !(MINIMUM_WEIGHT_RESOLUTION..=MAXIMUM_WEIGHT_RESOLUTION)
            .contains(&predictor.weight_resolution)
        {
            return Err(Ccsds123Error::InvalidParameterWeightResolution);
        }
        let minimum_register_size = max(
            MINIMUM_REGISTER_SIZE,
            self.dynamic_range + predictor.weight_resolution + 2,
        );
        if predictor.register_size < minimum_register_size
            || predictor.register_size > MAXIMUM_REGISTER_SIZE
        {
            return Err(Ccsds123Error::InvalidParameterRegisterSize);
        }
        if !(MINIMUM_WEIGHT_UPDATE_INTERVAL..=MAXIMUM_WEIGHT_UPDATE_INTERVAL)
            .contains(&predictor.weight_update_interval)
        {
            return Err(Ccsds123Error::InvalidParameterWeightUpdateInterval);
        }
        if predictor.weight_update_initial_exponent < MINIMUM_WEIGHT_UPDATE_EXPONENT
            || predictor.weight_update_final_exponent > MAXIMUM_WEIGHT_UPDATE_EXPONENT
            || predictor.weight_update_initial_exponent > predictor.weight_update_final_exponent
        {
            return Err(Ccsds123Error::InvalidParameterWeightUpdateExponents);
        }

        match predictor.weight_init_method {
            WeightInitMethod::Default => {
                if predictor.weight_init_table_flag || predictor.weight_init_resolution != 0 {
                    return Err(Ccsds123Error::ContradictoryWeightInitialization);
                }
            }
            WeightInitMethod::Custom => {
                if predictor.weight_init_resolution < MINIMUM_WEIGHT_INIT_RESOLUTION
                    || predictor.weight_init_resolution > predictor.weight_resolution + 3
                {
                    return Err(Ccsds123Error::InvalidParameterWeightInitResolution);
                }
                let table = predictor
                    .weight_init_table
                    .as_ref()
                    .ok_or(Ccsds123Error::MissingWeightInitTable)?;
                validate_weight_init_table(predictor, table, info.bands)?;
            }
        }
        Ok(())
    }

    fn validate_sample_adaptive_parameters(&self, info: &CubeInfo) -> Result<(), Ccsds123Error> {
        let coder = &self.sample_adaptive;
        if !(MINIMUM_UNARY_LENGTH_LIMIT..=MAXIMUM_UNARY_LENGTH_LIMIT)
            .contains(&coder.unary_length_limit)
        {
            return Err(Ccsds123Error::InvalidParameterUnaryLengthLimit);
        }
        if !(MINIMUM_RESCALING_COUNTER_SIZE..=MAXIMUM_RESCALING_COUNTER_SIZE)
            .contains(&coder.rescaling_counter_size)
        {
            return Err(Ccsds123Error::InvalidParameterRescalingCounterSize);
        }
        if !(MINIMUM_INITIAL_COUNT_EXPONENT..=MAXIMUM_INITIAL_COUNT_EXPONENT)
            .contains(&coder.initial_count_exponent)
            || coder.initial_count_exponent >= coder.rescaling_counter_size
        {
            return Err(Ccsds123Error::InvalidParameterInitialCountExponent);
        }

        let maximum_k = self.dynamic_range - 2;
        let constant = coder.accumulator_init_constant;
        if constant > maximum_k && constant != ACCUMULATOR_TABLE_CONSTANT {
            return Err(Ccsds123Error::InvalidParameterAccumulatorInitConstant);
        }
        if coder.accumulator_init_table_flag && constant != ACCUMULATOR_TABLE_CONSTANT {
            return Err(Ccsds123Error::InvalidParameterAccumulatorInitTable);
        }
        if constant == ACCUMULATOR_TABLE_CONSTANT {
            let table = coder
                .accumulator_init_table
                .as_ref()
                .ok_or(Ccsds123Error::MissingAccumulatorInitTable)?;
            if table.len() != info.bands as usize || table.iter().any(|&k| k > maximum_k) {
                return Err(Ccsds123Error::InvalidParameterAccumulatorInitTable);
            }
        }
        Ok(())
    }

    fn validate_block_adaptive_parameters(&self) -> Result<(), Ccsds123Error> {
        validate_block_coder(
            self.block_adaptive.block_size,
            self.dynamic_range,
            self.block_adaptive.reference_sample_interval,
            self.block_adaptive.segment_size,
        )?;
        if self.block_adaptive.reference_samples {
            return Err(Ccsds123Error::ReferenceSamplesNotSupported);
        }
        Ok(())
    }
}

pub fn validate_geometry(info: &CubeInfo) -> Result<(), Ccsds123Error> {
    let dimension = MINIMUM_DIMENSION..=MAXIMUM_DIMENSION;
    if !dimension.contains(&info.bands) {
        return Err(Ccsds123Error::InvalidParameterBands);
    }
    if !dimension.contains(&info.rows) {
        return Err(Ccsds123Error::InvalidParameterRows);
    }
    if !dimension.contains(&info.columns) {
        return Err(Ccsds123Error::InvalidParameterColumns);
    }
    Ok(())
}

/// Range checks shared by the block-adaptive encoder and decoder.
pub fn validate_block_coder(
    block_size: u32,
    dynamic_range: u32,
    reference_sample_interval: u32,
    segment_size: u32,
) -> Result<(), Ccsds123Error> {
    if !BLOCK_SIZES.contains(&block_size) {
        return Err(Ccsds123Error::InvalidParameterBlockSize);
    }
    if !(MINIMUM_DYNAMIC_RANGE..=MAXIMUM_DYNAMIC_RANGE).contains(&dynamic_range) {
        return Err(Ccsds123Error::InvalidParameterDynamicRange);
    }
    if !(MINIMUM_REFERENCE_SAMPLE_INTERVAL..=MAXIMUM_REFERENCE_SAMPLE_INTERVAL)
        .contains(&reference_sample_interval)
    {
        return Err(Ccsds123Error::InvalidParameterReferenceSampleInterval);
    }
    if segment_size < 1 {
        return Err(Ccsds123Error::InvalidParameterSegmentSize);
    }
    Ok(())
}

fn validate_weight_init_table(
    predictor: &PredictorParameters,
    table: &[Vec<i32>],
    bands: u32,
) -> Result<(), Ccsds123Error> {
    if table.len() != bands as usize {
        return Err(Ccsds123Error::InvalidParameterWeightInitTable);
    }
    let half = 1i64 << (predictor.weight_init_resolution - 1);
    for (z, row) in table.iter().enumerate() {
        if row.len() != predictor.local_difference_count(z as u32) {
            return Err(Ccsds123Error::InvalidParameterWeightInitTable);
        }
        if row.iter().any(|&w| (w as i64) < -half || (w as i64) >= half) {
            return Err(Ccsds123Error::InvalidParameterWeightInitTable);
        }
    }
    Ok(())
}
