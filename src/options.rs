//! Coding options given as text.
//!
//! Options use the properties syntax: one `KEY = value` entry per line (`:` or
//! plain whitespace also separate key and value), `#` and `!` start comment
//! lines and a trailing backslash continues an entry on the next line. Every
//! value is an integer, except the two initialization tables which are lists
//! of integers separated by brackets, commas or spaces.

use crate::coding_parameters::CodingParameters;
use crate::error::Ccsds123Error;
use crate::{
    CubeInfo, EntropyCoderType, LocalSumMode, PredictionMode, SampleEncodingOrder,
    WeightInitMethod,
};
use std::collections::BTreeMap;
use std::convert::TryFrom;
use tracing::debug;

pub const DYNAMIC_RANGE: &str = "DYNAMIC_RANGE";
pub const SAMPLE_ENCODING_ORDER: &str = "SAMPLE_ENCODING_ORDER";
pub const SUBFRAME_INTERLEAVING_DEPTH: &str = "SUBFRAME_INTERLEAVING_DEPTH";
pub const OUTPUT_WORD_SIZE: &str = "OUTPUT_WORD_SIZE";
pub const ENTROPY_CODER_TYPE: &str = "ENTROPY_CODER_TYPE";
pub const NUMBER_PREDICTION_BANDS: &str = "NUMBER_PREDICTION_BANDS";
pub const PREDICTION_MODE: &str = "PREDICTION_MODE";
pub const LOCAL_SUM_MODE: &str = "LOCAL_SUM_MODE";
pub const REGISTER_SIZE: &str = "REGISTER_SIZE";
pub const WEIGHT_COMPONENT_RESOLUTION: &str = "WEIGHT_COMPONENT_RESOLUTION";
pub const WEIGHT_UPDATE_SECI: &str = "WEIGHT_UPDATE_SECI";
pub const WEIGHT_UPDATE_SE: &str = "WEIGHT_UPDATE_SE";
pub const WEIGHT_UPDATE_SEFP: &str = "WEIGHT_UPDATE_SEFP";
pub const WEIGHT_INITIALIZATION_METHOD: &str = "WEIGHT_INITIALIZATION_METHOD";
pub const WEIGHT_INITIALIZATION_TF: &str = "WEIGHT_INITIALIZATION_TF";
pub const WEIGHT_INITIALIZATION_RESOLUTION: &str = "WEIGHT_INITIALIZATION_RESOLUTION";
pub const WEIGHT_INITIALIZATION_TABLE: &str = "WEIGHT_INITIALIZATION_TABLE";
pub const UNARY_LENGTH_LIMIT: &str = "UNARY_LENGTH_LIMIT";
pub const RESCALING_COUNTER_SIZE: &str = "RESCALING_COUNTER_SIZE";
pub const INITIAL_COUNT_EXPONENT: &str = "INITIAL_COUNT_EXPONENT";
pub const ACCUMULATOR_INITIALIZATION_TF: &str = "ACCUMULATOR_INITIALIZATION_TF";
pub const ACCUMULATOR_INITIALIZATION_CONSTANT: &str = "ACCUMULATOR_INITIALIZATION_CONSTANT";
pub const ACCUMULATOR_INITIALIZATION_TABLE: &str = "ACCUMULATOR_INITIALIZATION_TABLE";
pub const BLOCK_SIZE: &str = "BLOCK_SIZE";
pub const REFERENCE_SAMPLE_INTERVAL: &str = "REFERENCE_SAMPLE_INTERVAL";
pub const RESTRICTED_SET_CODE_OPTIONS: &str = "RESTRICTED_SET_CODE_OPTIONS";
pub const SEGMENT_SIZE: &str = "SEGMENT_SIZE";

const KNOWN_KEYS: [&str; 27] = [
    DYNAMIC_RANGE,
    SAMPLE_ENCODING_ORDER,
    SUBFRAME_INTERLEAVING_DEPTH,
    OUTPUT_WORD_SIZE,
    ENTROPY_CODER_TYPE,
    NUMBER_PREDICTION_BANDS,
    PREDICTION_MODE,
    LOCAL_SUM_MODE,
    REGISTER_SIZE,
    WEIGHT_COMPONENT_RESOLUTION,
    WEIGHT_UPDATE_SECI,
    WEIGHT_UPDATE_SE,
    WEIGHT_UPDATE_SEFP,
    WEIGHT_INITIALIZATION_METHOD,
    WEIGHT_INITIALIZATION_TF,
    WEIGHT_INITIALIZATION_RESOLUTION,
    WEIGHT_INITIALIZATION_TABLE,
    UNARY_LENGTH_LIMIT,
    RESCALING_COUNTER_SIZE,
    INITIAL_COUNT_EXPONENT,
    ACCUMULATOR_INITIALIZATION_TF,
    ACCUMULATOR_INITIALIZATION_CONSTANT,
    ACCUMULATOR_INITIALIZATION_TABLE,
    BLOCK_SIZE,
    REFERENCE_SAMPLE_INTERVAL,
    RESTRICTED_SET_CODE_OPTIONS,
    SEGMENT_SIZE,
];

/// Joins continued lines and drops blank and comment lines.
fn logical_lines(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut continuing = false;

    for raw in text.lines() {
        let line = raw.trim_start();
        if !continuing && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }
        let backslashes = line.chars().rev().take_while(|&c| c == '\\').count();
        if backslashes % 2 == 1 {
            current.push_str(&line[..line.len() - 1]);
            continuing = true;
        } else {
            current.push_str(line);
            lines.push(std::mem::take(&mut current));
            continuing = false;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn split_entry(line: &str) -> (&str, &str) {
    let key_end = line
        .find(|c: char| c == '=' || c == ':' || c.is_whitespace())
        .unwrap_or(line.len());
    let (key, rest) = line.split_at(key_end);
    let rest = rest.trim_start();
    let value = rest.strip_prefix(['=', ':']).unwrap_or(rest);
    (key, value.trim())
}

fn table_tokens(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(|c: char| c == '[' || c == ']' || c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
}

/// Options parsed from one or more option texts. Later entries override
/// earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    entries: BTreeMap<String, String>,
}

impl Options {
    pub fn parse(text: &str) -> Result<Self, Ccsds123Error> {
        let mut entries = BTreeMap::new();
        for line in logical_lines(text) {
            let (key, value) = split_entry(&line);
            if !KNOWN_KEYS.contains(&key) {
                return Err(Ccsds123Error::UnknownOption(key.to_string()));
            }
            debug!(key, value, "option");
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(Self { entries })
    }

    /// Layers `other` on top of these options.
    pub fn merge(&mut self, other: Options) {
        self.entries.extend(other.entries);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn invalid(key: &str, value: &str) -> Ccsds123Error {
        Ccsds123Error::InvalidOptionValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    fn signed(&self, key: &str) -> Result<Option<i32>, Ccsds123Error> {
        self.get(key)
            .map(|value| value.parse::<i32>().map_err(|_| Self::invalid(key, value)))
            .transpose()
    }

    fn unsigned(&self, key: &str) -> Result<Option<u32>, Ccsds123Error> {
        self.get(key)
            .map(|value| value.parse::<u32>().map_err(|_| Self::invalid(key, value)))
            .transpose()
    }

    fn flag(&self, key: &str) -> Result<Option<bool>, Ccsds123Error> {
        match self.unsigned(key)? {
            None => Ok(None),
            Some(0) => Ok(Some(false)),
            Some(1) => Ok(Some(true)),
            Some(_) => Err(Self::invalid(key, self.get(key).unwrap_or_default())),
        }
    }

    fn enumeration<T: TryFrom<u8>>(
        &self,
        key: &str,
        error: Ccsds123Error,
    ) -> Result<Option<T>, Ccsds123Error> {
        match self.unsigned(key)? {
            None => Ok(None),
            Some(value) => u8::try_from(value)
                .ok()
                .and_then(|value| T::try_from(value).ok())
                .map(Some)
                .ok_or(error),
        }
    }

    /// Segment size of the block-adaptive coder, which the header does not carry.
    pub fn segment_size(&self) -> Result<Option<u32>, Ccsds123Error> {
        self.unsigned(SEGMENT_SIZE)
    }

    /// Overrides every field of `parameters` named by these options.
    pub fn apply(
        &self,
        info: &CubeInfo,
        parameters: &mut CodingParameters,
    ) -> Result<(), Ccsds123Error> {
        macro_rules! set {
            ($field:expr, $value:expr) => {
                if let Some(value) = $value {
                    $field = value;
                }
            };
        }

        set!(parameters.dynamic_range, self.unsigned(DYNAMIC_RANGE)?);
        set!(
            parameters.sample_encoding_order,
            self.enumeration::<SampleEncodingOrder>(
                SAMPLE_ENCODING_ORDER,
                Ccsds123Error::InvalidParameterSampleEncodingOrder
            )?
        );
        set!(
            parameters.subframe_interleaving_depth,
            self.unsigned(SUBFRAME_INTERLEAVING_DEPTH)?
        );
        set!(parameters.output_word_size, self.unsigned(OUTPUT_WORD_SIZE)?);
        set!(
            parameters.entropy_coder_type,
            self.enumeration::<EntropyCoderType>(
                ENTROPY_CODER_TYPE,
                Ccsds123Error::InvalidParameterEntropyCoderType
            )?
        );

        let predictor = &mut parameters.predictor;
        set!(predictor.prediction_bands, self.unsigned(NUMBER_PREDICTION_BANDS)?);
        set!(
            predictor.prediction_mode,
            self.enumeration::<PredictionMode>(
                PREDICTION_MODE,
                Ccsds123Error::InvalidParameterPredictionMode
            )?
        );
        set!(
            predictor.local_sum_mode,
            self.enumeration::<LocalSumMode>(LOCAL_SUM_MODE, Ccsds123Error::InvalidParameterLocalSumMode)?
        );
        set!(predictor.register_size, self.unsigned(REGISTER_SIZE)?);
        set!(predictor.weight_resolution, self.unsigned(WEIGHT_COMPONENT_RESOLUTION)?);
        set!(predictor.weight_update_interval, self.unsigned(WEIGHT_UPDATE_SECI)?);
        set!(predictor.weight_update_initial_exponent, self.signed(WEIGHT_UPDATE_SE)?);
        set!(predictor.weight_update_final_exponent, self.signed(WEIGHT_UPDATE_SEFP)?);
        set!(
            predictor.weight_init_method,
            self.enumeration::<WeightInitMethod>(
                WEIGHT_INITIALIZATION_METHOD,
                Ccsds123Error::InvalidParameterWeightInitMethod
            )?
        );
        set!(predictor.weight_init_table_flag, self.flag(WEIGHT_INITIALIZATION_TF)?);
        set!(
            predictor.weight_init_resolution,
            self.unsigned(WEIGHT_INITIALIZATION_RESOLUTION)?
        );

        let coder = &mut parameters.sample_adaptive;
        set!(coder.unary_length_limit, self.unsigned(UNARY_LENGTH_LIMIT)?);
        set!(coder.rescaling_counter_size, self.unsigned(RESCALING_COUNTER_SIZE)?);
        set!(coder.initial_count_exponent, self.unsigned(INITIAL_COUNT_EXPONENT)?);
        set!(coder.accumulator_init_table_flag, self.flag(ACCUMULATOR_INITIALIZATION_TF)?);
        set!(
            coder.accumulator_init_constant,
            self.unsigned(ACCUMULATOR_INITIALIZATION_CONSTANT)?
        );

        let coder = &mut parameters.block_adaptive;
        set!(coder.block_size, self.unsigned(BLOCK_SIZE)?);
        set!(coder.reference_sample_interval, self.unsigned(REFERENCE_SAMPLE_INTERVAL)?);
        set!(coder.restricted_code_options, self.flag(RESTRICTED_SET_CODE_OPTIONS)?);
        set!(coder.segment_size, self.segment_size()?);

        self.apply_tables(info, parameters)
    }

    /// Fills the initialization tables named by these options. The weight
    /// table is split into rows using the prediction settings already in
    /// `parameters`.
    pub fn apply_tables(
        &self,
        info: &CubeInfo,
        parameters: &mut CodingParameters,
    ) -> Result<(), Ccsds123Error> {
        if let Some(value) = self.get(WEIGHT_INITIALIZATION_TABLE) {
            parameters.predictor.weight_init_table =
                Some(self.weight_table(value, info, parameters)?);
        }
        if let Some(value) = self.get(ACCUMULATOR_INITIALIZATION_TABLE) {
            let table = table_tokens(value)
                .map(|token| {
                    token
                        .parse::<u32>()
                        .map_err(|_| Self::invalid(ACCUMULATOR_INITIALIZATION_TABLE, token))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if table.len() != info.bands as usize {
                return Err(Ccsds123Error::InvalidParameterAccumulatorInitTable);
            }
            parameters.sample_adaptive.accumulator_init_table = Some(table);
        }
        Ok(())
    }

    fn weight_table(
        &self,
        value: &str,
        info: &CubeInfo,
        parameters: &CodingParameters,
    ) -> Result<Vec<Vec<i32>>, Ccsds123Error> {
        let mut tokens = table_tokens(value);
        let mut table = Vec::with_capacity(info.bands as usize);
        for z in 0..info.bands {
            let count = parameters.predictor.local_difference_count(z);
            let mut row = Vec::with_capacity(count);
            for _ in 0..count {
                let token = tokens
                    .next()
                    .ok_or(Ccsds123Error::InvalidParameterWeightInitTable)?;
                row.push(
                    token
                        .parse::<i32>()
                        .map_err(|_| Self::invalid(WEIGHT_INITIALIZATION_TABLE, token))?,
                );
            }
            table.push(row);
        }
        if tokens.next().is_some() {
            return Err(Ccsds123Error::InvalidParameterWeightInitTable);
        }
        Ok(table)
    }
}

/// Parses option text into parameters for a cube, starting from the defaults.
pub fn parse_options(text: &str, info: &CubeInfo) -> Result<CodingParameters, Ccsds123Error> {
    let mut parameters = CodingParameters::default();
    Options::parse(text)?.apply(info, &mut parameters)?;
    Ok(parameters)
}
