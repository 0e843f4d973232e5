// Geometry limits. Every dimension is coded on 16 bits where 0 stands for 2^16.
pub const MINIMUM_DIMENSION: u32 = 1;
pub const MAXIMUM_DIMENSION: u32 = 1 << 16;

pub const MINIMUM_DYNAMIC_RANGE: u32 = 2;
pub const MAXIMUM_DYNAMIC_RANGE: u32 = 16;
pub const MINIMUM_OUTPUT_WORD_SIZE: u32 = 1;
pub const MAXIMUM_OUTPUT_WORD_SIZE: u32 = 8;

// Predictor limits as defined in CCSDS 123.0-B-1, section 4.
pub const MAXIMUM_PREDICTION_BANDS: u32 = 15;
pub const MINIMUM_REGISTER_SIZE: u32 = 32;
pub const MAXIMUM_REGISTER_SIZE: u32 = 64;
pub const MINIMUM_WEIGHT_RESOLUTION: u32 = 4;
pub const MAXIMUM_WEIGHT_RESOLUTION: u32 = 19;
pub const MINIMUM_WEIGHT_UPDATE_INTERVAL: u32 = 4;
pub const MAXIMUM_WEIGHT_UPDATE_INTERVAL: u32 = 11;
pub const MINIMUM_WEIGHT_UPDATE_EXPONENT: i32 = -6;
pub const MAXIMUM_WEIGHT_UPDATE_EXPONENT: i32 = 9;
pub const MINIMUM_WEIGHT_INIT_RESOLUTION: u32 = 3;

// Sample-adaptive entropy coder limits, CCSDS 123.0-B-1 section 5.4.3.2.
pub const MINIMUM_UNARY_LENGTH_LIMIT: u32 = 8;
pub const MAXIMUM_UNARY_LENGTH_LIMIT: u32 = 32;
pub const MINIMUM_RESCALING_COUNTER_SIZE: u32 = 4;
pub const MAXIMUM_RESCALING_COUNTER_SIZE: u32 = 9;
pub const MINIMUM_INITIAL_COUNT_EXPONENT: u32 = 1;
pub const MAXIMUM_INITIAL_COUNT_EXPONENT: u32 = 8;

/// Accumulator initialization constant that selects the per-band table.
pub const ACCUMULATOR_TABLE_CONSTANT: u32 = 15;

// Block-adaptive entropy coder limits, CCSDS 121.0-B-2.
pub const BLOCK_SIZES: [u32; 4] = [8, 16, 32, 64];
pub const MINIMUM_REFERENCE_SAMPLE_INTERVAL: u32 = 1;
pub const MAXIMUM_REFERENCE_SAMPLE_INTERVAL: u32 = 4096;
pub const DEFAULT_SEGMENT_SIZE: u32 = 64;

/// Unary value that marks a zero-block run reaching the end of a segment.
pub const ROS_CODE: u32 = 4;

/// Largest split position accepted by the Rice codec.
pub const MAXIMUM_SPLIT_POSITION: u32 = 31;

// Documented defaults for every coding parameter.
pub const DEFAULT_DYNAMIC_RANGE: u32 = 16;
pub const DEFAULT_OUTPUT_WORD_SIZE: u32 = 4;
pub const DEFAULT_PREDICTION_BANDS: u32 = 15;
pub const DEFAULT_REGISTER_SIZE: u32 = 32;
pub const DEFAULT_WEIGHT_RESOLUTION: u32 = 13;
pub const DEFAULT_WEIGHT_UPDATE_INTERVAL: u32 = 6;
pub const DEFAULT_WEIGHT_UPDATE_INITIAL_EXPONENT: i32 = -1;
pub const DEFAULT_WEIGHT_UPDATE_FINAL_EXPONENT: i32 = 3;
pub const DEFAULT_UNARY_LENGTH_LIMIT: u32 = 16;
pub const DEFAULT_RESCALING_COUNTER_SIZE: u32 = 6;
pub const DEFAULT_INITIAL_COUNT_EXPONENT: u32 = 1;
pub const DEFAULT_ACCUMULATOR_INIT_CONSTANT: u32 = 5;
pub const DEFAULT_BLOCK_SIZE: u32 = 16;
pub const DEFAULT_REFERENCE_SAMPLE_INTERVAL: u32 = 1;
