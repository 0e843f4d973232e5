use thiserror::Error;

/// Broad classification of a [`Ccsds123Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A parameter is out of range, contradictory or unsupported.
    Configuration,
    /// The underlying byte source or sink failed.
    Io,
    /// The compressed stream is truncated or malformed.
    StreamFormat,
    /// A sample does not fit the requested sample type.
    Precision,
}

#[derive(Error, Debug)]
pub enum Ccsds123Error {
    // Geometry and global parameters
    #[error("Invalid parameter band count")]
    InvalidParameterBands,
    #[error("Invalid parameter row count")]
    InvalidParameterRows,
    #[error("Invalid parameter column count")]
    InvalidParameterColumns,
    #[error("Invalid parameter dynamic range")]
    InvalidParameterDynamicRange,
    #[error("Invalid parameter sample encoding order")]
    InvalidParameterSampleEncodingOrder,
    #[error("Invalid parameter subframe interleaving depth")]
    InvalidParameterSubframeInterleavingDepth,
    #[error("Invalid parameter output word size")]
    InvalidParameterOutputWordSize,
    #[error("Invalid parameter entropy coder type")]
    InvalidParameterEntropyCoderType,

    // Predictor parameters
    #[error("Invalid parameter number of prediction bands")]
    InvalidParameterPredictionBands,
    #[error("Invalid parameter prediction mode")]
    InvalidParameterPredictionMode,
    #[error("Invalid parameter local sum mode")]
    InvalidParameterLocalSumMode,
    #[error("Invalid parameter register size")]
    InvalidParameterRegisterSize,
    #[error("Invalid parameter weight component resolution")]
    InvalidParameterWeightResolution,
    #[error("Invalid parameter weight update change interval")]
    InvalidParameterWeightUpdateInterval,
    #[error("Invalid parameter weight update scaling exponents")]
    InvalidParameterWeightUpdateExponents,
    #[error("Invalid parameter weight initialization method")]
    InvalidParameterWeightInitMethod,
    #[error("Invalid parameter weight initialization resolution")]
    InvalidParameterWeightInitResolution,
    #[error("Invalid parameter weight initialization table")]
    InvalidParameterWeightInitTable,
    #[error("Default weight initialization cannot carry a table or a resolution")]
    ContradictoryWeightInitialization,
    #[error("Custom weight initialization requires a weight table")]
    MissingWeightInitTable,

    // Sample-adaptive entropy coder parameters
    #[error("Invalid parameter unary length limit")]
    InvalidParameterUnaryLengthLimit,
    #[error("Invalid parameter rescaling counter size")]
    InvalidParameterRescalingCounterSize,
    #[error("Invalid parameter initial count exponent")]
    InvalidParameterInitialCountExponent,
    #[error("Invalid parameter accumulator initialization constant")]
    InvalidParameterAccumulatorInitConstant,
    #[error("Invalid parameter accumulator initialization table")]
    InvalidParameterAccumulatorInitTable,
    #[error("Accumulator initialization constant 15 requires an accumulator table")]
    MissingAccumulatorInitTable,

    // Block-adaptive entropy coder parameters
    #[error("Invalid parameter block size")]
    InvalidParameterBlockSize,
    #[error("Invalid parameter reference sample interval")]
    InvalidParameterReferenceSampleInterval,
    #[error("Invalid parameter segment size")]
    InvalidParameterSegmentSize,
    #[error("Invalid parameter restricted code options flag")]
    InvalidParameterRestrictedCodeOptions,
    #[error("Reference sample insertion is not yet supported")]
    ReferenceSamplesNotSupported,

    // Option text
    #[error("Unknown option {0}")]
    UnknownOption(String),
    #[error("Invalid value {value:?} for option {key}")]
    InvalidOptionValue { key: String, value: String },
    #[error("Pedantic mode requires more bands than prediction bands")]
    PedanticPredictionBands,

    // Logic errors
    #[error("Invalid operation")]
    InvalidOperation,
    #[error("Invalid argument")]
    InvalidArgument,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Stream format
    #[error("Unexpected end of stream")]
    EndOfStream,
    #[error("Unary codeword exceeds the length limit")]
    UnaryLengthExceeded,
    #[error("Invalid header")]
    InvalidHeader,

    #[error("Sample value out of range for the sample type")]
    SampleOutOfRange,
}

impl Ccsds123Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) => ErrorKind::Io,
            Self::EndOfStream | Self::UnaryLengthExceeded | Self::InvalidHeader => {
                ErrorKind::StreamFormat
            }
            Self::SampleOutOfRange => ErrorKind::Precision,
            _ => ErrorKind::Configuration,
        }
    }
}
