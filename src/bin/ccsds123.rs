//! ccsds123 CLI - lossless compression of hyperspectral image cubes.
//!
//! Compresses raw BSQ, BIL or BIP sample files with the CCSDS 123.0 predictor
//! and either the sample-adaptive or the block-adaptive entropy coder, and
//! restores them bit for bit.

use ccsds123_rs::options::Options;
use ccsds123_rs::raw_image::{
    ByteOrder, PixelOrder, RawLayout, SampleFormat, read_raw_cube, write_raw_cube,
};
use ccsds123_rs::{Ccsds123Decoder, Ccsds123Encoder, CodingParameters, EntropyCoderType};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::Level;

/// Lossless hyperspectral image compressor following CCSDS 123.0-B-1
#[derive(Parser)]
#[command(name = "ccsds123")]
#[command(version)]
#[command(about = "Lossless compressor for multispectral and hyperspectral images", long_about = None)]
#[command(after_help = "EXAMPLES:
    ccsds123 compress -i cube.raw -o cube.123 -g 224 512 680 2
    ccsds123 compress -i cube.raw -o cube.123 -g 224 512 680 2 --option-file options.txt
    ccsds123 decompress -i cube.123 -o cube.raw -p u16 -e little
    ccsds123 info -i cube.123

GEOMETRY:
    Z Y X TYPE [RGB], where TYPE is 1 (u8), 2 (u16) or 3 (i16). The optional
    fifth value is accepted for compatibility with older scripts and ignored.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print progress information
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print every header field and coder setting
    #[arg(long, global = true)]
    debug_mode: bool,

    /// Print the elapsed wall time
    #[arg(long, global = true)]
    time: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a raw image cube
    #[command(visible_alias = "c")]
    Compress {
        /// Raw image file
        #[arg(short, long)]
        input_image: PathBuf,

        /// Compressed output file
        #[arg(short, long)]
        output_file: PathBuf,

        /// Image geometry: bands, rows, columns, sample type and an ignored RGB flag
        #[arg(short, long, num_args = 4..=5, value_names = ["Z", "Y", "X", "TYPE", "RGB"], required = true)]
        geometry: Vec<u32>,

        /// Sample order of the raw file
        #[arg(short, long, default_value = "bsq", value_enum)]
        sample_order: SampleOrder,

        /// Byte order of the raw file
        #[arg(short, long, default_value = "big", value_enum)]
        endianess: Endianess,

        /// File with coding options
        #[arg(long)]
        option_file: Option<PathBuf>,

        /// Coding options, applied after the option file
        #[arg(long)]
        option_string: Option<String>,

        /// Require more bands than prediction bands
        #[arg(long)]
        pedantic: bool,
    },

    /// Decompress a compressed stream to a raw image cube
    #[command(visible_alias = "d")]
    Decompress {
        /// Compressed input file
        #[arg(short, long)]
        input_image: PathBuf,

        /// Raw output file
        #[arg(short, long)]
        output_file: PathBuf,

        /// Sample type of the raw file, derived from the header when omitted
        #[arg(short, long, value_enum)]
        pixel_format: Option<PixelFormat>,

        /// Sample order of the raw file
        #[arg(short, long, default_value = "bsq", value_enum)]
        sample_order: SampleOrder,

        /// Byte order of the raw file
        #[arg(short, long, default_value = "big", value_enum)]
        endianess: Endianess,

        /// File with initialization tables and segment size
        #[arg(long)]
        option_file: Option<PathBuf>,

        /// Initialization tables and segment size, applied after the option file
        #[arg(long)]
        option_string: Option<String>,
    },

    /// Display the header of a compressed stream
    #[command(visible_alias = "i")]
    Info {
        /// Compressed input file
        #[arg(short, long)]
        input_image: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SampleOrder {
    /// Band sequential
    Bsq,
    /// Band interleaved by line
    Bil,
    /// Band interleaved by pixel
    Bip,
}

impl From<SampleOrder> for PixelOrder {
    fn from(order: SampleOrder) -> Self {
        match order {
            SampleOrder::Bsq => PixelOrder::Bsq,
            SampleOrder::Bil => PixelOrder::Bil,
            SampleOrder::Bip => PixelOrder::Bip,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Endianess {
    Big,
    Little,
}

impl From<Endianess> for ByteOrder {
    fn from(endianess: Endianess) -> Self {
        match endianess {
            Endianess::Big => ByteOrder::BigEndian,
            Endianess::Little => ByteOrder::LittleEndian,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PixelFormat {
    U8,
    U16,
    I16,
}

impl From<PixelFormat> for SampleFormat {
    fn from(format: PixelFormat) -> Self {
        match format {
            PixelFormat::U8 => SampleFormat::U8,
            PixelFormat::U16 => SampleFormat::U16,
            PixelFormat::I16 => SampleFormat::I16,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.debug_mode {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };
    ccsds123_rs::log::init_subscriber(level);

    let start = Instant::now();
    let result = match cli.command {
        Commands::Compress {
            input_image,
            output_file,
            geometry,
            sample_order,
            endianess,
            option_file,
            option_string,
            pedantic,
        } => compress_image(
            &input_image,
            &output_file,
            &geometry,
            RawLayoutArgs {
                sample_order,
                endianess,
            },
            read_option_texts(option_file.as_deref(), option_string),
            pedantic,
        ),
        Commands::Decompress {
            input_image,
            output_file,
            pixel_format,
            sample_order,
            endianess,
            option_file,
            option_string,
        } => decompress_image(
            &input_image,
            &output_file,
            pixel_format,
            RawLayoutArgs {
                sample_order,
                endianess,
            },
            read_option_texts(option_file.as_deref(), option_string),
        ),
        Commands::Info { input_image } => show_info(&input_image),
    };

    if cli.time {
        eprintln!("Elapsed time: {:.3} s", start.elapsed().as_secs_f64());
    }
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(-1);
    }
}

struct RawLayoutArgs {
    sample_order: SampleOrder,
    endianess: Endianess,
}

impl RawLayoutArgs {
    fn layout(&self, format: SampleFormat) -> RawLayout {
        RawLayout::new(format, self.endianess.into(), self.sample_order.into())
    }
}

/// Option texts in the order they are layered: the option file first, then
/// the option string.
fn read_option_texts(
    option_file: Option<&Path>,
    option_string: Option<String>,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut texts = Vec::new();
    if let Some(path) = option_file {
        texts.push(fs::read_to_string(path)?);
    }
    texts.extend(option_string);
    Ok(texts)
}

/// Splits `Z Y X TYPE [RGB]` into the cube size and sample format.
fn parse_geometry(
    geometry: &[u32],
) -> Result<(u32, u32, u32, SampleFormat), Box<dyn std::error::Error>> {
    let &[bands, rows, columns, sample_type, ..] = geometry else {
        return Err("geometry needs four or five values: Z Y X TYPE [RGB]".into());
    };
    let format = u8::try_from(sample_type)
        .ok()
        .and_then(|value| SampleFormat::try_from(value).ok())
        .ok_or("sample type must be 1 (u8), 2 (u16) or 3 (i16)")?;
    Ok((bands, rows, columns, format))
}

fn compress_image(
    input: &Path,
    output: &Path,
    geometry: &[u32],
    raw: RawLayoutArgs,
    option_texts: Result<Vec<String>, Box<dyn std::error::Error>>,
    pedantic: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = Options::default();
    for text in option_texts? {
        options.merge(Options::parse(&text)?);
    }
    let (bands, rows, columns, format) = parse_geometry(geometry)?;

    let data = fs::read(input)?;
    let cube = read_raw_cube(&data, bands, rows, columns, raw.layout(format))?;
    let info = cube.info();

    let mut parameters = CodingParameters::default();
    options.apply(&info, &mut parameters)?;

    let mut encoder = Ccsds123Encoder::new();
    encoder.set_cube_info(info)?;
    encoder.set_coding_parameters(parameters)?;
    encoder.set_pedantic(pedantic);
    let compressed = encoder.encode_cube(&cube)?;
    fs::write(output, &compressed)?;

    println!(
        "✓ Compressed {}x{}x{} cube ({} bytes) to {} bytes in {:?}",
        bands,
        rows,
        columns,
        data.len(),
        compressed.len(),
        output
    );
    Ok(())
}

fn decompress_image(
    input: &Path,
    output: &Path,
    pixel_format: Option<PixelFormat>,
    raw: RawLayoutArgs,
    option_texts: Result<Vec<String>, Box<dyn std::error::Error>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let mut decoder = Ccsds123Decoder::new(data.as_slice());
    for text in option_texts? {
        decoder.set_options(&text)?;
    }
    let info = decoder.read_header()?;
    let cube = decoder.decode_cube()?;

    let format = pixel_format.map(SampleFormat::from).unwrap_or_else(|| {
        SampleFormat::for_samples(info.signed, decoder.coding_parameters().dynamic_range)
    });
    let raw_data = write_raw_cube(&cube, raw.layout(format))?;
    fs::write(output, &raw_data)?;

    println!(
        "✓ Decompressed {}x{}x{} cube ({} bytes) to {:?}",
        info.bands,
        info.rows,
        info.columns,
        raw_data.len(),
        output
    );
    Ok(())
}

fn show_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)?;
    let mut decoder = Ccsds123Decoder::new(data.as_slice());
    let info = decoder.read_header()?;
    let parameters = decoder.coding_parameters();
    let predictor = &parameters.predictor;

    println!("File: {:?}", input);
    println!("Size: {} bytes", data.len());
    println!();
    println!("Image:");
    println!("  Bands x rows x columns: {} x {} x {}", info.bands, info.rows, info.columns);
    println!("  Signed samples: {}", info.signed);
    println!("  Dynamic range: {} bits", parameters.dynamic_range);
    println!("  Sample encoding order: {:?}", parameters.sample_encoding_order);
    println!("  Subframe interleaving depth: {}", parameters.subframe_interleaving_depth);
    println!("  Output word size: {} bytes", parameters.output_word_size);
    println!();
    println!("Predictor:");
    println!("  Prediction bands: {}", predictor.prediction_bands);
    println!("  Prediction mode: {:?}", predictor.prediction_mode);
    println!("  Local sum mode: {:?}", predictor.local_sum_mode);
    println!("  Register size: {}", predictor.register_size);
    println!("  Weight resolution: {}", predictor.weight_resolution);
    println!("  Weight update interval: 2^{}", predictor.weight_update_interval);
    println!(
        "  Weight update exponents: {} to {}",
        predictor.weight_update_initial_exponent, predictor.weight_update_final_exponent
    );
    println!(
        "  Weight initialization: {:?} (table in header: {}, resolution {})",
        predictor.weight_init_method, predictor.weight_init_table_flag, predictor.weight_init_resolution
    );
    println!();
    match parameters.entropy_coder_type {
        EntropyCoderType::SampleAdaptive => {
            let coder = &parameters.sample_adaptive;
            println!("Sample-adaptive coder:");
            println!("  Unary length limit: {}", coder.unary_length_limit);
            println!("  Rescaling counter size: {}", coder.rescaling_counter_size);
            println!("  Initial count exponent: {}", coder.initial_count_exponent);
            println!(
                "  Accumulator initialization constant: {} (table in header: {})",
                coder.accumulator_init_constant, coder.accumulator_init_table_flag
            );
        }
        EntropyCoderType::BlockAdaptive => {
            let coder = &parameters.block_adaptive;
            println!("Block-adaptive coder:");
            println!("  Block size: {}", coder.block_size);
            println!("  Reference sample interval: {}", coder.reference_sample_interval);
            println!("  Restricted code options: {}", coder.restricted_code_options);
        }
    }
    Ok(())
}
