//! CCSDS 121.0 adaptive block coder.
//!
//! Residuals are grouped into blocks of J samples. Each block is sent with the
//! cheapest of four code options: a zero block (runs of all-zero blocks are
//! merged into one codeword), the second extension (pairs of samples folded
//! into one unary codeword), a sample split at position k, or the raw samples.
//! Blocks are counted modulo the segment size and the reference sample
//! interval; a pending zero-block run is always closed at either boundary,
//! with the remainder-of-segment code when the run is longer than four blocks.

use super::rice::{
    CodeOptionSet, find_best_coding_option_rice, mask_block_bits, rice_code_block,
    rice_decode_block,
};
use super::unary::{read_unary, write_unary};
use super::{EntropyDecoder, EntropyEncoder};
use crate::bit_io::{BitReader, BitWriter};
use crate::coding_parameters::{CodingParameters, validate_block_coder};
use crate::constants::ROS_CODE;
use crate::error::Ccsds123Error;
use std::io::{Read, Write};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodingOption {
    ZeroBlock,
    SecondExtension,
    SampleSplit(u32),
    Backup,
}

/// Settings of a block coder instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCoderConfig {
    pub block_size: u32,
    pub dynamic_range: u32,
    pub reference_sample_interval: u32,
    pub segment_size: u32,
    pub restricted_id_bits: bool,
    pub reference_samples: bool,
}

impl BlockCoderConfig {
    pub fn from_parameters(parameters: &CodingParameters) -> Self {
        Self {
            block_size: parameters.block_adaptive.block_size,
            dynamic_range: parameters.dynamic_range,
            reference_sample_interval: parameters.block_adaptive.reference_sample_interval,
            segment_size: parameters.block_adaptive.segment_size,
            restricted_id_bits: parameters.restricted_id_bits(),
            reference_samples: parameters.block_adaptive.reference_samples,
        }
    }

    fn validate(&self) -> Result<(), Ccsds123Error> {
        validate_block_coder(
            self.block_size,
            self.dynamic_range,
            self.reference_sample_interval,
            self.segment_size,
        )?;
        if self.reference_samples {
            return Err(Ccsds123Error::ReferenceSamplesNotSupported);
        }
        Ok(())
    }
}

/// Position of the current block inside the reference interval and the segment.
#[derive(Debug, Clone, Copy)]
struct BlockCounter {
    reference_sample_interval: u32,
    segment_size: u32,
    reference_offset: u32,
    segment_offset: u32,
}

impl BlockCounter {
    fn new(reference_sample_interval: u32, segment_size: u32) -> Self {
        Self {
            reference_sample_interval,
            segment_size,
            reference_offset: 0,
            segment_offset: 0,
        }
    }

    fn increment(&mut self) {
        self.reference_offset = (self.reference_offset + 1) % self.reference_sample_interval;
        self.segment_offset = (self.segment_offset + 1) % self.segment_size;
    }

    fn at_boundary(&self) -> bool {
        self.reference_offset == 0 || self.segment_offset == 0
    }

    /// Blocks left up to the nearer boundary, the current one included.
    fn remaining_blocks(&self) -> u32 {
        let reference = self.reference_sample_interval - self.reference_offset;
        let segment = self.segment_size - self.segment_offset;
        reference.min(segment)
    }
}

/// Second extension codeword of every sample pair. A zero is prepended to an
/// odd length block.
fn second_extension_transform(block: &[u32], codewords: &mut Vec<u64>) {
    codewords.clear();
    let offset = block.len() % 2;
    if offset == 1 {
        codewords.push(fold_pair(0, block[0] as u64));
    }
    for pair in block[offset..].chunks_exact(2) {
        codewords.push(fold_pair(pair[0] as u64, pair[1] as u64));
    }
}

fn fold_pair(first: u64, second: u64) -> u64 {
    let sum = first + second;
    sum * (sum + 1) / 2 + second
}

fn write_id<W: Write>(
    writer: &mut BitWriter<W>,
    options: &CodeOptionSet,
    option: CodingOption,
) -> Result<(), Ccsds123Error> {
    match option {
        CodingOption::ZeroBlock => writer.write_bits(options.id_bits + 1, 0),
        CodingOption::SecondExtension => writer.write_bits(options.id_bits + 1, 1),
        CodingOption::Backup => writer.write_bits(options.id_bits, options.backup_option),
        CodingOption::SampleSplit(k) => writer.write_bits(options.id_bits, k + 1),
    }
}

fn read_id<R: Read>(
    reader: &mut BitReader<R>,
    options: &CodeOptionSet,
) -> Result<CodingOption, Ccsds123Error> {
    let id = reader.read_bits(options.id_bits)?;
    Ok(if id == 0 {
        if reader.read_bit()? {
            CodingOption::SecondExtension
        } else {
            CodingOption::ZeroBlock
        }
    } else if id == options.backup_option {
        CodingOption::Backup
    } else {
        CodingOption::SampleSplit(id - 1)
    })
}

pub struct BlockAdaptiveEncoder {
    config: BlockCoderConfig,
    options: CodeOptionSet,
    counter: BlockCounter,
    zero_block_count: u32,
    // Samples waiting for a full block
    pending: Vec<u32>,
    pending_count: usize,
    masked: Vec<u32>,
    codewords: Vec<u64>,
    blocks_coded: u64,
}

impl BlockAdaptiveEncoder {
    pub fn new(config: BlockCoderConfig) -> Result<Self, Ccsds123Error> {
        config.validate()?;
        let options = CodeOptionSet::new(config.dynamic_range, config.restricted_id_bits);
        debug!(
            block_size = config.block_size,
            id_bits = options.id_bits,
            reference_sample_interval = config.reference_sample_interval,
            segment_size = config.segment_size,
            "block-adaptive encoder"
        );
        let block_size = config.block_size as usize;
        Ok(Self {
            config,
            options,
            counter: BlockCounter::new(config.reference_sample_interval, config.segment_size),
            zero_block_count: 0,
            pending: vec![0; block_size],
            pending_count: 0,
            masked: vec![0; block_size],
            codewords: Vec::with_capacity(block_size / 2 + 1),
            blocks_coded: 0,
        })
    }

    pub fn from_parameters(parameters: &CodingParameters) -> Result<Self, Ccsds123Error> {
        Self::new(BlockCoderConfig::from_parameters(parameters))
    }

    /// Picks the option with the fewest bits, identifier included. Ties keep
    /// the earlier candidate in the order backup, second extension, split.
    pub fn select_coding_option(&mut self, block: &[u32]) -> CodingOption {
        let id_bits = self.options.id_bits as u64;
        let block_size = block.len() as u64;

        let total: u64 = block.iter().map(|&s| s as u64).sum();
        if total == 0 {
            return CodingOption::ZeroBlock;
        }

        let mut best_option = CodingOption::Backup;
        let mut best_size = block_size * self.config.dynamic_range as u64 + id_bits;

        second_extension_transform(block, &mut self.codewords);
        let mut codeword_bits = 0u64;
        for &codeword in &self.codewords {
            if codeword > best_size {
                codeword_bits = best_size;
                break;
            }
            codeword_bits += codeword;
        }
        let size = codeword_bits + self.codewords.len() as u64 + id_bits + 1;
        if size < best_size {
            best_size = size;
            best_option = CodingOption::SecondExtension;
        }

        let split_count = self.options.option_count - 2;
        if let Some((k, size)) =
            find_best_coding_option_rice(block, self.config.dynamic_range, split_count)
        {
            if size + id_bits < best_size {
                best_option = CodingOption::SampleSplit(k);
            }
        }
        best_option
    }

    /// Codes one block of `block_size` samples.
    pub fn code_block<W: Write>(
        &mut self,
        writer: &mut BitWriter<W>,
        block: &[u32],
    ) -> Result<(), Ccsds123Error> {
        if block.len() != self.masked.len() {
            return Err(Ccsds123Error::InvalidArgument);
        }
        let mut masked = std::mem::take(&mut self.masked);
        masked.copy_from_slice(block);
        mask_block_bits(&mut masked, self.config.dynamic_range);

        let option = self.select_coding_option(&masked);
        let result = self.emit_block(writer, &masked, option);
        self.masked = masked;
        result?;

        self.blocks_coded += 1;
        self.counter.increment();
        if self.counter.at_boundary() {
            self.flush_ros_block(writer)?;
        }
        Ok(())
    }

    fn emit_block<W: Write>(
        &mut self,
        writer: &mut BitWriter<W>,
        block: &[u32],
        option: CodingOption,
    ) -> Result<(), Ccsds123Error> {
        if option == CodingOption::ZeroBlock {
            self.zero_block_count += 1;
            return Ok(());
        }
        self.flush_zero_blocks(writer)?;
        write_id(writer, &self.options, option)?;
        match option {
            CodingOption::SecondExtension => {
                for &codeword in &self.codewords {
                    write_unary(writer, codeword as u32)?;
                }
            }
            CodingOption::Backup => {
                for &sample in block {
                    writer.write_bits(self.config.dynamic_range, sample)?;
                }
            }
            CodingOption::SampleSplit(k) => rice_code_block(writer, block, k)?,
            CodingOption::ZeroBlock => {}
        }
        Ok(())
    }

    fn write_zero_run<W: Write>(&mut self, writer: &mut BitWriter<W>) -> Result<(), Ccsds123Error> {
        write_id(writer, &self.options, CodingOption::ZeroBlock)?;
        write_unary(writer, self.zero_block_count)?;
        self.zero_block_count = 0;
        Ok(())
    }

    /// Emits the pending zero-block run. Runs of one to four blocks are sent
    /// as their length minus one, so that 4 stays free for the RoS code.
    fn flush_zero_blocks<W: Write>(
        &mut self,
        writer: &mut BitWriter<W>,
    ) -> Result<(), Ccsds123Error> {
        if self.zero_block_count == 0 {
            return Ok(());
        }
        if self.zero_block_count <= ROS_CODE {
            self.zero_block_count -= 1;
        }
        self.write_zero_run(writer)
    }

    fn flush_ros_block<W: Write>(&mut self, writer: &mut BitWriter<W>) -> Result<(), Ccsds123Error> {
        if self.zero_block_count <= ROS_CODE {
            self.flush_zero_blocks(writer)
        } else {
            self.zero_block_count = ROS_CODE;
            self.write_zero_run(writer)
        }
    }

    /// Closes the last zero-block run and flushes the bit stream.
    pub fn finish<W: Write>(&mut self, writer: &mut BitWriter<W>) -> Result<(), Ccsds123Error> {
        self.flush_ros_block(writer)?;
        writer.flush()
    }

    pub fn blocks_coded(&self) -> u64 {
        self.blocks_coded
    }
}

impl EntropyEncoder for BlockAdaptiveEncoder {
    fn init_band(&mut self, _z: usize) {}

    fn code_sample<W: Write>(
        &mut self,
        writer: &mut BitWriter<W>,
        sample: u32,
        _t: usize,
        _z: usize,
    ) -> Result<(), Ccsds123Error> {
        self.pending[self.pending_count] = sample;
        self.pending_count += 1;
        if self.pending_count == self.pending.len() {
            let block = std::mem::take(&mut self.pending);
            let result = self.code_block(writer, &block);
            self.pending = block;
            self.pending.fill(0);
            self.pending_count = 0;
            result?;
        }
        Ok(())
    }

    fn update(&mut self, _sample: u32, _t: usize, _z: usize) {}

    fn terminate<W: Write>(&mut self, writer: &mut BitWriter<W>) -> Result<(), Ccsds123Error> {
        if self.pending_count > 0 {
            // The tail of the last block is already zeroed
            let block = std::mem::take(&mut self.pending);
            let result = self.code_block(writer, &block);
            self.pending = block;
            self.pending_count = 0;
            result?;
        }
        debug!(blocks = self.blocks_coded, "block-adaptive encoder finished");
        self.finish(writer)
    }
}

pub struct BlockAdaptiveDecoder {
    config: BlockCoderConfig,
    options: CodeOptionSet,
    counter: BlockCounter,
    zero_blocks_left: u32,
    block: Vec<u32>,
    position: usize,
}

impl BlockAdaptiveDecoder {
    pub fn new(config: BlockCoderConfig) -> Result<Self, Ccsds123Error> {
        config.validate()?;
        let options = CodeOptionSet::new(config.dynamic_range, config.restricted_id_bits);
        debug!(
            block_size = config.block_size,
            id_bits = options.id_bits,
            "block-adaptive decoder"
        );
        let block_size = config.block_size as usize;
        Ok(Self {
            config,
            options,
            counter: BlockCounter::new(config.reference_sample_interval, config.segment_size),
            zero_blocks_left: 0,
            block: vec![0; block_size],
            position: block_size,
        })
    }

    pub fn from_parameters(parameters: &CodingParameters) -> Result<Self, Ccsds123Error> {
        Self::new(BlockCoderConfig::from_parameters(parameters))
    }

    /// Decodes the next block into `block`, which must hold `block_size` samples.
    pub fn decode_block<R: Read>(
        &mut self,
        reader: &mut BitReader<R>,
        block: &mut [u32],
    ) -> Result<(), Ccsds123Error> {
        if block.len() != self.config.block_size as usize {
            return Err(Ccsds123Error::InvalidArgument);
        }
        if self.zero_blocks_left > 0 {
            block.fill(0);
            self.zero_blocks_left -= 1;
            self.counter.increment();
            return Ok(());
        }

        match read_id(reader, &self.options)? {
            CodingOption::ZeroBlock => {
                let run = self.read_zero_run(reader)?;
                block.fill(0);
                self.zero_blocks_left = run - 1;
            }
            CodingOption::SecondExtension => self.decode_second_extension(reader, block)?,
            CodingOption::SampleSplit(k) => rice_decode_block(reader, block, k)?,
            CodingOption::Backup => {
                for sample in block.iter_mut() {
                    *sample = reader.read_bits(self.config.dynamic_range)?;
                }
            }
        }
        self.counter.increment();
        Ok(())
    }

    fn read_zero_run<R: Read>(&self, reader: &mut BitReader<R>) -> Result<u32, Ccsds123Error> {
        let code = read_unary(reader)?;
        Ok(match code {
            ROS_CODE => self.counter.remaining_blocks(),
            c if c < ROS_CODE => c + 1,
            c => c,
        })
    }

    fn decode_second_extension<R: Read>(
        &self,
        reader: &mut BitReader<R>,
        block: &mut [u32],
    ) -> Result<(), Ccsds123Error> {
        let offset = block.len() % 2;
        if offset == 1 {
            let (_, second) = split_codeword(read_unary(reader)? as u64);
            block[0] = second as u32;
        }
        for pair in block[offset..].chunks_exact_mut(2) {
            let (first, second) = split_codeword(read_unary(reader)? as u64);
            pair[0] = first as u32;
            pair[1] = second as u32;
        }
        Ok(())
    }
}

/// Inverse of the pair folding: returns (first, second).
fn split_codeword(codeword: u64) -> (u64, u64) {
    let mut beta = 0u64;
    let mut triangle = 0u64;
    while codeword > beta + triangle {
        beta += 1;
        triangle += beta;
    }
    let second = codeword - triangle;
    (beta - second, second)
}

impl EntropyDecoder for BlockAdaptiveDecoder {
    fn init_band(&mut self, _z: usize) {}

    fn decode_sample<R: Read>(
        &mut self,
        reader: &mut BitReader<R>,
        _t: usize,
        _z: usize,
    ) -> Result<u32, Ccsds123Error> {
        if self.position == self.block.len() {
            let mut block = std::mem::take(&mut self.block);
            let result = self.decode_block(reader, &mut block);
            self.block = block;
            result?;
            self.position = 0;
        }
        let sample = self.block[self.position];
        self.position += 1;
        Ok(sample)
    }

    fn update(&mut self, _sample: u32, _t: usize, _z: usize) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(block_size: u32, dynamic_range: u32, interval: u32, segment: u32) -> BlockCoderConfig {
        BlockCoderConfig {
            block_size,
            dynamic_range,
            reference_sample_interval: interval,
            segment_size: segment,
            restricted_id_bits: false,
            reference_samples: false,
        }
    }

    fn encode_blocks(config: BlockCoderConfig, blocks: &[Vec<u32>]) -> Result<Vec<u8>, Ccsds123Error> {
        let mut encoder = BlockAdaptiveEncoder::new(config)?;
        let mut writer = BitWriter::new(Vec::new());
        for block in blocks {
            encoder.code_block(&mut writer, block)?;
        }
        encoder.finish(&mut writer)?;
        writer.close()
    }

    fn decode_blocks(
        config: BlockCoderConfig,
        data: &[u8],
        count: usize,
    ) -> Result<Vec<Vec<u32>>, Ccsds123Error> {
        let mut decoder = BlockAdaptiveDecoder::new(config)?;
        let mut reader = BitReader::new(data);
        let mut blocks = Vec::new();
        for _ in 0..count {
            let mut block = vec![0u32; config.block_size as usize];
            decoder.decode_block(&mut reader, &mut block)?;
            blocks.push(block);
        }
        Ok(blocks)
    }

    fn pattern(seed: u32, len: usize, modulo: u32) -> Vec<u32> {
        let mut state = seed.wrapping_mul(2_654_435_761).max(1);
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state % modulo
            })
            .collect()
    }

    #[test]
    fn test_second_extension_codewords() {
        let mut codewords = Vec::new();
        second_extension_transform(&[0, 0, 1, 0, 0, 1, 2, 3], &mut codewords);
        assert_eq!(codewords, vec![0, 1, 2, 18]);
        for &codeword in &codewords {
            let (first, second) = split_codeword(codeword);
            assert_eq!(fold_pair(first, second), codeword);
        }
        assert_eq!(split_codeword(18), (2, 3));
        second_extension_transform(&[5, 1, 2], &mut codewords);
        assert_eq!(codewords, vec![20, 8]);
    }

    #[test]
    fn test_option_selection() -> Result<(), Ccsds123Error> {
        let mut encoder = BlockAdaptiveEncoder::new(config(8, 8, 1, 64))?;
        assert_eq!(encoder.select_coding_option(&[0; 8]), CodingOption::ZeroBlock);
        assert_eq!(
            encoder.select_coding_option(&[0, 0, 0, 1, 0, 0, 0, 0]),
            CodingOption::SecondExtension
        );
        assert_eq!(encoder.select_coding_option(&[32; 8]), CodingOption::SampleSplit(4));
        assert_eq!(encoder.select_coding_option(&[255; 8]), CodingOption::Backup);
        Ok(())
    }

    #[test]
    fn test_single_zero_block_layout() -> Result<(), Ccsds123Error> {
        // J = 8, D = 8: three id bits plus the extra zero, then unary(0)
        let data = encode_blocks(config(8, 8, 1, 64), &[vec![0; 8]])?;
        assert_eq!(data, vec![0b0000_1000]);
        let decoded = decode_blocks(config(8, 8, 1, 64), &data, 1)?;
        assert_eq!(decoded, vec![vec![0; 8]]);
        Ok(())
    }

    #[test]
    fn test_id_layout() -> Result<(), Ccsds123Error> {
        let options = CodeOptionSet::new(8, false);
        let mut writer = BitWriter::new(Vec::new());
        write_id(&mut writer, &options, CodingOption::SecondExtension)?;
        write_id(&mut writer, &options, CodingOption::Backup)?;
        write_id(&mut writer, &options, CodingOption::SampleSplit(2))?;
        write_id(&mut writer, &options, CodingOption::ZeroBlock)?;
        // 0001 111 011 0000
        let data = writer.close()?;
        assert_eq!(data, vec![0b0001_1110, 0b1100_0000]);

        let mut reader = BitReader::new(data.as_slice());
        assert_eq!(read_id(&mut reader, &options)?, CodingOption::SecondExtension);
        assert_eq!(read_id(&mut reader, &options)?, CodingOption::Backup);
        assert_eq!(read_id(&mut reader, &options)?, CodingOption::SampleSplit(2));
        assert_eq!(read_id(&mut reader, &options)?, CodingOption::ZeroBlock);
        Ok(())
    }

    #[test]
    fn test_zero_runs_of_every_length() -> Result<(), Ccsds123Error> {
        let config = config(8, 8, 4096, 64);
        for run in 1..=63usize {
            let mut blocks = vec![vec![0u32; 8]; run];
            blocks.push(vec![1, 2, 3, 4, 5, 6, 7, 8]);
            let data = encode_blocks(config, &blocks)?;
            let decoded = decode_blocks(config, &data, blocks.len())?;
            assert_eq!(decoded, blocks, "run of {} zero blocks", run);
        }
        Ok(())
    }

    #[test]
    fn test_remainder_of_segment() -> Result<(), Ccsds123Error> {
        // Six zero blocks end the first segment of eight blocks: RoS code
        let config = config(8, 8, 4096, 8);
        let mut blocks = vec![vec![3u32; 8], vec![1u32; 8]];
        blocks.extend(vec![vec![0u32; 8]; 6]);
        blocks.push(vec![9u32; 8]);

        let mut encoder = BlockAdaptiveEncoder::new(config)?;
        let mut writer = BitWriter::new(Vec::new());
        for block in &blocks[..2] {
            encoder.code_block(&mut writer, block)?;
        }
        let before = writer.bits_written();
        for block in &blocks[2..8] {
            encoder.code_block(&mut writer, block)?;
        }
        // Zero id (4 bits) plus unary(4) (5 bits)
        assert_eq!(writer.bits_written() - before, 9);
        encoder.code_block(&mut writer, &blocks[8])?;
        encoder.finish(&mut writer)?;
        let data = writer.close()?;

        assert_eq!(decode_blocks(config, &data, blocks.len())?, blocks);
        Ok(())
    }

    #[test]
    fn test_reference_interval_and_short_segments() -> Result<(), Ccsds123Error> {
        // r = 2, s = 4
        let config = config(8, 12, 2, 4);
        let mut blocks = Vec::new();
        for i in 0..40u32 {
            if i % 7 < 4 {
                blocks.push(vec![0u32; 8]);
            } else {
                blocks.push(pattern(i, 8, 1 << (i % 12 + 1)));
            }
        }
        let data = encode_blocks(config, &blocks)?;
        assert_eq!(decode_blocks(config, &data, blocks.len())?, blocks);
        Ok(())
    }

    #[test]
    fn test_random_blocks_round_trip() -> Result<(), Ccsds123Error> {
        for &block_size in &[8u32, 16, 32, 64] {
            for &dynamic_range in &[2u32, 4, 9, 16] {
                let config = config(block_size, dynamic_range, 4096, 64);
                let mut blocks = Vec::new();
                for i in 0..24u32 {
                    let modulo = 1u32 << ((i % dynamic_range) + 1).min(dynamic_range);
                    blocks.push(pattern(i + block_size, block_size as usize, modulo));
                }
                let data = encode_blocks(config, &blocks)?;
                assert_eq!(decode_blocks(config, &data, blocks.len())?, blocks);
            }
        }
        Ok(())
    }

    #[test]
    fn test_restricted_id_bits_round_trip() -> Result<(), Ccsds123Error> {
        let mut config = config(16, 2, 4096, 64);
        config.restricted_id_bits = true;
        let blocks: Vec<Vec<u32>> = (0..10u32).map(|i| pattern(i, 16, 4)).collect();
        let data = encode_blocks(config, &blocks)?;
        assert_eq!(decode_blocks(config, &data, blocks.len())?, blocks);
        Ok(())
    }

    #[test]
    fn test_sample_interface_pads_last_block() -> Result<(), Ccsds123Error> {
        let config = config(8, 8, 1, 64);
        let samples: Vec<u32> = (0..13u32).map(|i| (i * 37) % 256).collect();

        let mut encoder = BlockAdaptiveEncoder::new(config)?;
        let mut writer = BitWriter::new(Vec::new());
        for (t, &sample) in samples.iter().enumerate() {
            encoder.code_sample(&mut writer, sample, t, 0)?;
        }
        encoder.terminate(&mut writer)?;
        assert_eq!(encoder.blocks_coded(), 2);
        let data = writer.close()?;

        let mut decoder = BlockAdaptiveDecoder::new(config)?;
        let mut reader = BitReader::new(data.as_slice());
        for (t, &sample) in samples.iter().enumerate() {
            assert_eq!(decoder.decode_sample(&mut reader, t, 0)?, sample);
        }
        Ok(())
    }

    #[test]
    fn test_configuration_errors() {
        assert!(matches!(
            BlockAdaptiveEncoder::new(config(12, 8, 1, 64)),
            Err(Ccsds123Error::InvalidParameterBlockSize)
        ));
        assert!(BlockAdaptiveEncoder::new(config(8, 17, 1, 64)).is_err());
        assert!(BlockAdaptiveEncoder::new(config(8, 8, 0, 64)).is_err());
        assert!(BlockAdaptiveDecoder::new(config(8, 8, 1, 0)).is_err());
        let mut with_references = config(8, 8, 1, 64);
        with_references.reference_samples = true;
        assert!(matches!(
            BlockAdaptiveEncoder::new(with_references),
            Err(Ccsds123Error::ReferenceSamplesNotSupported)
        ));
    }
}
