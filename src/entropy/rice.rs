//! Sample-split (Rice) coding of fixed size blocks and the code option
//! bookkeeping shared by the block-adaptive coder.

use super::unary::{read_unary, write_unary};
use crate::bit_io::{BitReader, BitWriter};
use crate::constants::MAXIMUM_SPLIT_POSITION;
use crate::error::Ccsds123Error;
use std::io::{Read, Write};

/// Identifier width and option count of a block coder, CCSDS 121.0-B-2 table 5-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeOptionSet {
    pub id_bits: u32,
    pub option_count: u32,
    pub backup_option: u32,
}

impl CodeOptionSet {
    pub fn new(dynamic_range: u32, restricted: bool) -> Self {
        let bits = (dynamic_range - 1).ilog2() + 1;
        let id_bits = if restricted && dynamic_range <= 4 {
            bits
        } else {
            bits.max(3)
        };
        let option_count = 1 << id_bits;
        Self {
            id_bits,
            option_count,
            backup_option: option_count - 1,
        }
    }
}

/// Clears every bit above `dynamic_range`.
pub fn mask_block_bits(block: &mut [u32], dynamic_range: u32) {
    let mask = ((1u64 << dynamic_range) - 1) as u32;
    for sample in block.iter_mut() {
        *sample &= mask;
    }
}

/// Writes unary(sample >> k) for every sample, then the k low bits of every sample.
pub fn rice_code_block<W: Write>(
    writer: &mut BitWriter<W>,
    block: &[u32],
    k: u32,
) -> Result<(), Ccsds123Error> {
    if k > MAXIMUM_SPLIT_POSITION {
        return Err(Ccsds123Error::InvalidArgument);
    }
    for &sample in block {
        write_unary(writer, sample >> k)?;
    }
    if k > 0 {
        for &sample in block {
            writer.write_bits(k, sample)?;
        }
    }
    Ok(())
}

pub fn rice_decode_block<R: Read>(
    reader: &mut BitReader<R>,
    block: &mut [u32],
    k: u32,
) -> Result<(), Ccsds123Error> {
    if k > MAXIMUM_SPLIT_POSITION {
        return Err(Ccsds123Error::InvalidArgument);
    }
    for sample in block.iter_mut() {
        *sample = read_unary(reader)? << k;
    }
    if k > 0 {
        for sample in block.iter_mut() {
            *sample |= reader.read_bits(k)?;
        }
    }
    Ok(())
}

/// Cheapest of the first `split_count` split positions for `block`, with its
/// size in bits. None when sending the samples uncoded is no longer than any
/// split. Identifier bits are not counted.
pub fn find_best_coding_option_rice(
    block: &[u32],
    dynamic_range: u32,
    split_count: u32,
) -> Option<(u32, u64)> {
    let block_size = block.len() as u64;
    let mut best = None;
    let mut best_size = block_size * dynamic_range as u64;

    for k in 0..split_count {
        let high_bits: u64 = block.iter().map(|&s| (s >> k) as u64).sum();
        let size = high_bits + (k as u64 + 1) * block_size;
        if size < best_size {
            best_size = size;
            best = Some((k, size));
        }
    }
    best
}
