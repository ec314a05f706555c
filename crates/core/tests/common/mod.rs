//! Shared helpers for the integration tests: seeded inputs and a slow
//! reference decoder.

#![allow(dead_code)]

use std::collections::HashMap;

use huffcode_core::{Code, Symbol, MAX_CODE_LEN};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Generate bytes with mixed statistics.
///
/// Chunks alternate at random between runs of one byte, text-like data,
/// short repeating patterns and uniform noise, so the resulting codes have
/// a spread of lengths.
pub fn generate_sample_data(seed: u64, size_bytes: usize) -> Vec<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = Vec::with_capacity(size_bytes);

    while data.len() < size_bytes {
        let chunk_size = (size_bytes - data.len()).min(rng.gen_range(64..=2048));
        match rng.gen_range(0..10) {
            0..=2 => {
                let byte_value: u8 = rng.gen();
                data.extend(std::iter::repeat(byte_value).take(chunk_size));
            }
            3..=5 => {
                let alphabet = b"abcdefghijklmnopqrstuvwxyz .!,\n";
                for _ in 0..chunk_size {
                    data.push(alphabet[rng.gen_range(0..alphabet.len())]);
                }
            }
            6..=7 => {
                let pattern = generate_pattern(&mut rng);
                data.extend(pattern.iter().cycle().take(chunk_size));
            }
            _ => {
                for _ in 0..chunk_size {
                    data.push(rng.gen());
                }
            }
        }
    }
    data
}

fn generate_pattern(rng: &mut ChaCha8Rng) -> Vec<u8> {
    let pattern_len = rng.gen_range(4..=32);
    (0..pattern_len).map(|_| rng.gen()).collect()
}

/// Generate `count` symbols below `alphabet`, skewed toward small values.
pub fn generate_symbols(seed: u64, alphabet: Symbol, count: usize) -> Vec<Symbol> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let x: f64 = rng.gen();
            ((x * x * x * f64::from(alphabet)) as Symbol).min(alphabet - 1)
        })
        .collect()
}

/// Frequencies spread over many orders of magnitude, which pushes the
/// rarest symbols toward the length bound.
pub fn generate_wide_frequencies(seed: u64, symbols: usize) -> Vec<i64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..symbols)
        .map(|_| match rng.gen_range(0..8) {
            0 => 0,
            _ => 1i64 << rng.gen_range(0..40),
        })
        .collect()
}

/// Every symbol that has a code, in symbol order.
pub fn live_symbols(code: &Code) -> Vec<Symbol> {
    code.iter()
        .enumerate()
        .filter(|(_, c)| !c.is_empty())
        .map(|(s, _)| s as Symbol)
        .collect()
}

/// Decode one bit at a time by matching the accumulated prefix against every
/// code. Returns `None` if the bits do not split into whole codes.
pub fn bitwise_decode(code: &Code, data: &[u8], bit_len: u64) -> Option<Vec<Symbol>> {
    let codes: HashMap<(u32, u8), Symbol> = code
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.is_empty())
        .map(|(s, c)| ((c.value(), c.len()), s as Symbol))
        .collect();

    let mut out = Vec::new();
    let (mut value, mut len) = (0u32, 0u8);
    for pos in 0..bit_len {
        let bit = (data[(pos / 8) as usize] >> (pos % 8)) & 1;
        value = value << 1 | u32::from(bit);
        len += 1;
        if let Some(&symbol) = codes.get(&(value, len)) {
            out.push(symbol);
            (value, len) = (0, 0);
        } else if len >= MAX_CODE_LEN {
            return None;
        }
    }
    (len == 0).then_some(out)
}

/// Sum of 2^-len over used codes, scaled by 2^20.
pub fn kraft_sum(code: &Code) -> u64 {
    code.lengths()
        .filter(|&len| len > 0)
        .map(|len| 1u64 << (MAX_CODE_LEN - len))
        .sum()
}
