//! Simple-9 / Simple-16-style variable-bit integer codec
//!
//! Packs a stream of small non-negative integers into fixed-width
//! words, choosing per-word how many bits each packed value gets so
//! that runs of small values cost very little and occasional large
//! values still fit. Two variants are provided, differing only in
//! their word width and size-code table: [`Simple32`] (32-bit words)
//! and [`Simple64`] (64-bit words).
//!
//! Each word reserves its low 4 bits for a size code identifying how
//! many equally sized fields follow, and packs as many values as fit
//! in the remaining bits.

use crate::common::{Result, SketchError};

/// One entry of a size-code table: how many values of how many bits
/// each a size code packs into one word.
#[derive(Clone, Copy, Debug)]
struct SizeCode {
    /// Number of values packed per word at this code.
    count: u32,
    /// Bits allotted to each value.
    bits: u32,
}

/// 32-bit word layout: low 4 bits size code, 28 bits of payload.
const SIMPLE32_CODES: [SizeCode; 9] = [
    SizeCode { count: 28, bits: 1 },
    SizeCode { count: 14, bits: 2 },
    SizeCode { count: 9, bits: 3 },
    SizeCode { count: 7, bits: 4 },
    SizeCode { count: 5, bits: 5 },
    SizeCode { count: 4, bits: 7 },
    SizeCode { count: 3, bits: 9 },
    SizeCode { count: 2, bits: 14 },
    SizeCode { count: 1, bits: 28 },
];

/// 64-bit word layout: low 4 bits size code, 60 bits of payload.
const SIMPLE64_CODES: [SizeCode; 14] = [
    SizeCode { count: 60, bits: 1 },
    SizeCode { count: 30, bits: 2 },
    SizeCode { count: 20, bits: 3 },
    SizeCode { count: 15, bits: 4 },
    SizeCode { count: 12, bits: 5 },
    SizeCode { count: 10, bits: 6 },
    SizeCode { count: 8, bits: 7 },
    SizeCode { count: 7, bits: 8 },
    SizeCode { count: 6, bits: 10 },
    SizeCode { count: 5, bits: 12 },
    SizeCode { count: 4, bits: 15 },
    SizeCode { count: 3, bits: 20 },
    SizeCode { count: 2, bits: 30 },
    SizeCode { count: 1, bits: 60 },
];

fn bits_per_value(v: u64, word_bits: u32) -> u32 {
    if v == 0 {
        1
    } else {
        word_bits - v.leading_zeros().saturating_sub(64 - word_bits)
    }
}

struct SimpleCodecCore {
    word_bits: u32,
    codes: &'static [SizeCode],
    pending: Vec<u64>,
    pending_bits: Vec<u32>,
    max_code: u32,
}

impl SimpleCodecCore {
    fn new(word_bits: u32, codes: &'static [SizeCode]) -> Self {
        SimpleCodecCore {
            word_bits,
            codes,
            pending: Vec::new(),
            pending_bits: Vec::new(),
            max_code: 0,
        }
    }

    fn payload_bits(&self) -> u32 {
        self.word_bits - 4
    }

    /// Buffers `v`, then emits as many full words as the current
    /// pending buffer allows.
    fn add(&mut self, v: u64, out: &mut Vec<u64>) -> Result<()> {
        let width = bits_per_value(v, self.word_bits);
        if width > self.payload_bits() {
            return Err(SketchError::BadInput {
                param: "v".to_string(),
                value: v.to_string(),
                constraint: format!("must fit in {} bits", self.payload_bits()),
            });
        }
        self.pending.push(v);
        self.pending_bits.push(width);
        self.max_code = self.max_code.max(width);

        while (self.max_code as usize) * self.pending.len() >= self.payload_bits() as usize {
            self.emit_one(out);
        }
        Ok(())
    }

    /// Selects the smallest size code that packs a prefix of `pending`
    /// entirely within its field width, and emits one word for it.
    fn emit_one(&mut self, out: &mut Vec<u64>) {
        let payload_bits = self.payload_bits();
        let mut chosen = self.codes.len() - 1;
        for (i, code) in self.codes.iter().enumerate() {
            let n = (payload_bits / code.bits) as usize;
            if n == 0 || n > self.pending.len() {
                continue;
            }
            let max_width = self.pending_bits[..n].iter().copied().max().unwrap_or(0);
            if max_width <= code.bits {
                chosen = i;
                break;
            }
        }

        let code = self.codes[chosen];
        let n = ((payload_bits / code.bits) as usize).min(self.pending.len());

        let mut word: u64 = chosen as u64;
        for i in 0..n {
            word |= self.pending[i] << (4 + i as u32 * code.bits);
        }
        out.push(word);

        self.pending.drain(0..n);
        self.pending_bits.drain(0..n);
        self.max_code = self.pending_bits.iter().copied().max().unwrap_or(0);
    }

    /// Emits any remaining pending values, zero-padding the final word.
    fn flush(&mut self, out: &mut Vec<u64>) {
        while !self.pending.is_empty() {
            self.emit_one(out);
        }
    }

    fn decode_word(codes: &[SizeCode], word: u64) -> Vec<u64> {
        let code_idx = (word & 0xF) as usize;
        let code = codes[code_idx];
        let mask = (1u64 << code.bits) - 1;
        (0..code.count)
            .map(|i| (word >> (4 + i * code.bits)) & mask)
            .collect()
    }
}

/// Encoder for the 32-bit-word Simple-N variant.
pub struct Simple32Encoder {
    core: SimpleCodecCore,
}

impl Default for Simple32Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Simple32Encoder {
    /// Creates an empty encoder.
    pub fn new() -> Self {
        Simple32Encoder {
            core: SimpleCodecCore::new(32, &SIMPLE32_CODES),
        }
    }

    /// Buffers one non-negative integer, emitting any words it
    /// completes.
    ///
    /// # Errors
    /// Returns [`SketchError::BadInput`] if `v` does not fit in 28
    /// bits.
    pub fn add(&mut self, v: u64, out: &mut Vec<u32>) -> Result<()> {
        let mut words = Vec::new();
        self.core.add(v, &mut words)?;
        out.extend(words.into_iter().map(|w| w as u32));
        Ok(())
    }

    /// Flushes any buffered values, padding the final word with
    /// zeros.
    pub fn flush(&mut self, out: &mut Vec<u32>) {
        let mut words = Vec::new();
        self.core.flush(&mut words);
        out.extend(words.into_iter().map(|w| w as u32));
    }

    /// Encodes a whole slice in one call, flushing at the end.
    ///
    /// # Errors
    /// Returns [`SketchError::BadInput`] if any value doesn't fit in
    /// 28 bits.
    pub fn encode(values: &[u64]) -> Result<Vec<u32>> {
        let mut enc = Simple32Encoder::new();
        let mut out = Vec::new();
        for &v in values {
            enc.add(v, &mut out)?;
        }
        enc.flush(&mut out);
        Ok(out)
    }
}

/// Decodes a sequence of words produced by [`Simple32Encoder`]. The
/// decoded sequence begins with the original values, possibly followed
/// by zero-padding from the final flush.
pub fn simple32_decode(words: &[u32]) -> Vec<u64> {
    words
        .iter()
        .flat_map(|&w| SimpleCodecCore::decode_word(&SIMPLE32_CODES, w as u64))
        .collect()
}

/// Encoder for the 64-bit-word Simple-N variant.
pub struct Simple64Encoder {
    core: SimpleCodecCore,
}

impl Default for Simple64Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Simple64Encoder {
    /// Creates an empty encoder.
    pub fn new() -> Self {
        Simple64Encoder {
            core: SimpleCodecCore::new(64, &SIMPLE64_CODES),
        }
    }

    /// Buffers one non-negative integer, emitting any words it
    /// completes.
    ///
    /// # Errors
    /// Returns [`SketchError::BadInput`] if `v` does not fit in 60
    /// bits.
    pub fn add(&mut self, v: u64, out: &mut Vec<u64>) -> Result<()> {
        self.core.add(v, out)
    }

    /// Flushes any buffered values, padding the final word with
    /// zeros.
    pub fn flush(&mut self, out: &mut Vec<u64>) {
        self.core.flush(out);
    }

    /// Encodes a whole slice in one call, flushing at the end.
    ///
    /// # Errors
    /// Returns [`SketchError::BadInput`] if any value doesn't fit in
    /// 60 bits.
    pub fn encode(values: &[u64]) -> Result<Vec<u64>> {
        let mut enc = Simple64Encoder::new();
        let mut out = Vec::new();
        for &v in values {
            enc.add(v, &mut out)?;
        }
        enc.flush(&mut out);
        Ok(out)
    }
}

/// Decodes a sequence of words produced by [`Simple64Encoder`].
pub fn simple64_decode(words: &[u64]) -> Vec<u64> {
    words
        .iter()
        .flat_map(|&w| SimpleCodecCore::decode_word(&SIMPLE64_CODES, w))
        .collect()
}
