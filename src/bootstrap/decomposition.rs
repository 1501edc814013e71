//! Digit decompositions of torus values.
//!
//! Both decompositions first round the value to the precision the digits
//! can represent (ties to even), so reconstruction error is at most half a
//! unit of the last digit.
use crate::errors::TfheResult;
use crate::params::{KeySwitchParams, TGswParams, check_decomposition};
use crate::torus::{Torus32, round_to_bits};

/// Signed gadget decomposition for the external product.
///
/// `value ≈ Σ_i digit_i · Bg^{-(i+1)}` with `digit_i ∈ [-Bg/2, Bg/2)`,
/// most significant level first.
#[derive(Debug, Clone, Copy)]
pub struct GadgetDecomposer {
    length: usize,
    base_bits: u32,
    offset: u64,
}

impl GadgetDecomposer {
    pub fn new(params: &TGswParams) -> TfheResult<Self> {
        let length = params.decomp_length;
        let base_bits = params.base_bits;
        check_decomposition("TGSW", length, base_bits)?;
        let half = 1u64 << (base_bits - 1);
        let total = length as u32 * base_bits;
        let offset = (0..length as u32)
            .map(|i| half << ((length as u32 - 1 - i) * base_bits))
            .sum::<u64>()
            & low_mask(total);
        Ok(Self {
            length,
            base_bits,
            offset,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Decomposes every coefficient of `poly` into `digits`, level-major:
    /// `digits[level * N + j]` is digit `level` of `poly[j]`.
    pub fn decompose(&self, poly: &[Torus32], digits: &mut [i32]) {
        let n = poly.len();
        debug_assert_eq!(digits.len(), self.length * n);
        let total = self.length as u32 * self.base_bits;
        let mask = (1u64 << self.base_bits) - 1;
        let half = 1i64 << (self.base_bits - 1);
        for (j, &value) in poly.iter().enumerate() {
            let rounded = round_to_bits(value as u32, total) as u64;
            let shifted = (rounded + self.offset) & low_mask(total);
            for level in 0..self.length {
                let shift = (self.length - 1 - level) as u32 * self.base_bits;
                let digit = ((shifted >> shift) & mask) as i64 - half;
                digits[level * n + j] = digit as i32;
            }
        }
    }
}

/// Unsigned decomposition for key switching.
///
/// `value ≈ Σ_j digit_j · base^{-(j+1)}` with `digit_j ∈ [0, base)`.
#[derive(Debug, Clone, Copy)]
pub struct KeySwitchDecomposer {
    length: usize,
    base_bits: u32,
}

impl KeySwitchDecomposer {
    pub fn new(params: &KeySwitchParams) -> TfheResult<Self> {
        check_decomposition("key-switch", params.length, params.base_bits)?;
        Ok(Self {
            length: params.length,
            base_bits: params.base_bits,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Writes the `t` digits of `value` into `digits`.
    pub fn decompose(&self, value: Torus32, digits: &mut [usize]) {
        debug_assert_eq!(digits.len(), self.length);
        let total = self.length as u32 * self.base_bits;
        let rounded = round_to_bits(value as u32, total) as u64;
        let mask = (1u64 << self.base_bits) - 1;
        for (level, digit) in digits.iter_mut().enumerate() {
            let shift = (self.length - 1 - level) as u32 * self.base_bits;
            *digit = ((rounded >> shift) & mask) as usize;
        }
    }
}

fn low_mask(bits: u32) -> u64 {
    (1u64 << bits) - 1
}
