//! Fixed-point torus values.
//!
//! A `Torus32` stores a real number modulo 1 in a signed 32-bit integer whose
//! full range represents `[0, 1)`: the integer `t` encodes `t / 2^32 mod 1`.
//! All arithmetic is wrapping, so values never saturate.

/// A torus value encoded on 32 bits.
pub type Torus32 = i32;

const TWO_POW_32: f64 = 4_294_967_296.0;

/// Encodes a real number modulo 1.
pub fn f64_to_torus32(value: f64) -> Torus32 {
    let frac = value - value.floor();
    // frac * 2^32 may round up to exactly 2^32, which wraps to 0.
    (frac * TWO_POW_32).round() as u64 as u32 as Torus32
}

/// Decodes a torus value as a real number in `[-0.5, 0.5)`.
pub fn torus32_to_f64(value: Torus32) -> f64 {
    value as f64 / TWO_POW_32
}

/// Rounds `value` to its `bits` most significant bits, ties to even.
///
/// Returns the rounded value shifted down, i.e. an integer in `[0, 2^bits)`.
/// Rounding up past the top of the range wraps to zero (the value lives on
/// the torus).
pub fn round_to_bits(value: u32, bits: u32) -> u32 {
    debug_assert!((1..=32).contains(&bits));
    if bits >= 32 {
        return value;
    }
    let shift = 32 - bits;
    let value = value as u64;
    let mut quotient = value >> shift;
    let remainder = value & ((1u64 << shift) - 1);
    let half = 1u64 << (shift - 1);
    if remainder > half || (remainder == half && quotient & 1 == 1) {
        quotient += 1;
    }
    (quotient & ((1u64 << bits) - 1)) as u32
}

/// Maps a torus value to the nearest integer modulo `msize` (ties to even).
///
/// Computes `round(phase * msize / 2^32) mod msize` exactly, reading the
/// phase as an unsigned fraction of the torus.
pub fn mod_switch_from_torus32(phase: Torus32, msize: u32) -> u32 {
    debug_assert!(msize > 0);
    let scaled = (phase as u32 as u64) * msize as u64;
    let mut quotient = scaled >> 32;
    let remainder = scaled & 0xFFFF_FFFF;
    let half = 1u64 << 31;
    if remainder > half || (remainder == half && quotient & 1 == 1) {
        quotient += 1;
    }
    (quotient % msize as u64) as u32
}

/// Encodes `mu / msize` as a torus value, rounding to nearest.
pub fn mod_switch_to_torus32(mu: i64, msize: u32) -> Torus32 {
    debug_assert!(msize > 0);
    let msize = msize as i128;
    let reduced = (mu as i128).rem_euclid(msize);
    // (reduced * 2^32 + msize/2) / msize, computed without overflow in i128.
    let numerator = (reduced << 32) + msize / 2;
    (numerator / msize) as u64 as u32 as Torus32
}
