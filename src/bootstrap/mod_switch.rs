use crate::ciphertext::LweSampleArray;
use crate::errors::{TfheError, TfheResult};
use crate::torus::{Torus32, mod_switch_from_torus32};
use rayon::prelude::*;

/// Rotation exponents of a batch of LWE samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationAmounts {
    /// `bara[b·n + i]`, switched from mask coordinate `i` of sample `b`.
    pub bara: Vec<u32>,
    /// Switched from the body of each sample.
    pub barb: Vec<u32>,
}

/// `out[i] = round(values[i] · msize / 2^32) mod msize`, ties to even.
pub fn mod_switch_batch(values: &[Torus32], msize: u32, out: &mut [u32]) {
    out.par_iter_mut()
        .zip(values.par_iter())
        .for_each(|(o, &v)| *o = mod_switch_from_torus32(v, msize));
}

/// Switches every mask coordinate and body to `Z/msize`.
pub fn mod_switch_samples(samples: &LweSampleArray, msize: u32) -> TfheResult<RotationAmounts> {
    if msize == 0 {
        return Err(TfheError::invalid("modulus switching target must be positive"));
    }
    let mut bara = vec![0; samples.mask().len()];
    let mut barb = vec![0; samples.batch_size()];
    mod_switch_batch(samples.mask(), msize, &mut bara);
    mod_switch_batch(samples.body(), msize, &mut barb);
    Ok(RotationAmounts { bara, barb })
}
