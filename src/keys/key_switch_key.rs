use super::LweKey;
use crate::ciphertext::LweSampleArray;
use crate::errors::{TfheResult, ensure_eq};
use crate::math::{TorusGaussian, uniform_torus};
use crate::params::{KeySwitchParams, check_decomposition};
use crate::torus::Torus32;
use rand::Rng;
use tracing::{debug, instrument};

/// Table of LWE samples under the output key, indexed by input coordinate
/// `i`, digit level `j` and digit value `v`.
///
/// Entry `(i, j, v)` encrypts `v·s'_i / base^{j+1}`; entries with `v = 0`
/// are trivial zeros.
#[derive(Debug, Clone, PartialEq)]
pub struct KeySwitchKey {
    params: KeySwitchParams,
    input_dimension: usize,
    entries: LweSampleArray,
}

impl KeySwitchKey {
    #[instrument(skip_all, fields(input = input_key.dimension(), output = output_key.dimension()))]
    pub fn generate<R: Rng + ?Sized>(
        params: KeySwitchParams,
        input_key: &LweKey,
        output_key: &LweKey,
        std_dev: f64,
        rng: &mut R,
    ) -> TfheResult<Self> {
        check_decomposition("key-switch", params.length, params.base_bits)?;
        let noise = TorusGaussian::new(std_dev)?;
        let input_dimension = input_key.dimension();
        let base = params.base();
        let count = input_dimension * params.length * base;
        let mut messages = Vec::with_capacity(count);
        for &bit in input_key.bits() {
            for level in 0..params.length {
                let shift = 32 - (level as u32 + 1) * params.base_bits;
                for value in 0..base {
                    let digit = (value as u32).wrapping_shl(shift) as Torus32;
                    messages.push(digit.wrapping_mul(bit));
                }
            }
        }

        let n = output_key.dimension();
        let mut entries = LweSampleArray::zeros(n, count);
        let (mask, body) = entries.parts_mut();
        for (index, ((a, b), &message)) in mask
            .chunks_exact_mut(n.max(1))
            .zip(body.iter_mut())
            .zip(&messages)
            .enumerate()
        {
            if index % base == 0 {
                continue;
            }
            uniform_torus(a, rng);
            let dot = a
                .iter()
                .zip(output_key.bits())
                .fold(0i32, |acc, (&a, &s)| acc.wrapping_add(a.wrapping_mul(s)));
            *b = noise.sample_around(message, rng).wrapping_add(dot);
        }
        debug!(entries = count, "key-switching key generated");
        Ok(Self {
            params,
            input_dimension,
            entries,
        })
    }

    /// Wraps an externally produced table.
    pub fn from_entries(
        params: KeySwitchParams,
        input_dimension: usize,
        entries: LweSampleArray,
    ) -> TfheResult<Self> {
        check_decomposition("key-switch", params.length, params.base_bits)?;
        ensure_eq(
            "key-switching table size",
            input_dimension * params.length * params.base(),
            entries.batch_size(),
        )?;
        Ok(Self {
            params,
            input_dimension,
            entries,
        })
    }

    pub fn params(&self) -> &KeySwitchParams {
        &self.params
    }

    pub fn input_dimension(&self) -> usize {
        self.input_dimension
    }

    pub fn output_dimension(&self) -> usize {
        self.entries.dimension()
    }

    pub fn entries(&self) -> &LweSampleArray {
        &self.entries
    }

    /// Flat index of entry `(coordinate, level, value)`.
    #[inline]
    pub fn index(&self, coordinate: usize, level: usize, value: usize) -> usize {
        (coordinate * self.params.length + level) * self.params.base() + value
    }
}
