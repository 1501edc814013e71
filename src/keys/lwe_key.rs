//! Binary LWE secret key: phase is `b - <a, s>`.
use super::TLweKey;
use crate::ciphertext::LweSampleArray;
use crate::errors::{TfheResult, ensure_eq};
use crate::math::{TorusGaussian, binary_coefficients, uniform_torus};
use crate::params::LweParams;
use crate::torus::Torus32;
use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct LweKey {
    params: LweParams,
    bits: Vec<i32>,
}

impl LweKey {
    pub fn generate<R: Rng + ?Sized>(params: LweParams, rng: &mut R) -> Self {
        let bits = binary_coefficients(params.n, rng);
        Self { params, bits }
    }

    pub fn from_bits(params: LweParams, bits: Vec<i32>) -> TfheResult<Self> {
        ensure_eq("LWE key length", params.n, bits.len())?;
        Ok(Self { params, bits })
    }

    /// The key under which samples extracted from a TLWE sample decrypt:
    /// coordinate `q·N + j` is coefficient `j` of key polynomial `q`.
    pub fn from_tlwe_key(key: &TLweKey) -> Self {
        Self {
            params: key.params().extracted_lwe_params(),
            bits: key.coefs().to_vec(),
        }
    }

    pub fn params(&self) -> &LweParams {
        &self.params
    }

    pub fn dimension(&self) -> usize {
        self.bits.len()
    }

    pub fn bits(&self) -> &[i32] {
        &self.bits
    }

    /// Encrypts each message with noise of standard deviation `std_dev`.
    pub fn encrypt<R: Rng + ?Sized>(
        &self,
        messages: &[Torus32],
        std_dev: f64,
        rng: &mut R,
    ) -> TfheResult<LweSampleArray> {
        let noise = TorusGaussian::new(std_dev)?;
        let n = self.dimension();
        let mut out = LweSampleArray::zeros(n, messages.len());
        let (mask, body) = out.parts_mut();
        for ((a, b), &message) in mask.chunks_exact_mut(n.max(1)).zip(body).zip(messages) {
            uniform_torus(a, rng);
            *b = noise.sample_around(message, rng).wrapping_add(self.dot(a));
        }
        Ok(out)
    }

    /// `b - <a, s>` for every sample.
    pub fn phase(&self, samples: &LweSampleArray) -> TfheResult<Vec<Torus32>> {
        ensure_eq("LWE dimension", self.dimension(), samples.dimension())?;
        Ok((0..samples.batch_size())
            .map(|i| samples.body()[i].wrapping_sub(self.dot(samples.mask_of(i))))
            .collect())
    }

    /// `true` where the phase lies in `[0, 1/2)`.
    pub fn decrypt_signs(&self, samples: &LweSampleArray) -> TfheResult<Vec<bool>> {
        Ok(self.phase(samples)?.into_iter().map(|p| p >= 0).collect())
    }

    fn dot(&self, mask: &[Torus32]) -> Torus32 {
        mask.iter()
            .zip(&self.bits)
            .fold(0, |acc, (&a, &s)| acc.wrapping_add(a.wrapping_mul(s)))
    }
}
