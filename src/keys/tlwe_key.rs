//! Ring LWE key: `k` binary polynomials of degree `< N`.
use crate::ciphertext::TLweSampleArray;
use crate::errors::{TfheResult, ensure_eq};
use crate::math::{TorusGaussian, binary_coefficients, uniform_torus};
use crate::params::TLweParams;
use crate::rings::{MultiplierScratch, RingMultiplier, TorusPolynomialArray};
use crate::torus::Torus32;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct TLweKey {
    params: TLweParams,
    coefs: Vec<i32>,
    multiplier: RingMultiplier,
}

impl TLweKey {
    pub fn generate<R: Rng + ?Sized>(params: TLweParams, rng: &mut R) -> TfheResult<Self> {
        let coefs = binary_coefficients(params.mask_size * params.ring_degree, rng);
        Self::from_coefs(params, coefs)
    }

    pub fn from_coefs(params: TLweParams, coefs: Vec<i32>) -> TfheResult<Self> {
        ensure_eq(
            "TLWE key length",
            params.mask_size * params.ring_degree,
            coefs.len(),
        )?;
        Ok(Self {
            params,
            coefs,
            multiplier: RingMultiplier::new(params.ring_degree)?,
        })
    }

    pub fn params(&self) -> &TLweParams {
        &self.params
    }

    /// Key polynomials back to back.
    pub fn coefs(&self) -> &[i32] {
        &self.coefs
    }

    pub fn multiplier(&self) -> &RingMultiplier {
        &self.multiplier
    }

    /// Writes a fresh encryption of zero into `sample` (`(k+1)·N` values).
    pub fn encrypt_zero_into<R: Rng + ?Sized>(
        &self,
        sample: &mut [Torus32],
        noise: &TorusGaussian,
        rng: &mut R,
        scratch: &mut MultiplierScratch,
    ) -> TfheResult<()> {
        let n = self.params.ring_degree;
        let k = self.params.mask_size;
        ensure_eq("TLWE sample length", (k + 1) * n, sample.len())?;
        let (mask, body) = sample.split_at_mut(k * n);
        uniform_torus(mask, rng);
        self.mask_product(mask, body, scratch)?;
        for coeff in body.iter_mut() {
            *coeff = noise.sample_around(*coeff, rng);
        }
        Ok(())
    }

    /// Encrypts each polynomial of `messages` as one TLWE sample.
    pub fn encrypt<R: Rng + ?Sized>(
        &self,
        messages: &TorusPolynomialArray,
        std_dev: f64,
        rng: &mut R,
    ) -> TfheResult<TLweSampleArray> {
        let n = self.params.ring_degree;
        ensure_eq("ring degree", n, messages.ring_degree())?;
        let noise = TorusGaussian::new(std_dev)?;
        let mut scratch = self.multiplier.scratch();
        let mut out = TLweSampleArray::zeros(n, self.params.mask_size, messages.batch_size());
        for index in 0..messages.batch_size() {
            let sample = out.sample_mut(index);
            self.encrypt_zero_into(sample, &noise, rng, &mut scratch)?;
            let body = &mut sample[self.params.mask_size * n..];
            for (b, &m) in body.iter_mut().zip(messages.poly(index)) {
                *b = b.wrapping_add(m);
            }
        }
        Ok(out)
    }

    /// `b - Σ a_q·s_q` for every sample.
    pub fn phase(&self, samples: &TLweSampleArray) -> TfheResult<TorusPolynomialArray> {
        let n = self.params.ring_degree;
        let k = self.params.mask_size;
        ensure_eq("ring degree", n, samples.ring_degree())?;
        ensure_eq("TLWE mask size", k, samples.mask_size())?;
        let mut scratch = self.multiplier.scratch();
        let mut out = TorusPolynomialArray::zeros(n, samples.batch_size());
        let mut product = vec![0; n];
        for (index, phase) in out.coefs_mut().chunks_exact_mut(n).enumerate() {
            let (mask, body) = samples.sample(index).split_at(k * n);
            self.mask_product(mask, &mut product, &mut scratch)?;
            for ((p, &b), &s) in phase.iter_mut().zip(body).zip(&product) {
                *p = b.wrapping_sub(s);
            }
        }
        Ok(out)
    }

    /// `out = Σ_q a_q·s_q`.
    fn mask_product(
        &self,
        mask: &[Torus32],
        out: &mut [Torus32],
        scratch: &mut MultiplierScratch,
    ) -> TfheResult<()> {
        let n = self.params.ring_degree;
        let keys: Vec<&[i32]> = self.coefs.chunks_exact(n).collect();
        let masks: Vec<&[Torus32]> = mask.chunks_exact(n).collect();
        self.multiplier
            .multiply_sum_int_torus(&keys, &masks, out, scratch)
    }
}
