//! External product `TGSW(μ) ⊡ TLWE(m) ≈ TLWE(μ·m)`.
use super::decomposition::GadgetDecomposer;
use crate::ciphertext::{TGswSpectralArray, TLweSampleArray};
use crate::errors::{TfheError, TfheResult, ensure_eq};
use crate::params::TGswParams;
use crate::rings::{MultiplierScratch, RingMultiplier, multiplier::multiply_accumulate};
use crate::torus::Torus32;
use rayon::prelude::*;
use num_complex::Complex64;

#[derive(Debug, Clone)]
pub struct ExternalProduct {
    params: TGswParams,
    decomposer: GadgetDecomposer,
    multiplier: RingMultiplier,
}

/// Working memory for one TLWE sample.
pub struct ExternalProductScratch {
    digits: Vec<i32>,
    digit_spectra: Vec<Complex64>,
    acc_spectra: Vec<Complex64>,
    ring: MultiplierScratch,
}

impl ExternalProduct {
    pub fn new(params: TGswParams, multiplier: RingMultiplier) -> TfheResult<Self> {
        ensure_eq("ring degree", params.tlwe.ring_degree, multiplier.ring_degree())?;
        Ok(Self {
            params,
            decomposer: GadgetDecomposer::new(&params)?,
            multiplier,
        })
    }

    pub fn params(&self) -> &TGswParams {
        &self.params
    }

    pub fn multiplier(&self) -> &RingMultiplier {
        &self.multiplier
    }

    pub fn scratch(&self) -> ExternalProductScratch {
        let n = self.params.tlwe.ring_degree;
        let half = self.multiplier.spectral_len();
        let polys = self.params.tlwe.mask_size + 1;
        ExternalProductScratch {
            digits: vec![0; self.params.decomp_length * n],
            digit_spectra: vec![Complex64::default(); self.params.row_count() * half],
            acc_spectra: vec![Complex64::default(); polys * half],
            ring: self.multiplier.scratch(),
        }
    }

    /// `out = tgsw ⊡ input` for a single sample.
    ///
    /// `tgsw` is one spectral TGSW sample; `input` and `out` hold `(k+1)·N`
    /// coefficients each.
    pub fn apply_to_sample(
        &self,
        tgsw: &[Complex64],
        input: &[Torus32],
        out: &mut [Torus32],
        scratch: &mut ExternalProductScratch,
    ) {
        let n = self.params.tlwe.ring_degree;
        let half = self.multiplier.spectral_len();
        let levels = self.params.decomp_length;
        let polys = self.params.tlwe.mask_size + 1;

        // Row `bloc·ℓ + i` of the digit spectra is level `i` of poly `bloc`.
        for (bloc, poly) in input.chunks_exact(n).enumerate() {
            self.decomposer.decompose(poly, &mut scratch.digits);
            for (level, digit) in scratch.digits.chunks_exact(n).enumerate() {
                let row = bloc * levels + level;
                let spectrum = &mut scratch.digit_spectra[row * half..(row + 1) * half];
                self.multiplier
                    .int_to_spectral(digit, spectrum, &mut scratch.ring);
            }
        }

        scratch.acc_spectra.fill(Complex64::default());
        for (row, digit) in scratch.digit_spectra.chunks_exact(half).enumerate() {
            let row_spectra = &tgsw[row * polys * half..(row + 1) * polys * half];
            for (acc, key) in scratch
                .acc_spectra
                .chunks_exact_mut(half)
                .zip(row_spectra.chunks_exact(half))
            {
                multiply_accumulate(acc, digit, key);
            }
        }

        for (acc, poly) in scratch
            .acc_spectra
            .chunks_exact(half)
            .zip(out.chunks_exact_mut(n))
        {
            self.multiplier.spectral_to_torus(acc, poly, &mut scratch.ring);
        }
    }

    /// `out[b] = keys[index] ⊡ input[b]` for the whole batch.
    pub fn apply(
        &self,
        keys: &TGswSpectralArray,
        index: usize,
        input: &TLweSampleArray,
        out: &mut TLweSampleArray,
    ) -> TfheResult<()> {
        self.check_key(keys)?;
        self.check_sample(input)?;
        self.check_sample(out)?;
        ensure_eq("batch size", input.batch_size(), out.batch_size())?;
        if index >= keys.count() {
            return Err(TfheError::invalid(format!(
                "TGSW index {index} out of range for {} samples",
                keys.count()
            )));
        }
        let tgsw = keys.sample(index);
        let len = input.sample_len();
        out.coefs_mut()
            .par_chunks_mut(len)
            .zip(input.coefs().par_chunks(len))
            .for_each_init(
                || self.scratch(),
                |scratch, (o, i)| self.apply_to_sample(tgsw, i, o, scratch),
            );
        Ok(())
    }

    pub(crate) fn check_key(&self, keys: &TGswSpectralArray) -> TfheResult<()> {
        let params = keys.params();
        ensure_eq("ring degree", self.params.tlwe.ring_degree, params.tlwe.ring_degree)?;
        ensure_eq("TLWE mask size", self.params.tlwe.mask_size, params.tlwe.mask_size)?;
        ensure_eq("TGSW decomposition length", self.params.decomp_length, params.decomp_length)?;
        ensure_eq(
            "TGSW decomposition base bits",
            self.params.base_bits as usize,
            params.base_bits as usize,
        )
    }

    pub(crate) fn check_sample(&self, sample: &TLweSampleArray) -> TfheResult<()> {
        ensure_eq("ring degree", self.params.tlwe.ring_degree, sample.ring_degree())?;
        ensure_eq("TLWE mask size", self.params.tlwe.mask_size, sample.mask_size())
    }
}
