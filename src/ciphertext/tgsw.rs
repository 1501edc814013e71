use crate::errors::{TfheResult, ensure_eq};
use crate::params::TGswParams;
use crate::rings::RingMultiplier;
use crate::torus::Torus32;
use rayon::prelude::*;
use num_complex::Complex64;

/// A batch of TGSW samples in coefficient form.
///
/// Each sample is `(k+1)·ℓ` TLWE rows; row `bloc·ℓ + i` carries the message
/// times the gadget value `h_i` on polynomial `bloc`.
#[derive(Debug, Clone, PartialEq)]
pub struct TGswSampleArray {
    params: TGswParams,
    coefs: Vec<Torus32>,
}

impl TGswSampleArray {
    pub fn zeros(params: TGswParams, count: usize) -> Self {
        let len = sample_len(&params, params.tlwe.ring_degree);
        Self {
            params,
            coefs: vec![0; len * count],
        }
    }

    pub fn params(&self) -> &TGswParams {
        &self.params
    }

    pub fn count(&self) -> usize {
        self.coefs.len() / sample_len(&self.params, self.params.tlwe.ring_degree)
    }

    /// Coefficients of row `row` of sample `index`, `(k+1)·N` values.
    pub fn row(&self, index: usize, row: usize) -> &[Torus32] {
        let (start, len) = self.row_range(index, row);
        &self.coefs[start..start + len]
    }

    pub fn row_mut(&mut self, index: usize, row: usize) -> &mut [Torus32] {
        let (start, len) = self.row_range(index, row);
        &mut self.coefs[start..start + len]
    }

    /// Transforms every row polynomial into the twisted spectral domain.
    pub fn to_spectral(&self, multiplier: &RingMultiplier) -> TfheResult<TGswSpectralArray> {
        let n = self.params.tlwe.ring_degree;
        ensure_eq("ring degree", n, multiplier.ring_degree())?;
        let half = multiplier.spectral_len();
        let mut spectral = TGswSpectralArray::zeros(self.params, self.count());
        spectral
            .coefs
            .par_chunks_mut(half)
            .zip(self.coefs.par_chunks(n))
            .for_each_init(
                || multiplier.scratch(),
                |scratch, (out, poly)| multiplier.torus_to_spectral(poly, out, scratch),
            );
        Ok(spectral)
    }

    fn row_range(&self, index: usize, row: usize) -> (usize, usize) {
        let n = self.params.tlwe.ring_degree;
        let row_len = (self.params.tlwe.mask_size + 1) * n;
        let start = index * sample_len(&self.params, n) + row * row_len;
        (start, row_len)
    }
}

/// TGSW samples with every row polynomial cached in spectral form.
///
/// Layout: sample, row, polynomial, then `N/2` spectral coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct TGswSpectralArray {
    params: TGswParams,
    coefs: Vec<Complex64>,
}

impl TGswSpectralArray {
    pub fn zeros(params: TGswParams, count: usize) -> Self {
        let len = sample_len(&params, params.tlwe.spectral_len());
        Self {
            params,
            coefs: vec![Complex64::default(); len * count],
        }
    }

    pub fn from_coefs(params: TGswParams, coefs: Vec<Complex64>) -> TfheResult<Self> {
        let len = sample_len(&params, params.tlwe.spectral_len());
        ensure_eq("TGSW spectral buffer length", coefs.len() / len * len, coefs.len())?;
        Ok(Self { params, coefs })
    }

    pub fn params(&self) -> &TGswParams {
        &self.params
    }

    pub fn count(&self) -> usize {
        self.coefs.len() / sample_len(&self.params, self.params.tlwe.spectral_len())
    }

    /// All rows of sample `index`.
    pub fn sample(&self, index: usize) -> &[Complex64] {
        let len = sample_len(&self.params, self.params.tlwe.spectral_len());
        &self.coefs[index * len..(index + 1) * len]
    }

    pub fn coefs(&self) -> &[Complex64] {
        &self.coefs
    }
}

/// Values per sample when each polynomial holds `poly_len` entries.
fn sample_len(params: &TGswParams, poly_len: usize) -> usize {
    params.row_count() * (params.tlwe.mask_size + 1) * poly_len
}
