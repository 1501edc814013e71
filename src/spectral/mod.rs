//! Real-valued spectral transforms specialized for `Z[X]/(X^N + 1)`.
//!
//! Four batched transforms share one plan of size `N`:
//! - [`SpectralPlan::forward_real`]: `N` reals to `N/2 + 1` complex bins
//!   (unnormalized, the usual real-FFT contract);
//! - [`SpectralPlan::inverse_real`]: its exact inverse (divides by `N`,
//!   ignores the imaginary parts of the DC and Nyquist bins);
//! - [`SpectralPlan::forward_twisted`]: `N` reals, read as the first half of
//!   the antiperiodic sequence `[x, -x]`, to the `N/2` odd-indexed bins of
//!   its length-`2N` real transform;
//! - [`SpectralPlan::inverse_twisted`]: `N/2` complex values back to `N`
//!   reals.
//!
//! Negacyclic convolution becomes a pointwise product in the twisted
//! domain: `a * b mod X^N + 1 == inverse_twisted(A ⊙ B) / 2`.
//!
//! Batched entry points take contiguous buffers holding any number of rows
//! back to back and process the rows in parallel.
mod real;
mod twisted;

use crate::errors::{TfheError, TfheResult, ensure_eq};
use rayon::prelude::*;
use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

/// Precomputed FFTs and twiddles for transforms of size `N`.
pub struct SpectralPlan {
    size: usize,
    /// `N/2`-point forward FFT (`e^{-2πi/h}` kernel).
    forward: Arc<dyn Fft<f64>>,
    /// `N/2`-point unnormalized inverse FFT.
    inverse: Arc<dyn Fft<f64>>,
    /// `e^{-2πik/N}` for `k in 0..=N/2`.
    real_twiddles: Vec<Complex64>,
    /// `e^{iπj/N}` for `j in 0..N/2`.
    twist: Vec<Complex64>,
    fft_scratch_len: usize,
}

/// Per-thread working memory for one row transform.
pub struct TransformScratch {
    work: Vec<Complex64>,
    fft: Vec<Complex64>,
}

impl std::fmt::Debug for SpectralPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectralPlan").field("size", &self.size).finish()
    }
}

impl SpectralPlan {
    /// Builds a plan for length-`size` real inputs.
    ///
    /// `size` must be a power of two and at least 4.
    pub fn new(size: usize) -> TfheResult<Self> {
        if !size.is_power_of_two() || size < 4 {
            return Err(TfheError::invalid(format!(
                "transform size must be a power of two >= 4, got {size}"
            )));
        }
        let half = size / 2;
        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(half);
        let inverse = planner.plan_fft_inverse(half);
        let fft_scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        let real_twiddles = (0..=half)
            .map(|k| Complex64::from_polar(1.0, -2.0 * PI * k as f64 / size as f64))
            .collect();
        let twist = (0..half)
            .map(|j| Complex64::from_polar(1.0, PI * j as f64 / size as f64))
            .collect();

        Ok(Self {
            size,
            forward,
            inverse,
            real_twiddles,
            twist,
            fft_scratch_len,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Length of one real-transform spectrum, `N/2 + 1`.
    pub fn real_spectrum_len(&self) -> usize {
        self.size / 2 + 1
    }

    /// Length of one twisted spectrum, `N/2`.
    pub fn twisted_spectrum_len(&self) -> usize {
        self.size / 2
    }

    pub fn scratch(&self) -> TransformScratch {
        TransformScratch {
            work: vec![Complex64::new(0.0, 0.0); self.size / 2],
            fft: vec![Complex64::new(0.0, 0.0); self.fft_scratch_len],
        }
    }

    pub fn forward_real(&self, input: &[f64], output: &mut [Complex64]) -> TfheResult<()> {
        let rows = self.batch_rows(input.len(), self.size)?;
        ensure_eq("real spectrum buffer length", rows * self.real_spectrum_len(), output.len())?;
        input
            .par_chunks(self.size)
            .zip(output.par_chunks_mut(self.real_spectrum_len()))
            .for_each_init(
                || self.scratch(),
                |scratch, (x, out)| self.forward_real_row(x, out, scratch),
            );
        Ok(())
    }

    pub fn inverse_real(&self, input: &[Complex64], output: &mut [f64]) -> TfheResult<()> {
        let rows = self.batch_rows(input.len(), self.real_spectrum_len())?;
        ensure_eq("real signal buffer length", rows * self.size, output.len())?;
        input
            .par_chunks(self.real_spectrum_len())
            .zip(output.par_chunks_mut(self.size))
            .for_each_init(
                || self.scratch(),
                |scratch, (spectrum, out)| self.inverse_real_row(spectrum, out, scratch),
            );
        Ok(())
    }

    pub fn forward_twisted(&self, input: &[f64], output: &mut [Complex64]) -> TfheResult<()> {
        let rows = self.batch_rows(input.len(), self.size)?;
        ensure_eq(
            "twisted spectrum buffer length",
            rows * self.twisted_spectrum_len(),
            output.len(),
        )?;
        input
            .par_chunks(self.size)
            .zip(output.par_chunks_mut(self.twisted_spectrum_len()))
            .for_each_init(
                || self.scratch(),
                |scratch, (x, out)| self.forward_twisted_row(x, out, scratch),
            );
        Ok(())
    }

    pub fn inverse_twisted(&self, input: &[Complex64], output: &mut [f64]) -> TfheResult<()> {
        let rows = self.batch_rows(input.len(), self.twisted_spectrum_len())?;
        ensure_eq("twisted signal buffer length", rows * self.size, output.len())?;
        input
            .par_chunks(self.twisted_spectrum_len())
            .zip(output.par_chunks_mut(self.size))
            .for_each_init(
                || self.scratch(),
                |scratch, (spectrum, out)| {
                    self.inverse_twisted_row(spectrum, out, 1.0, scratch)
                },
            );
        Ok(())
    }

    fn batch_rows(&self, len: usize, row_len: usize) -> TfheResult<usize> {
        if len % row_len != 0 {
            return Err(TfheError::ParameterMismatch {
                what: "batched buffer length (multiple of row length)",
                expected: (len / row_len + 1) * row_len,
                actual: len,
            });
        }
        Ok(len / row_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn signal(len: usize, seed: f64) -> Vec<f64> {
        (0..len)
            .map(|i| ((i as f64 + 1.0) * seed).sin() * 3.0 - (i % 5) as f64 * 0.25)
            .collect()
    }

    // O(N^2) reference: bin k of the DFT of a real sequence.
    fn naive_dft_bin(x: &[f64], k: usize) -> Complex64 {
        let n = x.len() as f64;
        x.iter()
            .enumerate()
            .map(|(j, &v)| Complex64::from_polar(v, -2.0 * PI * (k * j) as f64 / n))
            .sum()
    }

    #[test]
    fn rejects_bad_sizes() {
        assert!(SpectralPlan::new(3).is_err());
        assert!(SpectralPlan::new(2).is_err());
        assert!(SpectralPlan::new(48).is_err());
        assert!(SpectralPlan::new(4).is_ok());
    }

    #[test]
    fn forward_real_matches_naive_dft() {
        let plan = SpectralPlan::new(16).unwrap();
        let x = signal(16, 0.7);
        let mut out = vec![Complex64::new(0.0, 0.0); 9];
        plan.forward_real(&x, &mut out).unwrap();
        for (k, bin) in out.iter().enumerate() {
            let expected = naive_dft_bin(&x, k);
            assert_abs_diff_eq!(bin.re, expected.re, epsilon = 1e-9);
            assert_abs_diff_eq!(bin.im, expected.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn forward_twisted_matches_doubled_sequence() {
        let plan = SpectralPlan::new(16).unwrap();
        let x = signal(16, 1.3);
        let doubled: Vec<f64> = x.iter().copied().chain(x.iter().map(|v| -v)).collect();
        let mut out = vec![Complex64::new(0.0, 0.0); 8];
        plan.forward_twisted(&x, &mut out).unwrap();
        for (m, bin) in out.iter().enumerate() {
            let expected = naive_dft_bin(&doubled, 2 * m + 1);
            assert_abs_diff_eq!(bin.re, expected.re, epsilon = 1e-9);
            assert_abs_diff_eq!(bin.im, expected.im, epsilon = 1e-9);
        }
    }

    #[test]
    fn real_round_trip_smallest_size() {
        let plan = SpectralPlan::new(4).unwrap();
        let x = vec![1.0, -2.0, 0.5, 4.0];
        let mut spectrum = vec![Complex64::new(0.0, 0.0); 3];
        let mut back = vec![0.0; 4];
        plan.forward_real(&x, &mut spectrum).unwrap();
        plan.inverse_real(&spectrum, &mut back).unwrap();
        for (a, b) in x.iter().zip(&back) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn twisted_round_trip_batched() {
        let plan = SpectralPlan::new(32).unwrap();
        let x = signal(32 * 3, 0.31);
        let mut spectrum = vec![Complex64::new(0.0, 0.0); 16 * 3];
        let mut back = vec![0.0; 32 * 3];
        plan.forward_twisted(&x, &mut spectrum).unwrap();
        plan.inverse_twisted(&spectrum, &mut back).unwrap();
        for (a, b) in x.iter().zip(&back) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-10);
        }
    }

    #[test]
    fn buffer_length_mismatch_is_reported() {
        let plan = SpectralPlan::new(8).unwrap();
        let x = vec![0.0; 16];
        let mut short = vec![Complex64::new(0.0, 0.0); 5];
        assert!(matches!(
            plan.forward_real(&x, &mut short),
            Err(TfheError::ParameterMismatch { .. })
        ));
        let ragged = vec![0.0; 12];
        let mut out = vec![Complex64::new(0.0, 0.0); 8];
        assert!(plan.forward_twisted(&ragged, &mut out).is_err());
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let plan = SpectralPlan::new(8).unwrap();
        let mut out: Vec<Complex64> = Vec::new();
        plan.forward_twisted(&[], &mut out).unwrap();
    }
}
