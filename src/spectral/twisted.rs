//! Negacyclic ("twisted") transform of length `N` using one `N/2`-point FFT.
//!
//! With `ζ = e^{iπ/N}` and `P(z) = Σ x_j z^j`, the odd bins of the
//! length-`2N` transform of `[x, -x]` are `Y[k] = 2·P(ζ^{-k})`. Folding
//! `w_j = (x_j + i·x_{j+N/2})·ζ^j` gives `F[p] = P(ζ^{4p+1})` as an
//! `N/2`-point inverse FFT of `w`. Conjugate symmetry of a real input then
//! places every `F[p]` at exactly one odd bin:
//! - `Y[4p+1] = 2·conj(F[p])`
//! - `Y[4p+3] = 2·F[N/2 - 1 - p]`
use super::{SpectralPlan, TransformScratch};
use rustfft::num_complex::Complex64;

impl SpectralPlan {
    pub(crate) fn forward_twisted_row(
        &self,
        x: &[f64],
        out: &mut [Complex64],
        scratch: &mut TransformScratch,
    ) {
        let half = self.size / 2;
        debug_assert_eq!(x.len(), self.size);
        debug_assert_eq!(out.len(), half);

        let (low, high) = x.split_at(half);
        let work = &mut scratch.work[..half];
        for (j, w) in work.iter_mut().enumerate() {
            *w = Complex64::new(low[j], high[j]) * self.twist[j];
        }
        self.inverse.process_with_scratch(work, &mut scratch.fft);

        for (p, pair) in out.chunks_exact_mut(2).enumerate() {
            pair[0] = work[p].conj() * 2.0;
            pair[1] = work[half - 1 - p] * 2.0;
        }
    }

    /// Inverse twisted transform, multiplying the result by `scale`.
    pub(crate) fn inverse_twisted_row(
        &self,
        spectrum: &[Complex64],
        out: &mut [f64],
        scale: f64,
        scratch: &mut TransformScratch,
    ) {
        let half = self.size / 2;
        debug_assert_eq!(spectrum.len(), half);
        debug_assert_eq!(out.len(), self.size);

        let work = &mut scratch.work[..half];
        for (p, pair) in spectrum.chunks_exact(2).enumerate() {
            work[p] = pair[0].conj() * 0.5;
            work[half - 1 - p] = pair[1] * 0.5;
        }
        self.forward.process_with_scratch(work, &mut scratch.fft);

        let norm = scale / half as f64;
        let (low, high) = out.split_at_mut(half);
        for (j, w) in work.iter().enumerate() {
            let untwisted = *w * self.twist[j].conj() * norm;
            low[j] = untwisted.re;
            high[j] = untwisted.im;
        }
    }
}
