//! Length-`N` real FFT computed with one `N/2`-point complex FFT.
//!
//! Even and odd samples are packed as `z_j = x_{2j} + i·x_{2j+1}`; the two
//! half-length spectra are separated using conjugate symmetry and merged
//! with the `e^{-2πik/N}` twiddles.
use super::{SpectralPlan, TransformScratch};
use rustfft::num_complex::Complex64;

impl SpectralPlan {
    pub(crate) fn forward_real_row(
        &self,
        x: &[f64],
        out: &mut [Complex64],
        scratch: &mut TransformScratch,
    ) {
        let half = self.size / 2;
        debug_assert_eq!(x.len(), self.size);
        debug_assert_eq!(out.len(), half + 1);

        let work = &mut scratch.work[..half];
        for (z, pair) in work.iter_mut().zip(x.chunks_exact(2)) {
            *z = Complex64::new(pair[0], pair[1]);
        }
        self.forward.process_with_scratch(work, &mut scratch.fft);

        for (k, bin) in out.iter_mut().enumerate() {
            let z = work[k % half];
            let mirrored = work[(half - k) % half].conj();
            let even = (z + mirrored) * 0.5;
            let odd = (z - mirrored) * Complex64::new(0.0, -0.5);
            *bin = even + self.real_twiddles[k] * odd;
        }
    }

    pub(crate) fn inverse_real_row(
        &self,
        spectrum: &[Complex64],
        out: &mut [f64],
        scratch: &mut TransformScratch,
    ) {
        let half = self.size / 2;
        debug_assert_eq!(spectrum.len(), half + 1);
        debug_assert_eq!(out.len(), self.size);

        // DC and Nyquist bins of a real signal are real.
        let dc = Complex64::new(spectrum[0].re, 0.0);
        let nyquist = Complex64::new(spectrum[half].re, 0.0);

        let work = &mut scratch.work[..half];
        for (k, z) in work.iter_mut().enumerate() {
            let (bin, mirrored) = if k == 0 {
                (dc, nyquist)
            } else {
                (spectrum[k], spectrum[half - k].conj())
            };
            let even = (bin + mirrored) * 0.5;
            let odd = (bin - mirrored) * self.real_twiddles[k].conj() * 0.5;
            *z = even + Complex64::new(-odd.im, odd.re);
        }
        self.inverse.process_with_scratch(work, &mut scratch.fft);

        let scale = 1.0 / half as f64;
        for (pair, z) in out.chunks_exact_mut(2).zip(work.iter()) {
            pair[0] = z.re * scale;
            pair[1] = z.im * scale;
        }
    }
}
