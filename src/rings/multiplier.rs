use crate::errors::{TfheResult, ensure_eq};
use crate::spectral::{SpectralPlan, TransformScratch};
use crate::torus::Torus32;
use rayon::prelude::*;
use rustfft::num_complex::Complex64;
use std::sync::Arc;

/// Polynomial multiplication mod `X^N + 1` through the twisted transform.
///
/// Operands are moved to the spectral domain once, multiplied pointwise
/// (optionally summing several products) and brought back with a single
/// inverse transform scaled by `1/2`.
#[derive(Debug, Clone)]
pub struct RingMultiplier {
    plan: Arc<SpectralPlan>,
}

/// Working memory for one polynomial at a time.
pub struct MultiplierScratch {
    transform: TransformScratch,
    real: Vec<f64>,
}

impl RingMultiplier {
    pub fn new(ring_degree: usize) -> TfheResult<Self> {
        Ok(Self::from_plan(Arc::new(SpectralPlan::new(ring_degree)?)))
    }

    pub fn from_plan(plan: Arc<SpectralPlan>) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &Arc<SpectralPlan> {
        &self.plan
    }

    pub fn ring_degree(&self) -> usize {
        self.plan.size()
    }

    pub fn spectral_len(&self) -> usize {
        self.plan.twisted_spectrum_len()
    }

    pub fn scratch(&self) -> MultiplierScratch {
        MultiplierScratch {
            transform: self.plan.scratch(),
            real: vec![0.0; self.plan.size()],
        }
    }

    // ─── Row-level primitives ────────────────────────────────────────────────

    pub fn real_to_spectral(
        &self,
        poly: &[f64],
        out: &mut [Complex64],
        scratch: &mut MultiplierScratch,
    ) {
        self.plan.forward_twisted_row(poly, out, &mut scratch.transform);
    }

    /// Torus coefficients enter the transform as centered integers.
    pub fn torus_to_spectral(
        &self,
        poly: &[Torus32],
        out: &mut [Complex64],
        scratch: &mut MultiplierScratch,
    ) {
        for (r, &c) in scratch.real.iter_mut().zip(poly) {
            *r = c as f64;
        }
        self.plan
            .forward_twisted_row(&scratch.real, out, &mut scratch.transform);
    }

    pub fn int_to_spectral(
        &self,
        poly: &[i32],
        out: &mut [Complex64],
        scratch: &mut MultiplierScratch,
    ) {
        self.torus_to_spectral(poly, out, scratch);
    }

    /// Inverse of a product spectrum, rounded onto the torus.
    pub fn spectral_to_torus(
        &self,
        spectrum: &[Complex64],
        out: &mut [Torus32],
        scratch: &mut MultiplierScratch,
    ) {
        self.plan
            .inverse_twisted_row(spectrum, &mut scratch.real, 0.5, &mut scratch.transform);
        for (o, &r) in out.iter_mut().zip(&scratch.real) {
            *o = round_to_torus(r);
        }
    }

    /// Inverse of a product spectrum as reals.
    pub fn spectral_to_real(
        &self,
        spectrum: &[Complex64],
        out: &mut [f64],
        scratch: &mut MultiplierScratch,
    ) {
        self.plan
            .inverse_twisted_row(spectrum, out, 0.5, &mut scratch.transform);
    }

    // ─── Batched products ────────────────────────────────────────────────────

    /// `out[b] = a[b] * c[b] mod X^N + 1` over the reals.
    pub fn multiply_real(&self, a: &[f64], c: &[f64], out: &mut [f64]) -> TfheResult<()> {
        let n = self.ring_degree();
        self.check_batch(a.len(), c.len(), out.len())?;
        let len = self.spectral_len();
        a.par_chunks(n)
            .zip(c.par_chunks(n))
            .zip(out.par_chunks_mut(n))
            .for_each_init(
                || (self.scratch(), vec![Complex64::default(); 2 * len]),
                |(scratch, spectra), ((x, y), o)| {
                    let (sx, sy) = spectra.split_at_mut(len);
                    self.real_to_spectral(x, sx, scratch);
                    self.real_to_spectral(y, sy, scratch);
                    pointwise_mul_assign(sx, sy);
                    self.spectral_to_real(sx, o, scratch);
                },
            );
        Ok(())
    }

    /// `out[b] = ints[b] * torus[b] mod X^N + 1` for a batch of pairs.
    pub fn multiply_int_torus(
        &self,
        ints: &[i32],
        torus: &[Torus32],
        out: &mut [Torus32],
    ) -> TfheResult<()> {
        let n = self.ring_degree();
        self.check_batch(ints.len(), torus.len(), out.len())?;
        let len = self.spectral_len();
        ints.par_chunks(n)
            .zip(torus.par_chunks(n))
            .zip(out.par_chunks_mut(n))
            .for_each_init(
                || (self.scratch(), vec![Complex64::default(); 2 * len]),
                |(scratch, spectra), ((x, y), o)| {
                    let (sx, sy) = spectra.split_at_mut(len);
                    self.int_to_spectral(x, sx, scratch);
                    self.torus_to_spectral(y, sy, scratch);
                    pointwise_mul_assign(sx, sy);
                    self.spectral_to_torus(sx, o, scratch);
                },
            );
        Ok(())
    }

    /// `out = Σ_q ints[q] * torus[q] mod X^N + 1` with one inverse transform.
    pub fn multiply_sum_int_torus(
        &self,
        ints: &[&[i32]],
        torus: &[&[Torus32]],
        out: &mut [Torus32],
        scratch: &mut MultiplierScratch,
    ) -> TfheResult<()> {
        let n = self.ring_degree();
        ensure_eq("product term count", ints.len(), torus.len())?;
        ensure_eq("ring degree", n, out.len())?;
        let len = self.spectral_len();
        let mut sum = vec![Complex64::default(); len];
        let mut sx = vec![Complex64::default(); len];
        let mut sy = vec![Complex64::default(); len];
        for (x, y) in ints.iter().zip(torus) {
            ensure_eq("ring degree", n, x.len())?;
            ensure_eq("ring degree", n, y.len())?;
            self.int_to_spectral(x, &mut sx, scratch);
            self.torus_to_spectral(y, &mut sy, scratch);
            multiply_accumulate(&mut sum, &sx, &sy);
        }
        self.spectral_to_torus(&sum, out, scratch);
        Ok(())
    }

    fn check_batch(&self, a: usize, b: usize, out: usize) -> TfheResult<()> {
        let n = self.ring_degree();
        ensure_eq("operand length (multiple of ring degree)", a / n * n, a)?;
        ensure_eq("operand length", a, b)?;
        ensure_eq("output length", a, out)
    }
}

/// `acc += a ⊙ b`.
#[inline]
pub fn multiply_accumulate(acc: &mut [Complex64], a: &[Complex64], b: &[Complex64]) {
    for ((s, x), y) in acc.iter_mut().zip(a).zip(b) {
        *s += *x * *y;
    }
}

/// `a ⊙= b`.
#[inline]
pub fn pointwise_mul_assign(a: &mut [Complex64], b: &[Complex64]) {
    for (x, y) in a.iter_mut().zip(b) {
        *x *= *y;
    }
}

/// Nearest integer (ties to even), reduced modulo 2^32.
#[inline]
pub(crate) fn round_to_torus(value: f64) -> Torus32 {
    value.round_ties_even() as i64 as Torus32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rings::naive::{negacyclic_mul_int_torus, negacyclic_mul_real};
    use approx::assert_abs_diff_eq;

    #[test]
    fn small_real_product_matches_schoolbook() {
        let mul = RingMultiplier::new(4).unwrap();
        let a = [5.0, 6.0, 7.0, 8.0];
        let b = [1.0, 2.0, 3.0, 4.0];
        let mut out = [0.0; 4];
        mul.multiply_real(&a, &b, &mut out).unwrap();
        for (x, y) in out.iter().zip(negacyclic_mul_real(&a, &b)) {
            assert_abs_diff_eq!(*x, y, epsilon = 1e-9);
        }
    }

    #[test]
    fn int_torus_product_is_exact() {
        let mul = RingMultiplier::new(64).unwrap();
        let ints: Vec<i32> = (0..64).map(|i| (i % 7) - 3).collect();
        let torus: Vec<Torus32> = (0..64)
            .map(|i: i32| i.wrapping_mul(0x3779_B97F).wrapping_add(0x1234_5678))
            .collect();
        let mut out = vec![0; 64];
        mul.multiply_int_torus(&ints, &torus, &mut out).unwrap();
        assert_eq!(out, negacyclic_mul_int_torus(&ints, &torus));
    }

    #[test]
    fn accumulated_products_need_one_inverse() {
        let mul = RingMultiplier::new(16).unwrap();
        let mut scratch = mul.scratch();
        let s0: Vec<i32> = (0..16).map(|i| i & 1).collect();
        let s1: Vec<i32> = (0..16).map(|i| (i >> 1) & 1).collect();
        let a0: Vec<Torus32> = (0..16).map(|i| i * 1_000_003).collect();
        let a1: Vec<Torus32> = (0..16).map(|i| -i * 77_777).collect();
        let mut out = vec![0; 16];
        mul.multiply_sum_int_torus(&[&s0, &s1], &[&a0, &a1], &mut out, &mut scratch)
            .unwrap();
        let p0 = negacyclic_mul_int_torus(&s0, &a0);
        let p1 = negacyclic_mul_int_torus(&s1, &a1);
        let expected: Vec<Torus32> =
            p0.iter().zip(&p1).map(|(x, y)| x.wrapping_add(*y)).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn rejects_ragged_batches() {
        let mul = RingMultiplier::new(8).unwrap();
        let mut out = vec![0.0; 8];
        assert!(mul.multiply_real(&[0.0; 8], &[0.0; 16], &mut out).is_err());
        assert!(mul.multiply_real(&[0.0; 6], &[0.0; 6], &mut [0.0; 6]).is_err());
    }

    #[test]
    fn spectral_rounding_ties_to_even() {
        assert_eq!(round_to_torus(0.5), 0);
        assert_eq!(round_to_torus(1.5), 2);
        assert_eq!(round_to_torus(-2.5), -2);
        assert_eq!(round_to_torus(2.4999), 2);
        assert_eq!(round_to_torus(4_294_967_299.0), 3);
    }
}
