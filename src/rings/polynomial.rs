use crate::device::Device;
use crate::errors::{TfheResult, ensure_eq};
use crate::torus::Torus32;
use rayon::prelude::*;

/// A batch of torus polynomials of degree `< N`, stored back to back.
///
/// # Invariants
/// - `coefs.len() == batch * ring_degree`
/// - `ring_degree` is a power of two
#[derive(Debug, Clone, PartialEq)]
pub struct TorusPolynomialArray {
    ring_degree: usize,
    coefs: Vec<Torus32>,
}

impl TorusPolynomialArray {
    pub fn zeros(ring_degree: usize, batch: usize) -> Self {
        Self {
            ring_degree,
            coefs: vec![0; ring_degree * batch],
        }
    }

    pub fn zeros_on<D: Device>(device: &D, ring_degree: usize, batch: usize) -> TfheResult<Self> {
        Ok(Self {
            ring_degree,
            coefs: device.alloc_zeroed(ring_degree * batch)?,
        })
    }

    pub fn from_coefs(ring_degree: usize, coefs: Vec<Torus32>) -> TfheResult<Self> {
        let batch = coefs.len() / ring_degree.max(1);
        ensure_eq("polynomial buffer length", batch * ring_degree, coefs.len())?;
        Ok(Self { ring_degree, coefs })
    }

    pub fn ring_degree(&self) -> usize {
        self.ring_degree
    }

    pub fn batch_size(&self) -> usize {
        self.coefs.len() / self.ring_degree
    }

    pub fn coefs(&self) -> &[Torus32] {
        &self.coefs
    }

    pub fn coefs_mut(&mut self) -> &mut [Torus32] {
        &mut self.coefs
    }

    pub fn poly(&self, index: usize) -> &[Torus32] {
        &self.coefs[index * self.ring_degree..(index + 1) * self.ring_degree]
    }

    pub fn fill(&mut self, value: Torus32) {
        self.coefs.fill(value);
    }

    /// `self[b] = X^{±shifts[b]} · input[b]` for every batch element.
    ///
    /// With `invert` set the exponent is `2N - shifts[b]`, i.e. `X^{-shift}`.
    pub fn assign_mul_by_monomial(
        &mut self,
        input: &Self,
        shifts: &[u32],
        invert: bool,
    ) -> TfheResult<()> {
        ensure_eq("ring degree", self.ring_degree, input.ring_degree)?;
        ensure_eq("batch size", self.batch_size(), input.batch_size())?;
        ensure_eq("monomial shift count", self.batch_size(), shifts.len())?;
        let two_n = 2 * self.ring_degree;
        self.coefs
            .par_chunks_mut(self.ring_degree)
            .zip(input.coefs.par_chunks(self.ring_degree))
            .zip(shifts.par_iter())
            .for_each(|((out, poly), &shift)| {
                let shift = shift as usize % two_n;
                let exponent = if invert { (two_n - shift) % two_n } else { shift };
                mul_by_monomial(out, poly, exponent);
            });
        Ok(())
    }
}

/// `out = X^exponent · input` in `T[X]/(X^N + 1)`, exponent taken mod `2N`.
///
/// A coefficient permutation: terms wrapping past `X^N` change sign.
pub fn mul_by_monomial(out: &mut [Torus32], input: &[Torus32], exponent: usize) {
    let n = input.len();
    debug_assert_eq!(out.len(), n);
    if n == 0 {
        return;
    }
    let exponent = exponent % (2 * n);
    if exponent < n {
        for j in 0..exponent {
            out[j] = input[j + n - exponent].wrapping_neg();
        }
        out[exponent..].copy_from_slice(&input[..n - exponent]);
    } else {
        let shift = exponent - n;
        out[..shift].copy_from_slice(&input[n - shift..]);
        for j in shift..n {
            out[j] = input[j - shift].wrapping_neg();
        }
    }
}

/// `out = (X^exponent - 1) · input`, exponent taken mod `2N`.
pub fn mul_by_monomial_minus_one(out: &mut [Torus32], input: &[Torus32], exponent: usize) {
    let n = input.len();
    debug_assert_eq!(out.len(), n);
    if n == 0 {
        return;
    }
    let exponent = exponent % (2 * n);
    if exponent < n {
        for j in 0..exponent {
            out[j] = input[j + n - exponent]
                .wrapping_neg()
                .wrapping_sub(input[j]);
        }
        for j in exponent..n {
            out[j] = input[j - exponent].wrapping_sub(input[j]);
        }
    } else {
        let shift = exponent - n;
        for j in 0..shift {
            out[j] = input[j + n - shift].wrapping_sub(input[j]);
        }
        for j in shift..n {
            out[j] = input[j - shift].wrapping_neg().wrapping_sub(input[j]);
        }
    }
}
