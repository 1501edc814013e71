use super::LweSampleArray;
use crate::device::Device;
use crate::errors::{TfheResult, ensure_eq};
use crate::rings::TorusPolynomialArray;
use crate::torus::Torus32;
use rayon::prelude::*;

/// A batch of TLWE samples: `k` mask polynomials followed by the body.
///
/// Sample `b` occupies `coefs[b * (k+1) * N..(b+1) * (k+1) * N]`; inside a
/// sample, polynomial `q < k` is mask `q` and polynomial `k` is the body.
#[derive(Debug, Clone, PartialEq)]
pub struct TLweSampleArray {
    ring_degree: usize,
    mask_size: usize,
    coefs: Vec<Torus32>,
}

impl TLweSampleArray {
    pub fn zeros(ring_degree: usize, mask_size: usize, batch: usize) -> Self {
        Self {
            ring_degree,
            mask_size,
            coefs: vec![0; (mask_size + 1) * ring_degree * batch],
        }
    }

    pub fn zeros_on<D: Device>(
        device: &D,
        ring_degree: usize,
        mask_size: usize,
        batch: usize,
    ) -> TfheResult<Self> {
        Ok(Self {
            ring_degree,
            mask_size,
            coefs: device.alloc_zeroed((mask_size + 1) * ring_degree * batch)?,
        })
    }

    pub fn from_coefs(
        ring_degree: usize,
        mask_size: usize,
        coefs: Vec<Torus32>,
    ) -> TfheResult<Self> {
        let sample_len = (mask_size + 1) * ring_degree;
        ensure_eq(
            "TLWE buffer length",
            coefs.len() / sample_len.max(1) * sample_len,
            coefs.len(),
        )?;
        Ok(Self {
            ring_degree,
            mask_size,
            coefs,
        })
    }

    pub fn ring_degree(&self) -> usize {
        self.ring_degree
    }

    pub fn mask_size(&self) -> usize {
        self.mask_size
    }

    /// Coefficients per sample, `(k+1)·N`.
    pub fn sample_len(&self) -> usize {
        (self.mask_size + 1) * self.ring_degree
    }

    pub fn batch_size(&self) -> usize {
        self.coefs.len() / self.sample_len()
    }

    pub fn coefs(&self) -> &[Torus32] {
        &self.coefs
    }

    pub fn coefs_mut(&mut self) -> &mut [Torus32] {
        &mut self.coefs
    }

    pub fn sample(&self, index: usize) -> &[Torus32] {
        let len = self.sample_len();
        &self.coefs[index * len..(index + 1) * len]
    }

    pub fn sample_mut(&mut self, index: usize) -> &mut [Torus32] {
        let len = self.sample_len();
        &mut self.coefs[index * len..(index + 1) * len]
    }

    /// Polynomial `poly` (mask `q < k`, body `k`) of sample `index`.
    pub fn poly(&self, index: usize, poly: usize) -> &[Torus32] {
        let start = index * self.sample_len() + poly * self.ring_degree;
        &self.coefs[start..start + self.ring_degree]
    }

    pub fn body(&self, index: usize) -> &[Torus32] {
        self.poly(index, self.mask_size)
    }

    /// Noiseless encryptions `(0, …, 0, bodies[b])`.
    pub fn assign_trivial(&mut self, bodies: &TorusPolynomialArray) -> TfheResult<()> {
        self.check_polys(bodies)?;
        let mask_len = self.mask_size * self.ring_degree;
        let len = self.sample_len();
        self.coefs
            .par_chunks_mut(len)
            .zip(bodies.coefs().par_chunks(self.ring_degree))
            .for_each(|(sample, body)| {
                let (mask, b) = sample.split_at_mut(mask_len);
                mask.fill(0);
                b.copy_from_slice(body);
            });
        Ok(())
    }

    pub fn add_assign(&mut self, other: &Self) -> TfheResult<()> {
        self.check_shape(other)?;
        self.coefs
            .par_iter_mut()
            .zip(other.coefs.par_iter())
            .for_each(|(x, &y)| *x = x.wrapping_add(y));
        Ok(())
    }

    pub fn copy_from(&mut self, other: &Self) -> TfheResult<()> {
        self.check_shape(other)?;
        self.coefs.copy_from_slice(&other.coefs);
        Ok(())
    }

    /// Extracts coefficient 0 of every sample as an LWE sample of dimension
    /// `k·N` under the flattened key.
    pub fn extract_lwe_into(&self, out: &mut LweSampleArray) -> TfheResult<()> {
        let n = self.mask_size * self.ring_degree;
        ensure_eq("extracted LWE dimension", n, out.dimension())?;
        ensure_eq("batch size", self.batch_size(), out.batch_size())?;
        let ring_degree = self.ring_degree;
        let (mask, body) = out.parts_mut();
        mask.par_chunks_mut(n.max(1))
            .zip(body.par_iter_mut())
            .zip(self.coefs.par_chunks(self.sample_len()))
            .for_each(|((a_out, b_out), sample)| {
                let (a_in, b_in) = sample.split_at(n);
                for (a_out, a) in a_out
                    .chunks_exact_mut(ring_degree)
                    .zip(a_in.chunks_exact(ring_degree))
                {
                    a_out[0] = a[0];
                    for j in 1..ring_degree {
                        a_out[j] = a[ring_degree - j].wrapping_neg();
                    }
                }
                *b_out = b_in[0];
            });
        Ok(())
    }

    pub fn extract_lwe(&self) -> TfheResult<LweSampleArray> {
        let mut out =
            LweSampleArray::zeros(self.mask_size * self.ring_degree, self.batch_size());
        self.extract_lwe_into(&mut out)?;
        Ok(out)
    }

    fn check_shape(&self, other: &Self) -> TfheResult<()> {
        ensure_eq("ring degree", self.ring_degree, other.ring_degree)?;
        ensure_eq("TLWE mask size", self.mask_size, other.mask_size)?;
        ensure_eq("batch size", self.batch_size(), other.batch_size())
    }

    fn check_polys(&self, polys: &TorusPolynomialArray) -> TfheResult<()> {
        ensure_eq("ring degree", self.ring_degree, polys.ring_degree())?;
        ensure_eq("batch size", self.batch_size(), polys.batch_size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_samples_have_zero_mask() {
        let bodies = TorusPolynomialArray::from_coefs(4, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let mut acc = TLweSampleArray::zeros(4, 2, 2);
        acc.coefs_mut().fill(-1);
        acc.assign_trivial(&bodies).unwrap();
        assert_eq!(acc.poly(0, 0), &[0; 4]);
        assert_eq!(acc.poly(1, 1), &[0; 4]);
        assert_eq!(acc.body(0), &[1, 2, 3, 4]);
        assert_eq!(acc.body(1), &[5, 6, 7, 8]);
    }

    #[test]
    fn extraction_negates_wrapped_coefficients() {
        // k = 1, N = 4, one sample: a = [1, 2, 3, 4], b = [9, 0, 0, 0].
        let acc = TLweSampleArray::from_coefs(4, 1, vec![1, 2, 3, 4, 9, 0, 0, 0]).unwrap();
        let lwe = acc.extract_lwe().unwrap();
        assert_eq!(lwe.dimension(), 4);
        assert_eq!(lwe.mask_of(0), &[1, -4, -3, -2]);
        assert_eq!(lwe.body(), &[9]);
    }

    #[test]
    fn extraction_phase_matches_constant_coefficient() {
        // Phase of coefficient 0 under s = 1 + X^2 equals extracted phase
        // under the flattened key [1, 0, 1, 0].
        let a = [5, -7, 11, 13];
        let body: [Torus32; 4] = [100, 0, 0, 0];
        let s = [1, 0, 1, 0];
        let product = crate::rings::naive::negacyclic_mul_int_torus(&s, &a);
        let expected = body[0].wrapping_sub(product[0]);

        let mut coefs = a.to_vec();
        coefs.extend_from_slice(&body);
        let lwe = TLweSampleArray::from_coefs(4, 1, coefs)
            .unwrap()
            .extract_lwe()
            .unwrap();
        let dot: i32 = lwe
            .mask_of(0)
            .iter()
            .zip(&s)
            .fold(0i32, |acc, (&a, &s)| acc.wrapping_add(a.wrapping_mul(s)));
        assert_eq!(lwe.body()[0].wrapping_sub(dot), expected);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let mut a = TLweSampleArray::zeros(4, 1, 2);
        let b = TLweSampleArray::zeros(4, 1, 3);
        assert!(a.add_assign(&b).is_err());
        assert!(a.copy_from(&TLweSampleArray::zeros(8, 1, 2)).is_err());
        let mut lwe = LweSampleArray::zeros(8, 2);
        assert!(a.extract_lwe_into(&mut lwe).is_err());
    }
}
