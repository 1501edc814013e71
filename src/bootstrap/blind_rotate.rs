//! Blind rotation: `acc ← X^{Σ bara_i·s_i} · acc`, one key bit at a time.
//!
//! Step `i` computes `acc ← acc + BK_i ⊡ ((X^{bara_i} - 1)·acc)`. Steps are
//! strictly sequential; inside a step every batch element is independent.
use super::external_product::{ExternalProduct, ExternalProductScratch};
use crate::ciphertext::{TGswSpectralArray, TLweSampleArray};
use crate::device::Device;
use crate::errors::{TfheError, TfheResult, ensure_eq};
use crate::rings::mul_by_monomial_minus_one;
use crate::torus::Torus32;
use rayon::prelude::*;
use num_complex::Complex64;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Primary,
    Secondary,
}

/// Two accumulator buffers; each step reads the current one and writes the
/// other, then the roles flip.
struct PingPong<'a> {
    primary: &'a mut TLweSampleArray,
    secondary: TLweSampleArray,
    current: Slot,
}

impl<'a> PingPong<'a> {
    fn new(primary: &'a mut TLweSampleArray, secondary: TLweSampleArray) -> Self {
        Self {
            primary,
            secondary,
            current: Slot::Primary,
        }
    }

    /// `(current, other)`.
    fn split(&mut self) -> (&TLweSampleArray, &mut TLweSampleArray) {
        match self.current {
            Slot::Primary => (&*self.primary, &mut self.secondary),
            Slot::Secondary => (&self.secondary, &mut *self.primary),
        }
    }

    fn flip(&mut self) {
        self.current = match self.current {
            Slot::Primary => Slot::Secondary,
            Slot::Secondary => Slot::Primary,
        };
    }

    /// Leaves the final accumulator in the primary buffer.
    fn finish(self) -> TfheResult<()> {
        if self.current == Slot::Secondary {
            self.primary.copy_from(&self.secondary)?;
        }
        Ok(())
    }
}

struct RotateScratch {
    delta: Vec<Torus32>,
    product: ExternalProductScratch,
}

#[derive(Debug, Clone)]
pub struct BlindRotator {
    external: ExternalProduct,
}

impl BlindRotator {
    pub fn new(external: ExternalProduct) -> Self {
        Self { external }
    }

    pub fn external_product(&self) -> &ExternalProduct {
        &self.external
    }

    /// One step for one sample: `out = acc + tgsw ⊡ ((X^shift - 1)·acc)`.
    fn mux_rotate(
        &self,
        tgsw: &[Complex64],
        acc: &[Torus32],
        out: &mut [Torus32],
        shift: usize,
        scratch: &mut RotateScratch,
    ) {
        let n = self.external.params().tlwe.ring_degree;
        for (delta, poly) in scratch.delta.chunks_exact_mut(n).zip(acc.chunks_exact(n)) {
            mul_by_monomial_minus_one(delta, poly, shift);
        }
        self.external
            .apply_to_sample(tgsw, &scratch.delta, out, &mut scratch.product);
        for (o, &a) in out.iter_mut().zip(acc) {
            *o = o.wrapping_add(a);
        }
    }

    /// Rotates every accumulator of `acc` in place.
    ///
    /// `bara` holds `n` exponents in `[0, 2N)` per batch element, element `b`
    /// at `bara[b·n..(b+1)·n]`, where `n` is the bootstrapping key length.
    #[instrument(skip_all, fields(batch = acc.batch_size(), n = keys.count()))]
    pub fn blind_rotate<D: Device>(
        &self,
        device: &D,
        acc: &mut TLweSampleArray,
        keys: &TGswSpectralArray,
        bara: &[u32],
    ) -> TfheResult<()> {
        self.external.check_key(keys)?;
        self.external.check_sample(acc)?;
        let n = keys.count();
        let batch = acc.batch_size();
        ensure_eq("rotation exponent count", batch * n, bara.len())?;
        let two_n = 2 * acc.ring_degree() as u32;
        if let Some(bad) = bara.iter().find(|&&a| a >= two_n) {
            return Err(TfheError::invalid(format!(
                "rotation exponent {bad} outside [0, {two_n})"
            )));
        }

        let secondary =
            TLweSampleArray::zeros_on(device, acc.ring_degree(), acc.mask_size(), batch)?;
        let mut buffers = PingPong::new(acc, secondary);
        let len = buffers.primary.sample_len();
        for i in 0..n {
            let tgsw = keys.sample(i);
            let (current, next) = buffers.split();
            next.coefs_mut()
                .par_chunks_mut(len)
                .zip(current.coefs().par_chunks(len))
                .enumerate()
                .for_each_init(
                    || RotateScratch {
                        delta: vec![0; len],
                        product: self.external.scratch(),
                    },
                    |scratch, (b, (out, acc))| {
                        let shift = bara[b * n + i] as usize;
                        self.mux_rotate(tgsw, acc, out, shift, scratch);
                    },
                );
            buffers.flip();
        }
        debug!(steps = n, "blind rotation finished");
        buffers.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HostDevice;
    use crate::keys::TGswKey;
    use crate::params::{TGswParams, TLweParams};
    use crate::rings::{TorusPolynomialArray, mul_by_monomial};
    use crate::torus::{f64_to_torus32, torus32_to_f64};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    const N: usize = 64;

    fn rotate_and_check(bits: &[i32], seed: u64) {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let params = TGswParams::new(3, 7, TLweParams::new(N, 1, 1e-9, 1e-2));
        let key = TGswKey::generate(params, &mut rng).unwrap();
        let multiplier = key.tlwe_key().multiplier().clone();
        let rotator = BlindRotator::new(ExternalProduct::new(params, multiplier.clone()).unwrap());
        let bk = key
            .encrypt_ints(bits, 1e-9, &mut rng)
            .unwrap()
            .to_spectral(&multiplier)
            .unwrap();

        let batch = 3;
        let n = bits.len();
        let bara: Vec<u32> = (0..batch * n)
            .map(|_| rng.random_range(0..2 * N as u32))
            .collect();
        let test_vector: Vec<Torus32> = (0..N)
            .map(|j| f64_to_torus32(if j % 3 == 0 { 0.125 } else { -0.25 }))
            .collect();
        let messages =
            TorusPolynomialArray::from_coefs(N, test_vector.repeat(batch)).unwrap();
        let mut acc = key.tlwe_key().encrypt(&messages, 1e-9, &mut rng).unwrap();

        rotator.blind_rotate(&HostDevice, &mut acc, &bk, &bara).unwrap();

        let phase = key.tlwe_key().phase(&acc).unwrap();
        for b in 0..batch {
            let total: usize = (0..n)
                .map(|i| bara[b * n + i] as usize * bits[i] as usize)
                .sum();
            let mut expected = vec![0; N];
            mul_by_monomial(&mut expected, &test_vector, total % (2 * N));
            for (p, e) in phase.poly(b).iter().zip(&expected) {
                let err = torus32_to_f64(p.wrapping_sub(*e)).abs();
                assert!(err < 1e-2, "batch {b}: err {err}");
            }
        }
    }

    #[test]
    fn rotation_with_odd_key_length() {
        rotate_and_check(&[1, 0, 1, 1, 0, 1, 0], 31);
    }

    #[test]
    fn rotation_with_even_key_length() {
        rotate_and_check(&[0, 1, 1, 0, 1, 1], 37);
    }

    #[test]
    fn out_of_range_exponent_is_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(41);
        let params = TGswParams::new(2, 8, TLweParams::new(N, 1, 1e-9, 1e-2));
        let key = TGswKey::generate(params, &mut rng).unwrap();
        let multiplier = key.tlwe_key().multiplier().clone();
        let rotator = BlindRotator::new(ExternalProduct::new(params, multiplier.clone()).unwrap());
        let bk = key
            .encrypt_ints(&[1], 0.0, &mut rng)
            .unwrap()
            .to_spectral(&multiplier)
            .unwrap();
        let mut acc = TLweSampleArray::zeros(N, 1, 1);
        let err = rotator.blind_rotate(&HostDevice, &mut acc, &bk, &[2 * N as u32]);
        assert!(matches!(err, Err(TfheError::InvalidParameter { .. })));
        let err = rotator.blind_rotate(&HostDevice, &mut acc, &bk, &[0, 1]);
        assert!(matches!(err, Err(TfheError::ParameterMismatch { .. })));
    }
}
