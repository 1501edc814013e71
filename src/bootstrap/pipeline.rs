use super::blind_rotate::BlindRotator;
use super::external_product::ExternalProduct;
use super::key_switch::key_switch_into;
use super::metrics::BootstrapMetrics;
use super::mod_switch::{RotationAmounts, mod_switch_samples};
use crate::ciphertext::{LweSampleArray, TLweSampleArray};
use crate::device::{Device, HostDevice};
use crate::errors::{TfheError, TfheResult, ensure_eq};
use crate::keys::BootstrapKeySet;
use crate::params::BootstrapParams;
use crate::rings::{RingMultiplier, TorusPolynomialArray};
use crate::torus::Torus32;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Gate bootstrapping over a fixed key set.
///
/// Construction validates the parameters and the key shapes once and plans
/// the spectral transforms; every call afterwards only checks the input
/// batch. The key set is only ever read.
#[derive(Debug)]
pub struct Bootstrapper<'k, D: Device = HostDevice> {
    keys: &'k BootstrapKeySet,
    device: D,
    rotator: BlindRotator,
}

impl<'k> Bootstrapper<'k, HostDevice> {
    pub fn new(keys: &'k BootstrapKeySet) -> TfheResult<Self> {
        Self::with_device(keys, HostDevice)
    }
}

impl<'k, D: Device> Bootstrapper<'k, D> {
    pub fn with_device(keys: &'k BootstrapKeySet, device: D) -> TfheResult<Self> {
        let params = keys.params();
        params.validate()?;
        let multiplier = RingMultiplier::new(params.tgsw.tlwe.ring_degree)?;
        let external = ExternalProduct::new(params.tgsw, multiplier)?;
        external.check_key(keys.bootstrap_key())?;
        ensure_eq("bootstrapping key length", params.lwe.n, keys.bootstrap_key().count())?;
        ensure_eq(
            "key-switching input dimension",
            params.extracted().n,
            keys.key_switch_key().input_dimension(),
        )?;
        ensure_eq(
            "key-switching output dimension",
            params.lwe.n,
            keys.key_switch_key().output_dimension(),
        )?;
        debug!(device = device.name(), "bootstrapper ready");
        Ok(Self {
            keys,
            device,
            rotator: BlindRotator::new(external),
        })
    }

    pub fn params(&self) -> &BootstrapParams {
        self.keys.params()
    }

    /// Refreshes every sample of `input`: the result encrypts `+mu` where
    /// the input phase lies in `[0, 1/2)` and `-mu` otherwise, under the
    /// input key.
    pub fn bootstrap(&self, input: &LweSampleArray, mu: Torus32) -> TfheResult<LweSampleArray> {
        let mut metrics = BootstrapMetrics::default();
        self.bootstrap_with_metrics(input, mu, &mut metrics)
    }

    /// [`Self::bootstrap`], adding stage timings to `metrics`.
    #[instrument(skip_all, fields(batch = input.batch_size(), n = input.dimension()))]
    pub fn bootstrap_with_metrics(
        &self,
        input: &LweSampleArray,
        mu: Torus32,
        metrics: &mut BootstrapMetrics,
    ) -> TfheResult<LweSampleArray> {
        let extracted = self.rotate_and_extract_samples(input, mu, metrics)?;

        let start = Instant::now();
        let mut out = LweSampleArray::zeros_on(
            &self.device,
            self.params().lwe.n,
            input.batch_size(),
        )?;
        metrics.allocation += start.elapsed();

        let start = Instant::now();
        key_switch_into(self.keys.key_switch_key(), &extracted, &mut out)?;
        metrics.key_switch += start.elapsed();
        info!("key switch done");

        self.synchronize(metrics)?;
        metrics.calls += 1;
        metrics.samples += input.batch_size() as u64;
        Ok(out)
    }

    /// Bootstraps without the final key switch: the result is an LWE
    /// sample of dimension `k·N` under the extracted accumulator key.
    #[instrument(skip_all, fields(batch = input.batch_size(), n = input.dimension()))]
    pub fn bootstrap_without_key_switch(
        &self,
        input: &LweSampleArray,
        mu: Torus32,
    ) -> TfheResult<LweSampleArray> {
        let mut metrics = BootstrapMetrics::default();
        let out = self.rotate_and_extract_samples(input, mu, &mut metrics)?;
        self.synchronize(&mut metrics)?;
        Ok(out)
    }

    /// Rotates `X^{-barb}·test_vector` by the switched mask and extracts
    /// coefficient 0 of each accumulator.
    pub fn blind_rotate_and_extract(
        &self,
        test_vector: &[Torus32],
        amounts: &RotationAmounts,
    ) -> TfheResult<LweSampleArray> {
        let mut metrics = BootstrapMetrics::default();
        self.rotate_and_extract(test_vector, amounts, &mut metrics)
    }

    fn rotate_and_extract_samples(
        &self,
        input: &LweSampleArray,
        mu: Torus32,
        metrics: &mut BootstrapMetrics,
    ) -> TfheResult<LweSampleArray> {
        let params = self.params();
        ensure_eq("LWE dimension", params.lwe.n, input.dimension())?;
        if input.batch_size() == 0 {
            return Err(TfheError::invalid("bootstrap batch is empty"));
        }

        let start = Instant::now();
        let two_n = 2 * params.tgsw.tlwe.ring_degree as u32;
        let amounts = mod_switch_samples(input, two_n)?;
        metrics.modulus_switch += start.elapsed();
        debug!(msize = two_n, "modulus switch done");

        let test_vector = vec![mu; params.tgsw.tlwe.ring_degree];
        self.rotate_and_extract(&test_vector, &amounts, metrics)
    }

    fn rotate_and_extract(
        &self,
        test_vector: &[Torus32],
        amounts: &RotationAmounts,
        metrics: &mut BootstrapMetrics,
    ) -> TfheResult<LweSampleArray> {
        let tlwe = &self.params().tgsw.tlwe;
        let n = tlwe.ring_degree;
        let batch = amounts.barb.len();
        ensure_eq("test vector length", n, test_vector.len())?;

        let start = Instant::now();
        let mut bodies = TorusPolynomialArray::zeros_on(&self.device, n, batch)?;
        let mut acc = TLweSampleArray::zeros_on(&self.device, n, tlwe.mask_size, batch)?;
        let mut extracted =
            LweSampleArray::zeros_on(&self.device, tlwe.mask_size * n, batch)?;
        let test_vectors = TorusPolynomialArray::from_coefs(n, test_vector.repeat(batch))?;
        metrics.allocation += start.elapsed();

        let start = Instant::now();
        bodies.assign_mul_by_monomial(&test_vectors, &amounts.barb, true)?;
        acc.assign_trivial(&bodies)?;
        self.rotator.blind_rotate(
            &self.device,
            &mut acc,
            self.keys.bootstrap_key(),
            &amounts.bara,
        )?;
        metrics.blind_rotation += start.elapsed();
        info!("blind rotation done");

        let start = Instant::now();
        acc.extract_lwe_into(&mut extracted)?;
        metrics.extraction += start.elapsed();
        Ok(extracted)
    }

    fn synchronize(&self, metrics: &mut BootstrapMetrics) -> TfheResult<()> {
        let start = Instant::now();
        self.device.synchronize()?;
        metrics.synchronization += start.elapsed();
        Ok(())
    }
}

/// One-shot bootstrap on the host.
pub fn bootstrap(
    keys: &BootstrapKeySet,
    input: &LweSampleArray,
    mu: Torus32,
) -> TfheResult<LweSampleArray> {
    Bootstrapper::new(keys)?.bootstrap(input, mu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{SecretKeySet, generate_key_pair};
    use crate::torus::{f64_to_torus32, mod_switch_to_torus32};
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn small_keys(seed: u64) -> (SecretKeySet, BootstrapKeySet) {
        let params = BootstrapParams::builder()
            .lwe_dimension(16)
            .ring_degree(64)
            .build()
            .unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        generate_key_pair(params, &mut rng).unwrap()
    }

    /// Fails allocation after `budget` successful calls.
    struct FlakyDevice {
        budget: AtomicUsize,
        fail_sync: bool,
    }

    impl Device for FlakyDevice {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn alloc_zeroed<T: Clone + Default + Send>(&self, len: usize) -> TfheResult<Vec<T>> {
            let left = self.budget.load(Ordering::SeqCst);
            if left == 0 {
                return Err(TfheError::DeviceFailure {
                    device: self.name(),
                    message: "out of memory".into(),
                });
            }
            self.budget.store(left - 1, Ordering::SeqCst);
            Ok(vec![T::default(); len])
        }

        fn synchronize(&self) -> TfheResult<()> {
            if self.fail_sync {
                Err(TfheError::DeviceFailure {
                    device: self.name(),
                    message: "kernel fault".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn bootstrap_follows_phase_sign() {
        let (secrets, keys) = small_keys(51);
        let mut rng = ChaCha20Rng::seed_from_u64(52);
        let mu = mod_switch_to_torus32(1, 8);
        let phases = [0.25, -0.25, 0.2, -0.3];
        let messages: Vec<_> = phases.iter().map(|&p| f64_to_torus32(p)).collect();
        let input = secrets.lwe.encrypt(&messages, 1e-6, &mut rng).unwrap();

        let mut metrics = BootstrapMetrics::default();
        let bootstrapper = Bootstrapper::new(&keys).unwrap();
        let out = bootstrapper
            .bootstrap_with_metrics(&input, mu, &mut metrics)
            .unwrap();
        assert_eq!(out.dimension(), 16);
        assert_eq!(
            secrets.lwe.decrypt_signs(&out).unwrap(),
            vec![true, false, true, false]
        );
        assert_eq!(metrics.calls, 1);
        assert_eq!(metrics.samples, 4);
    }

    #[test]
    fn bootstrap_without_key_switch_decrypts_under_extracted_key() {
        let (secrets, keys) = small_keys(53);
        let mut rng = ChaCha20Rng::seed_from_u64(54);
        let mu = mod_switch_to_torus32(1, 8);
        let messages = [f64_to_torus32(0.25), f64_to_torus32(-0.25)];
        let input = secrets.lwe.encrypt(&messages, 1e-6, &mut rng).unwrap();

        let out = Bootstrapper::new(&keys)
            .unwrap()
            .bootstrap_without_key_switch(&input, mu)
            .unwrap();
        let extracted = crate::keys::LweKey::from_tlwe_key(secrets.tgsw.tlwe_key());
        assert_eq!(out.dimension(), 64);
        for (phase, expected) in extracted.phase(&out).unwrap().iter().zip([mu, -mu]) {
            let err = phase.wrapping_sub(expected) as i64;
            assert!(err.abs() < 1 << 24, "err {err}");
        }
    }

    #[test]
    fn dimension_mismatch_fails_before_dispatch() {
        let (_, keys) = small_keys(55);
        let input = LweSampleArray::zeros(17, 2);
        let err = bootstrap(&keys, &input, 1 << 29);
        assert!(matches!(err, Err(TfheError::ParameterMismatch { .. })));
    }

    #[test]
    fn empty_batch_is_rejected() {
        let (_, keys) = small_keys(56);
        let err = bootstrap(&keys, &LweSampleArray::zeros(16, 0), 1 << 29);
        assert!(matches!(err, Err(TfheError::InvalidParameter { .. })));
    }

    #[test]
    fn device_failures_surface() {
        let (_, keys) = small_keys(57);
        let input = LweSampleArray::zeros(16, 1);

        let device = FlakyDevice {
            budget: AtomicUsize::new(1),
            fail_sync: false,
        };
        let err = Bootstrapper::with_device(&keys, device)
            .unwrap()
            .bootstrap(&input, 1 << 29);
        assert!(matches!(err, Err(TfheError::DeviceFailure { device: "flaky", .. })));

        let device = FlakyDevice {
            budget: AtomicUsize::new(usize::MAX),
            fail_sync: true,
        };
        let err = Bootstrapper::with_device(&keys, device)
            .unwrap()
            .bootstrap(&input, 1 << 29);
        assert!(matches!(err, Err(TfheError::DeviceFailure { .. })));
    }
}
