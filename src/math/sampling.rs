use crate::errors::{TfheError, TfheResult};
use crate::torus::{Torus32, f64_to_torus32};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Fills `out` with uniform torus values.
pub fn uniform_torus<R: Rng + ?Sized>(out: &mut [Torus32], rng: &mut R) {
    for coeff in out {
        *coeff = rng.random();
    }
}

/// Samples a uniform binary vector of length `len`.
pub fn binary_coefficients<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<i32> {
    (0..len).map(|_| rng.random_bool(0.5) as i32).collect()
}

/// Centered Gaussian noise on the torus.
///
/// A real sample of standard deviation `std_dev` (a fraction of the torus)
/// is drawn and encoded with [`f64_to_torus32`].
#[derive(Debug, Clone, Copy)]
pub struct TorusGaussian {
    normal: Normal<f64>,
}

impl TorusGaussian {
    /// Fails unless `std_dev` is finite and non-negative.
    pub fn new(std_dev: f64) -> TfheResult<Self> {
        if !std_dev.is_finite() || std_dev < 0.0 {
            return Err(TfheError::invalid(format!(
                "noise standard deviation must be finite and non-negative, got {std_dev}"
            )));
        }
        let normal = Normal::new(0.0, std_dev)
            .map_err(|err| TfheError::invalid(format!("noise distribution: {err}")))?;
        Ok(Self { normal })
    }

    /// `message + e` with `e` freshly sampled.
    pub fn sample_around<R: Rng + ?Sized>(&self, message: Torus32, rng: &mut R) -> Torus32 {
        message.wrapping_add(f64_to_torus32(self.normal.sample(rng)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torus::torus32_to_f64;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn binary_coefficients_are_bits_and_balanced() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let bits = binary_coefficients(4096, &mut rng);
        assert!(bits.iter().all(|&b| b == 0 || b == 1));
        let ones = bits.iter().filter(|&&b| b == 1).count() as f64;
        assert!((ones / 4096.0 - 0.5).abs() < 0.05, "ones fraction {ones}");
    }

    #[test]
    fn uniform_torus_covers_both_halves() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let mut out = vec![0; 2048];
        uniform_torus(&mut out, &mut rng);
        let negative = out.iter().filter(|&&x| x < 0).count() as f64;
        assert!((negative / 2048.0 - 0.5).abs() < 0.06);
    }

    #[test]
    fn gaussian_noise_has_expected_spread() {
        const SAMPLES: usize = 16_384;
        let std_dev = 1e-3;
        let noise = TorusGaussian::new(std_dev).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(99);
        let values: Vec<f64> = (0..SAMPLES)
            .map(|_| torus32_to_f64(noise.sample_around(0, &mut rng)))
            .collect();
        let mean = values.iter().sum::<f64>() / SAMPLES as f64;
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / SAMPLES as f64;
        assert!(mean.abs() < 1e-4, "mean too far from 0: {mean}");
        assert!(
            (variance.sqrt() - std_dev).abs() < std_dev * 0.05,
            "std dev {} too far from {std_dev}",
            variance.sqrt()
        );
    }

    #[test]
    fn zero_noise_is_exact() {
        let noise = TorusGaussian::new(0.0).unwrap();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        assert_eq!(noise.sample_around(12345, &mut rng), 12345);
    }

    #[test]
    fn invalid_std_dev_is_rejected() {
        assert!(TorusGaussian::new(-1.0).is_err());
        assert!(TorusGaussian::new(f64::NAN).is_err());
        assert!(TorusGaussian::new(f64::INFINITY).is_err());
    }
}
