use super::{KeySwitchKey, LweKey, TGswKey};
use crate::ciphertext::TGswSpectralArray;
use crate::errors::{TfheError, TfheResult, ensure_eq};
use crate::params::BootstrapParams;
use rand::Rng;
use tracing::{info, instrument};

/// The public material a bootstrap call reads: one spectral TGSW sample per
/// input key bit and the key-switching table back to the input key.
#[derive(Debug, Clone)]
pub struct BootstrapKeySet {
    params: BootstrapParams,
    bootstrap_key: TGswSpectralArray,
    key_switch_key: KeySwitchKey,
}

impl BootstrapKeySet {
    #[instrument(skip_all, fields(n = params.lwe.n, ring_degree = params.tgsw.tlwe.ring_degree))]
    pub fn generate<R: Rng + ?Sized>(
        params: BootstrapParams,
        lwe_key: &LweKey,
        tgsw_key: &TGswKey,
        rng: &mut R,
    ) -> TfheResult<Self> {
        params.validate()?;
        ensure_eq("LWE dimension", params.lwe.n, lwe_key.dimension())?;
        if *tgsw_key.params() != params.tgsw {
            return Err(TfheError::invalid(
                "TGSW key parameters differ from the bootstrap parameters",
            ));
        }

        let tgsw = tgsw_key.encrypt_ints(lwe_key.bits(), params.tgsw.tlwe.alpha_min, rng)?;
        let bootstrap_key = tgsw.to_spectral(tgsw_key.tlwe_key().multiplier())?;

        let extracted = LweKey::from_tlwe_key(tgsw_key.tlwe_key());
        let key_switch_key = KeySwitchKey::generate(
            params.key_switch,
            &extracted,
            lwe_key,
            params.lwe.alpha_min,
            rng,
        )?;
        info!("bootstrapping key set generated");
        Ok(Self {
            params,
            bootstrap_key,
            key_switch_key,
        })
    }

    /// Assembles a key set from externally generated parts.
    pub fn from_parts(
        params: BootstrapParams,
        bootstrap_key: TGswSpectralArray,
        key_switch_key: KeySwitchKey,
    ) -> TfheResult<Self> {
        params.validate()?;
        ensure_eq("bootstrapping key length", params.lwe.n, bootstrap_key.count())?;
        ensure_eq(
            "ring degree",
            params.tgsw.tlwe.ring_degree,
            bootstrap_key.params().tlwe.ring_degree,
        )?;
        ensure_eq(
            "TLWE mask size",
            params.tgsw.tlwe.mask_size,
            bootstrap_key.params().tlwe.mask_size,
        )?;
        ensure_eq(
            "TGSW decomposition length",
            params.tgsw.decomp_length,
            bootstrap_key.params().decomp_length,
        )?;
        ensure_eq(
            "TGSW decomposition base bits",
            params.tgsw.base_bits as usize,
            bootstrap_key.params().base_bits as usize,
        )?;
        if *key_switch_key.params() != params.key_switch {
            return Err(TfheError::invalid(
                "key-switching decomposition differs from the bootstrap parameters",
            ));
        }
        ensure_eq(
            "key-switching input dimension",
            params.extracted().n,
            key_switch_key.input_dimension(),
        )?;
        ensure_eq(
            "key-switching output dimension",
            params.lwe.n,
            key_switch_key.output_dimension(),
        )?;
        Ok(Self {
            params,
            bootstrap_key,
            key_switch_key,
        })
    }

    pub fn params(&self) -> &BootstrapParams {
        &self.params
    }

    pub fn bootstrap_key(&self) -> &TGswSpectralArray {
        &self.bootstrap_key
    }

    pub fn key_switch_key(&self) -> &KeySwitchKey {
        &self.key_switch_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_key_pair;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn params() -> BootstrapParams {
        BootstrapParams::builder()
            .lwe_dimension(16)
            .ring_degree(64)
            .build()
            .unwrap()
    }

    fn generated(seed: u64) -> BootstrapKeySet {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        generate_key_pair(params(), &mut rng).unwrap().1
    }

    fn spectral_copy(keys: &BootstrapKeySet, count: usize) -> TGswSpectralArray {
        let per_sample = keys.bootstrap_key().sample(0).len();
        let coefs = keys.bootstrap_key().coefs()[..count * per_sample].to_vec();
        TGswSpectralArray::from_coefs(keys.params().tgsw, coefs).unwrap()
    }

    #[test]
    fn from_parts_accepts_generated_material() {
        let keys = generated(71);
        assert_eq!(keys.bootstrap_key().count(), 16);
        let rebuilt = BootstrapKeySet::from_parts(
            params(),
            spectral_copy(&keys, 16),
            keys.key_switch_key().clone(),
        )
        .unwrap();
        assert_eq!(rebuilt.bootstrap_key(), keys.bootstrap_key());
        assert_eq!(rebuilt.key_switch_key(), keys.key_switch_key());
        assert_eq!(rebuilt.params(), keys.params());
    }

    #[test]
    fn from_parts_rejects_short_bootstrapping_key() {
        let keys = generated(72);
        let err = BootstrapKeySet::from_parts(
            params(),
            spectral_copy(&keys, 15),
            keys.key_switch_key().clone(),
        );
        assert!(matches!(err, Err(TfheError::ParameterMismatch { .. })));
    }

    #[test]
    fn from_parts_rejects_foreign_ring_and_decomposition() {
        let keys = generated(73);
        let assemble = |params: BootstrapParams| {
            BootstrapKeySet::from_parts(
                params,
                keys.bootstrap_key().clone(),
                keys.key_switch_key().clone(),
            )
        };

        let wider_ring = BootstrapParams::builder()
            .lwe_dimension(16)
            .ring_degree(128)
            .build()
            .unwrap();
        assert!(matches!(
            assemble(wider_ring),
            Err(TfheError::ParameterMismatch { .. })
        ));

        let other_gadget = BootstrapParams::builder()
            .lwe_dimension(16)
            .ring_degree(64)
            .decomposition(3, 7)
            .build()
            .unwrap();
        assert!(matches!(
            assemble(other_gadget),
            Err(TfheError::ParameterMismatch { .. })
        ));

        let other_key_switch = BootstrapParams::builder()
            .lwe_dimension(16)
            .ring_degree(64)
            .key_switch(7, 3)
            .build()
            .unwrap();
        assert!(matches!(
            assemble(other_key_switch),
            Err(TfheError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn spectral_buffer_must_hold_whole_samples() {
        let keys = generated(74);
        let mut coefs = keys.bootstrap_key().coefs().to_vec();
        coefs.pop();
        let err = TGswSpectralArray::from_coefs(params().tgsw, coefs);
        assert!(matches!(err, Err(TfheError::ParameterMismatch { .. })));
    }
}
