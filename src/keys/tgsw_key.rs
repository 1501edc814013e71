use super::TLweKey;
use crate::ciphertext::TGswSampleArray;
use crate::errors::{TfheResult, ensure_eq};
use crate::math::TorusGaussian;
use crate::params::TGswParams;
use rand::Rng;

/// A TLWE key used to encrypt TGSW samples.
#[derive(Debug, Clone)]
pub struct TGswKey {
    params: TGswParams,
    tlwe: TLweKey,
}

impl TGswKey {
    pub fn generate<R: Rng + ?Sized>(params: TGswParams, rng: &mut R) -> TfheResult<Self> {
        Ok(Self {
            params,
            tlwe: TLweKey::generate(params.tlwe, rng)?,
        })
    }

    pub fn from_tlwe_key(params: TGswParams, tlwe: TLweKey) -> TfheResult<Self> {
        ensure_eq("ring degree", params.tlwe.ring_degree, tlwe.params().ring_degree)?;
        ensure_eq("TLWE mask size", params.tlwe.mask_size, tlwe.params().mask_size)?;
        Ok(Self { params, tlwe })
    }

    pub fn params(&self) -> &TGswParams {
        &self.params
    }

    pub fn tlwe_key(&self) -> &TLweKey {
        &self.tlwe
    }

    /// Encrypts each integer `mu` as a TGSW sample: every row encrypts zero,
    /// then row `bloc·ℓ + i` gets `mu·h_i` added to the constant coefficient
    /// of polynomial `bloc`.
    pub fn encrypt_ints<R: Rng + ?Sized>(
        &self,
        messages: &[i32],
        std_dev: f64,
        rng: &mut R,
    ) -> TfheResult<TGswSampleArray> {
        let noise = TorusGaussian::new(std_dev)?;
        let n = self.params.tlwe.ring_degree;
        let levels = self.params.decomp_length;
        let mut scratch = self.tlwe.multiplier().scratch();
        let mut out = TGswSampleArray::zeros(self.params, messages.len());
        for (index, &mu) in messages.iter().enumerate() {
            for row in 0..self.params.row_count() {
                let sample = out.row_mut(index, row);
                self.tlwe
                    .encrypt_zero_into(sample, &noise, rng, &mut scratch)?;
                let (bloc, level) = (row / levels, row % levels);
                let constant = &mut sample[bloc * n];
                *constant = constant.wrapping_add(mu.wrapping_mul(self.params.gadget(level)));
            }
        }
        Ok(out)
    }
}
