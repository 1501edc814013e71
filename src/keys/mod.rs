//! Key material for exercising the pipeline.
//!
//! The bootstrap stages never sample secrets; they only read a
//! [`BootstrapKeySet`]. Everything else here exists to produce one and to
//! encrypt and decrypt test inputs.
mod bootstrap_key;
mod key_switch_key;
mod lwe_key;
mod tgsw_key;
mod tlwe_key;

pub use bootstrap_key::BootstrapKeySet;
pub use key_switch_key::KeySwitchKey;
pub use lwe_key::LweKey;
pub use tgsw_key::TGswKey;
pub use tlwe_key::TLweKey;

use crate::errors::TfheResult;
use crate::params::BootstrapParams;
use rand::Rng;

/// Secret keys of one party: the outer LWE key and the accumulator key.
#[derive(Debug, Clone)]
pub struct SecretKeySet {
    pub lwe: LweKey,
    pub tgsw: TGswKey,
}

/// Samples fresh secret keys and the matching bootstrapping key set.
pub fn generate_key_pair<R: Rng + ?Sized>(
    params: BootstrapParams,
    rng: &mut R,
) -> TfheResult<(SecretKeySet, BootstrapKeySet)> {
    params.validate()?;
    let lwe = LweKey::generate(params.lwe, rng);
    let tgsw = TGswKey::generate(params.tgsw, rng)?;
    let keys = BootstrapKeySet::generate(params, &lwe, &tgsw, rng)?;
    Ok((SecretKeySet { lwe, tgsw }, keys))
}
