pub mod bootstrap;
pub mod ciphertext;
pub mod device;
pub mod errors;
pub mod keys;
pub mod math;
pub mod params;
pub mod rings;
pub mod spectral;
pub mod torus;

pub use bootstrap::{BootstrapMetrics, Bootstrapper, bootstrap};
pub use ciphertext::{LweSampleArray, TGswSampleArray, TGswSpectralArray, TLweSampleArray};
pub use device::{Device, HostDevice};
pub use errors::{TfheError, TfheResult};
pub use keys::{
    BootstrapKeySet, KeySwitchKey, LweKey, SecretKeySet, TGswKey, TLweKey, generate_key_pair,
};
pub use params::{BootstrapParams, BootstrapParamsBuilder, KeySwitchParams, LweParams, TGswParams, TLweParams};
pub use rings::{RingMultiplier, TorusPolynomialArray};
pub use spectral::SpectralPlan;
pub use torus::{Torus32, f64_to_torus32, mod_switch_from_torus32, mod_switch_to_torus32, torus32_to_f64};
