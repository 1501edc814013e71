//! Batched, contiguous ciphertext containers.
mod lwe;
mod tgsw;
mod tlwe;

pub use lwe::LweSampleArray;
pub use tgsw::{TGswSampleArray, TGswSpectralArray};
pub use tlwe::TLweSampleArray;
