//! The bootstrap pipeline:
//! modulus switch → blind rotation → sample extraction → key switch.
pub mod blind_rotate;
pub mod decomposition;
pub mod external_product;
pub mod key_switch;
pub mod metrics;
pub mod mod_switch;
pub mod pipeline;

pub use blind_rotate::BlindRotator;
pub use decomposition::{GadgetDecomposer, KeySwitchDecomposer};
pub use external_product::{ExternalProduct, ExternalProductScratch};
pub use key_switch::{key_switch, key_switch_into};
pub use metrics::BootstrapMetrics;
pub use mod_switch::{RotationAmounts, mod_switch_batch, mod_switch_samples};
pub use pipeline::{Bootstrapper, bootstrap};
