pub mod sampling;

pub use sampling::{TorusGaussian, binary_coefficients, uniform_torus};
