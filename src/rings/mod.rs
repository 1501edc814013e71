pub mod multiplier;
pub mod naive;
pub mod polynomial;

pub use multiplier::{MultiplierScratch, RingMultiplier};
pub use polynomial::{TorusPolynomialArray, mul_by_monomial, mul_by_monomial_minus_one};
