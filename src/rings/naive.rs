//! Schoolbook negacyclic multiplication, used as a reference for the
//! spectral multiplier.
use crate::torus::Torus32;

/// `a * b mod X^N + 1` over the reals.
pub fn negacyclic_mul_real(a: &[f64], b: &[f64]) -> Vec<f64> {
    let n = a.len();
    assert_eq!(n, b.len(), "Incompatible ring degrees");
    let mut result = vec![0.0; n];
    for i in 0..n {
        for j in 0..n {
            let coeff_pos = i + j;
            if coeff_pos < n {
                result[coeff_pos] += a[i] * b[j];
            } else {
                // X^N = -1, so X^(N+k) = -X^k
                result[coeff_pos - n] -= a[i] * b[j];
            }
        }
    }
    result
}

/// `ints * torus mod X^N + 1`, exact with wrapping torus arithmetic.
pub fn negacyclic_mul_int_torus(ints: &[i32], torus: &[Torus32]) -> Vec<Torus32> {
    let n = ints.len();
    assert_eq!(n, torus.len(), "Incompatible ring degrees");
    let mut result = vec![0 as Torus32; n];
    for i in 0..n {
        for j in 0..n {
            let term = ints[i].wrapping_mul(torus[j]);
            let coeff_pos = i + j;
            if coeff_pos < n {
                result[coeff_pos] = result[coeff_pos].wrapping_add(term);
            } else {
                result[coeff_pos - n] = result[coeff_pos - n].wrapping_sub(term);
            }
        }
    }
    result
}
