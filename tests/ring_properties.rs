use proptest::prelude::*;
use toy_tfhe_bootstrap::rings::naive::{negacyclic_mul_int_torus, negacyclic_mul_real};
use toy_tfhe_bootstrap::rings::{RingMultiplier, TorusPolynomialArray, mul_by_monomial};
use toy_tfhe_bootstrap::{SpectralPlan, Torus32};

fn real_poly(degree: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-100.0f64..100.0, degree)
}

fn torus_poly(degree: usize) -> impl Strategy<Value = Vec<Torus32>> {
    prop::collection::vec(any::<i32>(), degree)
}

fn small_int_poly(degree: usize) -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(-8i32..8, degree)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn real_product_matches_schoolbook(a in real_poly(64), b in real_poly(64)) {
        let mul = RingMultiplier::new(64).unwrap();
        let mut out = vec![0.0; 64];
        mul.multiply_real(&a, &b, &mut out).unwrap();
        let expected = negacyclic_mul_real(&a, &b);
        for (x, y) in out.iter().zip(&expected) {
            prop_assert!((x - y).abs() <= 1e-6 * (1.0 + y.abs()), "{} vs {}", x, y);
        }
    }

    #[test]
    fn small_int_times_torus_product_is_exact(a in small_int_poly(256), b in torus_poly(256)) {
        let mul = RingMultiplier::new(256).unwrap();
        let mut out = vec![0; 256];
        mul.multiply_int_torus(&a, &b, &mut out).unwrap();
        prop_assert_eq!(out, negacyclic_mul_int_torus(&a, &b));
    }

    #[test]
    fn product_by_monomial_is_a_shift(b in torus_poly(32), exponent in 0usize..64) {
        let mul = RingMultiplier::new(32).unwrap();
        let mut monomial = vec![0; 32];
        if exponent < 32 {
            monomial[exponent] = 1;
        } else {
            monomial[exponent - 32] = -1;
        }
        let mut out = vec![0; 32];
        mul.multiply_int_torus(&monomial, &b, &mut out).unwrap();
        let mut shifted = vec![0; 32];
        mul_by_monomial(&mut shifted, &b, exponent);
        prop_assert_eq!(out, shifted);
    }

    #[test]
    fn batched_shift_matches_rows(
        coefs in torus_poly(4 * 16),
        shifts in prop::collection::vec(0u32..32, 4),
    ) {
        let input = TorusPolynomialArray::from_coefs(16, coefs).unwrap();
        let mut out = TorusPolynomialArray::zeros(16, 4);
        out.assign_mul_by_monomial(&input, &shifts, false).unwrap();
        for (row, &shift) in shifts.iter().enumerate() {
            let mut expected = vec![0; 16];
            mul_by_monomial(&mut expected, input.poly(row), shift as usize);
            prop_assert_eq!(out.poly(row), &expected[..]);
        }
    }

    #[test]
    fn twisted_round_trip(x in real_poly(128)) {
        let plan = SpectralPlan::new(128).unwrap();
        let mut spectrum = vec![rustfft::num_complex::Complex64::default(); 64];
        let mut back = vec![0.0; 128];
        plan.forward_twisted(&x, &mut spectrum).unwrap();
        plan.inverse_twisted(&spectrum, &mut back).unwrap();
        for (a, b) in x.iter().zip(&back) {
            prop_assert!((a - b).abs() <= 1e-9 * (1.0 + a.abs()));
        }
    }
}
