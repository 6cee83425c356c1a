use crate::circuits::{ConstraintSystem, LinearCombination, evaluate_lc};
use crate::error::{Groth16Error, Result};
use ark_ff::{FftField, Field, PrimeField};
use ark_poly::{EvaluationDomain, Radix2EvaluationDomain};
use itertools::izip;
use log::debug;
use rayon::prelude::*;
use rootcause::report;
use zeroize::Zeroize;

/// Smallest radix-2 domain holding one row per constraint plus one row per public wire.
///
/// The extra rows encode `w_j · 0 = 0` for every public wire, which keeps the public
/// input polynomials linearly independent.
pub(crate) fn domain<F: FftField>(
    num_constraints: usize,
    num_public: usize,
) -> Result<Radix2EvaluationDomain<F>> {
    let rows = num_constraints + num_public;
    Radix2EvaluationDomain::new(rows).ok_or_else(|| {
        report!(Groth16Error::UnsupportedCircuitSize)
            .attach(format!("Rows needed: {}", rows))
            .attach(format!("Field two-adicity: {}", F::TWO_ADICITY))
    })
}

/// Per-wire QAP polynomials evaluated at a secret point, plus the vanishing polynomial there.
///
/// Zeroized on drop: these values are as sensitive as the point itself.
pub(crate) struct WireEvaluations<F: Field> {
    pub(crate) a: Vec<F>,
    pub(crate) b: Vec<F>,
    pub(crate) c: Vec<F>,
    pub(crate) zt: F,
}

impl<F: Field> Drop for WireEvaluations<F> {
    fn drop(&mut self) {
        self.a.zeroize();
        self.b.zeroize();
        self.c.zeroize();
        self.zt.zeroize();
    }
}

/// Evaluate `a_j(τ)`, `b_j(τ)`, `c_j(τ)` for every wire `j` and `Z(τ)`.
pub(crate) fn evaluate_at<F, C>(
    cs: &C,
    domain: &Radix2EvaluationDomain<F>,
    tau: F,
) -> WireEvaluations<F>
where
    F: PrimeField,
    C: ConstraintSystem<F> + ?Sized,
{
    let mut lagrange = domain.evaluate_all_lagrange_coefficients(tau);
    let mut evaluations = WireEvaluations {
        a: vec![F::ZERO; cs.num_wires()],
        b: vec![F::ZERO; cs.num_wires()],
        c: vec![F::ZERO; cs.num_wires()],
        zt: domain.evaluate_vanishing_polynomial(tau),
    };

    for (u, a, b, c) in izip!(&lagrange, cs.a(), cs.b(), cs.c()) {
        for (coefficient, wire) in a {
            evaluations.a[*wire] += *u * coefficient;
        }
        for (coefficient, wire) in b {
            evaluations.b[*wire] += *u * coefficient;
        }
        for (coefficient, wire) in c {
            evaluations.c[*wire] += *u * coefficient;
        }
    }
    let public_rows = &lagrange[cs.num_constraints()..cs.num_constraints() + cs.num_public()];
    for (a, u) in evaluations.a.iter_mut().zip(public_rows) {
        *a += u;
    }

    lagrange.zeroize();
    evaluations
}

/// Coefficients of `H = (A·B − C) / Z` for a witness, one per domain element.
///
/// The last coefficient is zero whenever the witness satisfies the constraints. For an
/// unsatisfying witness the division is inexact and the result is meaningless, which only
/// shows up as a failed verification.
pub(crate) fn quotient_coefficients<F, C>(
    cs: &C,
    domain: &Radix2EvaluationDomain<F>,
    witness: &[F],
) -> Result<Vec<F>>
where
    F: PrimeField,
    C: ConstraintSystem<F> + ?Sized,
{
    let size = domain.size();
    let num_constraints = cs.num_constraints();
    let num_public = cs.num_public();

    let bind = |matrix: &[LinearCombination<F>], with_public_rows: bool| {
        let mut evaluations = vec![F::ZERO; size];
        evaluations[..num_constraints]
            .par_iter_mut()
            .zip(matrix.par_iter())
            .for_each(|(evaluation, lc)| *evaluation = evaluate_lc(lc, witness));
        if with_public_rows {
            evaluations[num_constraints..num_constraints + num_public]
                .copy_from_slice(&witness[..num_public]);
        }
        evaluations
    };
    let (mut a, (mut b, mut c)) = rayon::join(
        || bind(cs.a(), true),
        || rayon::join(|| bind(cs.b(), false), || bind(cs.c(), false)),
    );
    debug!("Bound A, B, C to the witness over {} rows", size);

    let coset = domain.get_coset(F::GENERATOR).ok_or_else(|| {
        report!(Groth16Error::UnsupportedCircuitSize).attach("Could not build the FFT coset")
    })?;
    let to_coset = |evaluations: &mut Vec<F>| {
        domain.ifft_in_place(evaluations);
        coset.fft_in_place(evaluations);
    };
    rayon::join(
        || to_coset(&mut a),
        || rayon::join(|| to_coset(&mut b), || to_coset(&mut c)),
    );

    // Z(gX) = g^n - 1 is the same at every point of the coset.
    let z_inverse = domain
        .evaluate_vanishing_polynomial(F::GENERATOR)
        .inverse()
        .ok_or_else(|| {
            report!(Groth16Error::UnsupportedCircuitSize)
                .attach("Vanishing polynomial is zero on the coset")
        })?;
    a.par_iter_mut()
        .zip(b.par_iter())
        .zip(c.par_iter())
        .for_each(|((a, b), c)| *a = (*a * b - c) * z_inverse);
    coset.ifft_in_place(&mut a);

    Ok(a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::test_circuits::*;
    use crate::circuits::R1CS;
    use crate::helpers::rand_scalar;
    use ark_ff::Zero;

    type Field = ark_mnt6_753::Fr;

    fn horner(coefficients: &[Field], x: Field) -> Field {
        coefficients
            .iter()
            .rev()
            .fold(Field::zero(), |acc, coefficient| acc * x + coefficient)
    }

    fn dot(evaluations: &[Field], witness: &[Field]) -> Field {
        evaluations.iter().zip(witness).map(|(e, w)| *e * w).sum()
    }

    #[test]
    fn domain_covers_constraints_and_public_rows() -> Result<()> {
        let r1cs: R1CS<Field> = square_chain(3);
        let domain = domain::<Field>(r1cs.num_constraints(), r1cs.num_public())?;
        assert_eq!(domain.size(), 8);

        let exact = super::domain::<Field>(6, 2)?;
        assert_eq!(exact.size(), 8);
        Ok(())
    }

    #[test]
    fn oversized_domain_is_rejected() {
        let err = domain::<Field>(1 << 40, 1).unwrap_err();
        assert_eq!(err.current_context(), &Groth16Error::UnsupportedCircuitSize);
    }

    #[test]
    fn evaluation_at_a_root_selects_the_row() -> Result<()> {
        let r1cs: R1CS<Field> = product_of_four();
        let domain = domain::<Field>(r1cs.num_constraints(), r1cs.num_public())?;

        // Row 1 is z * u = v2.
        let evaluations = evaluate_at(&r1cs, &domain, domain.element(1));
        assert_eq!(evaluations.zt, Field::zero());
        for wire in 0..r1cs.num_wires() {
            assert_eq!(evaluations.a[wire], Field::from((wire == 4) as u64));
            assert_eq!(evaluations.b[wire], Field::from((wire == 5) as u64));
            assert_eq!(evaluations.c[wire], Field::from((wire == 7) as u64));
        }

        // Row num_constraints + 1 is the public input row of wire 1.
        let evaluations = evaluate_at(&r1cs, &domain, domain.element(r1cs.num_constraints() + 1));
        for wire in 0..r1cs.num_wires() {
            assert_eq!(evaluations.a[wire], Field::from((wire == 1) as u64));
            assert_eq!(evaluations.b[wire], Field::zero());
        }
        Ok(())
    }

    #[test]
    fn quotient_divides_exactly() -> Result<()> {
        let r1cs: R1CS<Field> = square_chain(3);
        let witness = square_chain_witness(3, Field::from(2u64), Field::from(256u64));
        let domain = domain::<Field>(r1cs.num_constraints(), r1cs.num_public())?;

        let h = quotient_coefficients(&r1cs, &domain, witness.values())?;
        assert_eq!(h.len(), domain.size());
        assert_eq!(h[h.len() - 1], Field::zero());

        let x: Field = rand_scalar(&mut rand::rng());
        let evaluations = evaluate_at(&r1cs, &domain, x);
        let w = witness.values();
        assert_eq!(
            dot(&evaluations.a, w) * dot(&evaluations.b, w) - dot(&evaluations.c, w),
            horner(&h, x) * evaluations.zt
        );
        Ok(())
    }

    #[test]
    fn quotient_of_unsatisfied_witness_is_inexact() -> Result<()> {
        let r1cs: R1CS<Field> = square_chain(3);
        let witness = square_chain_witness(3, Field::from(2u64), Field::from(255u64));
        let domain = domain::<Field>(r1cs.num_constraints(), r1cs.num_public())?;

        let h = quotient_coefficients(&r1cs, &domain, witness.values())?;
        let x: Field = rand_scalar(&mut rand::rng());
        let evaluations = evaluate_at(&r1cs, &domain, x);
        let w = witness.values();
        assert_ne!(
            dot(&evaluations.a, w) * dot(&evaluations.b, w) - dot(&evaluations.c, w),
            horner(&h, x) * evaluations.zt
        );
        Ok(())
    }
}
