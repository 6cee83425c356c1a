use super::{ProvingKey, SetupConfig, SetupMode, VerifyingKey};
use crate::circuits::{ConstraintSystem, LinearCombination};
use crate::error::Result;
use crate::helpers::{rand_nonzero_scalar, rand_scalar};
use crate::qap;
use ark_ec::pairing::Pairing;
use ark_ec::{CurveGroup, PrimeGroup};
use ark_ff::{Field, PrimeField};
use ark_poly::{EvaluationDomain, Radix2EvaluationDomain};
use ark_std::Zero;
use log::{debug, info, warn};
use rand::{CryptoRng, RngCore};
use rayon::prelude::*;
use rootcause::prelude::ResultExt;
use std::collections::BTreeMap;
use std::time::Instant;
use zeroize::Zeroizing;

/// Secret scalars of a trusted setup. Lives only inside [`trusted_setup`].
struct ToxicWaste<F: Field> {
    tau: F,
    alpha: F,
    beta: F,
    gamma: F,
    gamma_inverse: F,
    delta: F,
    delta_inverse: F,
}

impl<F: PrimeField> ToxicWaste<F> {
    fn sample<R>(rng: &mut R, domain: &Radix2EvaluationDomain<F>) -> Self
    where
        R: RngCore + CryptoRng + ?Sized,
    {
        // τ must not be a root of Z, or every H query point collapses to zero.
        let tau = loop {
            let tau: F = rand_scalar(rng);
            if !domain.evaluate_vanishing_polynomial(tau).is_zero() {
                break tau;
            }
        };
        let invertible = |rng: &mut R| loop {
            let x: F = rand_scalar(rng);
            if let Some(inverse) = x.inverse() {
                break (x, inverse);
            }
        };
        let (gamma, gamma_inverse) = invertible(&mut *rng);
        let (delta, delta_inverse) = invertible(&mut *rng);

        ToxicWaste {
            tau,
            alpha: rand_nonzero_scalar(rng),
            beta: rand_nonzero_scalar(rng),
            gamma,
            gamma_inverse,
            delta,
            delta_inverse,
        }
    }
}

impl<F: Field> Drop for ToxicWaste<F> {
    fn drop(&mut self) {
        self.tau.zeroize();
        self.alpha.zeroize();
        self.beta.zeroize();
        self.gamma.zeroize();
        self.gamma_inverse.zeroize();
        self.delta.zeroize();
        self.delta_inverse.zeroize();
    }
}

/// `base·s` for every scalar, normalized to affine form in one batch.
fn batch_mul<G: CurveGroup>(base: G, scalars: &[G::ScalarField]) -> Vec<G::Affine> {
    let points: Vec<G> = scalars.par_iter().map(|scalar| base * scalar).collect();
    G::normalize_batch(&points)
}

/// Generate a proving/verifying key pair for `cs`.
///
/// The constraint system is validated first; inconsistent matrices abort the setup with
/// [`Groth16Error::MalformedConstraintSystem`](crate::Groth16Error::MalformedConstraintSystem).
/// See [`SetupMode`] for the insecure benchmarking mode.
pub fn setup<E, C, R>(
    cs: &C,
    config: &SetupConfig,
    rng: &mut R,
) -> Result<(ProvingKey<E>, VerifyingKey<E>)>
where
    E: Pairing,
    C: ConstraintSystem<E::ScalarField> + ?Sized,
    R: RngCore + CryptoRng + ?Sized,
{
    let start = Instant::now();
    cs.validate().attach("Validating constraint system for setup")?;
    let domain = qap::domain::<E::ScalarField>(cs.num_constraints(), cs.num_public())?;
    debug!(
        "Setup for {} constraints, {} wires ({} public), domain of size {}",
        cs.num_constraints(),
        cs.num_wires(),
        cs.num_public(),
        domain.size()
    );

    let keys = match config.mode {
        SetupMode::Trusted => trusted_setup(cs, &domain, rng),
        SetupMode::InsecureDummy => {
            warn!("Running an INSECURE dummy setup, the keys are only fit for benchmarks");
            dummy_setup(cs, &domain, rng)
        }
    };
    info!("setup time: {:?}", start.elapsed());
    Ok(keys)
}

fn trusted_setup<E, C, R>(
    cs: &C,
    domain: &Radix2EvaluationDomain<E::ScalarField>,
    rng: &mut R,
) -> (ProvingKey<E>, VerifyingKey<E>)
where
    E: Pairing,
    C: ConstraintSystem<E::ScalarField> + ?Sized,
    R: RngCore + CryptoRng + ?Sized,
{
    let toxic = ToxicWaste::<E::ScalarField>::sample(rng, domain);
    debug!("Generated random scalars");

    let evaluations = qap::evaluate_at(cs, domain, toxic.tau);
    debug!("Evaluated QAP polynomials");

    let infinity_a: Vec<bool> = evaluations.a.iter().map(Zero::is_zero).collect();
    let infinity_b: Vec<bool> = evaluations.b.iter().map(Zero::is_zero).collect();
    let non_zero = |values: &[E::ScalarField]| {
        Zeroizing::new(
            values
                .iter()
                .filter(|value| !value.is_zero())
                .copied()
                .collect::<Vec<_>>(),
        )
    };
    let a_scalars = non_zero(&evaluations.a);
    let b_scalars = non_zero(&evaluations.b);

    let h_scalars = Zeroizing::new(
        std::iter::successors(Some(evaluations.zt * toxic.delta_inverse), |power| {
            Some(*power * toxic.tau)
        })
        .take(domain.size() - 1)
        .collect::<Vec<_>>(),
    );

    let num_public = cs.num_public();
    let divided = |range: std::ops::Range<usize>, divisor: E::ScalarField| {
        Zeroizing::new(
            range
                .into_par_iter()
                .map(|j| {
                    (toxic.beta * evaluations.a[j] + toxic.alpha * evaluations.b[j] + evaluations.c[j])
                        * divisor
                })
                .collect::<Vec<_>>(),
        )
    };
    let k_scalars = divided(0..num_public, toxic.gamma_inverse);
    let l_scalars = divided(num_public..cs.num_wires(), toxic.delta_inverse);

    let g1 = E::G1::generator();
    let g2 = E::G2::generator();
    let ((a_query, b_g1_query), (b_g2_query, (h_query, (l_query, k)))) = rayon::join(
        || {
            rayon::join(
                || batch_mul(g1, &a_scalars),
                || batch_mul(g1, &b_scalars),
            )
        },
        || {
            rayon::join(
                || batch_mul(g2, &b_scalars),
                || {
                    rayon::join(
                        || batch_mul(g1, &h_scalars),
                        || {
                            rayon::join(
                                || batch_mul(g1, &l_scalars),
                                || batch_mul(g1, &k_scalars),
                            )
                        },
                    )
                },
            )
        },
    );
    debug!("Generated query vectors");

    let alpha_g1 = (g1 * toxic.alpha).into_affine();
    let beta_g1 = (g1 * toxic.beta).into_affine();
    let delta_g1 = (g1 * toxic.delta).into_affine();
    let beta_g2 = (g2 * toxic.beta).into_affine();
    let delta_g2 = (g2 * toxic.delta).into_affine();
    let gamma_g2 = (g2 * toxic.gamma).into_affine();

    let verifying_key = VerifyingKey {
        alpha_g1,
        beta_g2,
        gamma_g2,
        delta_g2,
        k,
        alpha_beta: E::pairing(alpha_g1, beta_g2),
    };
    let proving_key = ProvingKey {
        domain_size: domain.size(),
        num_wires: cs.num_wires(),
        num_public,
        alpha_g1,
        beta_g1,
        delta_g1,
        a_query,
        b_g1_query,
        h_query,
        l_query,
        beta_g2,
        delta_g2,
        b_g2_query,
        infinity_a,
        infinity_b,
    };
    (proving_key, verifying_key)
}

/// Clear the flag of every wire whose coefficients within some row sum to non-zero.
fn clear_used<F: Field>(matrix: &[LinearCombination<F>], at_infinity: &mut [bool]) {
    let mut row_sums = BTreeMap::new();
    for lc in matrix {
        row_sums.clear();
        for (coefficient, wire) in lc {
            *row_sums.entry(*wire).or_insert(F::ZERO) += coefficient;
        }
        for (wire, sum) in &row_sums {
            if !sum.is_zero() {
                at_infinity[*wire] = false;
            }
        }
    }
}

/// Which wires have an identically zero A (resp. B) polynomial, read off the matrices.
///
/// Distinct rows have independent Lagrange polynomials, so this matches the infinity flags
/// of a trusted setup for all but a negligible set of τ.
fn structural_infinity<F, C>(cs: &C) -> (Vec<bool>, Vec<bool>)
where
    F: Field,
    C: ConstraintSystem<F> + ?Sized,
{
    let mut infinity_a = vec![true; cs.num_wires()];
    let mut infinity_b = vec![true; cs.num_wires()];
    infinity_a[..cs.num_public()].fill(false);
    clear_used(cs.a(), &mut infinity_a);
    clear_used(cs.b(), &mut infinity_b);
    (infinity_a, infinity_b)
}

fn dummy_setup<E, C, R>(
    cs: &C,
    domain: &Radix2EvaluationDomain<E::ScalarField>,
    rng: &mut R,
) -> (ProvingKey<E>, VerifyingKey<E>)
where
    E: Pairing,
    C: ConstraintSystem<E::ScalarField> + ?Sized,
    R: RngCore + CryptoRng + ?Sized,
{
    let p1 = (E::G1::generator() * rand_nonzero_scalar::<_, E::ScalarField>(rng)).into_affine();
    let p2 = (E::G2::generator() * rand_nonzero_scalar::<_, E::ScalarField>(rng)).into_affine();

    let (infinity_a, infinity_b) = structural_infinity::<E::ScalarField, _>(cs);
    let a_len = infinity_a.iter().filter(|at_infinity| !**at_infinity).count();
    let b_len = infinity_b.iter().filter(|at_infinity| !**at_infinity).count();

    let verifying_key = VerifyingKey {
        alpha_g1: p1,
        beta_g2: p2,
        gamma_g2: p2,
        delta_g2: p2,
        k: vec![p1; cs.num_public()],
        alpha_beta: E::pairing(p1, p2),
    };
    let proving_key = ProvingKey {
        domain_size: domain.size(),
        num_wires: cs.num_wires(),
        num_public: cs.num_public(),
        alpha_g1: p1,
        beta_g1: p1,
        delta_g1: p1,
        a_query: vec![p1; a_len],
        b_g1_query: vec![p1; b_len],
        h_query: vec![p1; domain.size() - 1],
        l_query: vec![p1; cs.num_private()],
        beta_g2: p2,
        delta_g2: p2,
        b_g2_query: vec![p2; b_len],
        infinity_a,
        infinity_b,
    };
    (proving_key, verifying_key)
}
