use super::{Proof, ProverConfig, ProvingKey};
use crate::circuits::ConstraintSystem;
use crate::error::{Groth16Error, Result};
use crate::helpers::{rand_scalar, with_thread_pool};
use crate::qap;
use crate::witness::Witness;
use ark_ec::pairing::Pairing;
use ark_ec::CurveGroup;
use ark_ff::Field;
use ark_poly::EvaluationDomain;
use ark_std::Zero;
use itertools::izip;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{CryptoRng, RngCore, SeedableRng};
use rootcause::prelude::ResultExt;
use rootcause::report;
use std::time::Instant;
use zeroize::{Zeroize, Zeroizing};

fn msm<G: CurveGroup>(bases: &[G::Affine], scalars: &[G::ScalarField]) -> Result<G> {
    G::msm(bases, scalars).map_err(|_| {
        report!(Groth16Error::InputSizeMismatch {
            expected: bases.len(),
            actual: scalars.len(),
        })
        .attach("Multi-scalar multiplication against a proving key query")
    })
}

/// Witness values of the wires not flagged at infinity, in query order.
fn select<F: Field>(witness: &[F], at_infinity: &[bool]) -> Zeroizing<Vec<F>> {
    Zeroizing::new(
        izip!(witness, at_infinity)
            .filter(|(_, at_infinity)| !**at_infinity)
            .map(|(value, _)| *value)
            .collect(),
    )
}

/// Check that `cs` is the circuit `proving_key` was generated for, as far as shapes go.
fn check_circuit<E, C>(cs: &C, proving_key: &ProvingKey<E>) -> Result<()>
where
    E: Pairing,
    C: ConstraintSystem<E::ScalarField> + ?Sized,
{
    cs.validate().attach("Validating constraint system for proving")?;
    let domain = qap::domain::<E::ScalarField>(cs.num_constraints(), cs.num_public())?;
    if cs.num_wires() != proving_key.num_wires
        || cs.num_public() != proving_key.num_public
        || domain.size() != proving_key.domain_size
    {
        return Err(report!(Groth16Error::MalformedConstraintSystem)
            .attach(format!(
                "Circuit: {} wires ({} public), domain of size {}",
                cs.num_wires(),
                cs.num_public(),
                domain.size()
            ))
            .attach(format!(
                "Proving key: {} wires ({} public), domain of size {}",
                proving_key.num_wires, proving_key.num_public, proving_key.domain_size
            )));
    }
    Ok(())
}

/// Prove knowledge of `witness` for `cs`, drawing the blinding factors from an OS seeded RNG.
///
/// The witness is the full assignment (constant one, public, then private wires) and must
/// match the key's wire count. Satisfaction is not checked here: a witness that violates a
/// constraint still yields a proof, which simply does not verify.
pub fn prove<E, C>(
    cs: &C,
    proving_key: &ProvingKey<E>,
    witness: &Witness<E::ScalarField>,
    config: &ProverConfig,
) -> Result<Proof<E>>
where
    E: Pairing,
    C: ConstraintSystem<E::ScalarField> + ?Sized,
{
    prove_with_rng(cs, proving_key, witness, config, &mut StdRng::from_os_rng())
}

/// [`prove`] with a caller supplied RNG for `r` and `s`.
pub fn prove_with_rng<E, C, R>(
    cs: &C,
    proving_key: &ProvingKey<E>,
    witness: &Witness<E::ScalarField>,
    config: &ProverConfig,
    rng: &mut R,
) -> Result<Proof<E>>
where
    E: Pairing,
    C: ConstraintSystem<E::ScalarField> + ?Sized,
    R: RngCore + CryptoRng + ?Sized,
{
    let start = Instant::now();
    if witness.len() != proving_key.num_wires {
        return Err(report!(Groth16Error::InputSizeMismatch {
            expected: proving_key.num_wires,
            actual: witness.len(),
        })
        .attach("Full witness length"));
    }
    check_circuit(cs, proving_key)?;

    let (mut r, mut s) = if config.zero_knowledge {
        (rand_scalar(rng), rand_scalar(rng))
    } else {
        (E::ScalarField::zero(), E::ScalarField::zero())
    };

    let proof = with_thread_pool(config.num_threads, || {
        assemble(cs, proving_key, witness.values(), config.zero_knowledge, r, s)
    });
    r.zeroize();
    s.zeroize();

    info!("prover time: {:?}", start.elapsed());
    proof
}

fn assemble<E, C>(
    cs: &C,
    pk: &ProvingKey<E>,
    w: &[E::ScalarField],
    zero_knowledge: bool,
    r: E::ScalarField,
    s: E::ScalarField,
) -> Result<Proof<E>>
where
    E: Pairing,
    C: ConstraintSystem<E::ScalarField> + ?Sized,
{
    let domain = qap::domain::<E::ScalarField>(cs.num_constraints(), cs.num_public())?;
    let h = Zeroizing::new(qap::quotient_coefficients(cs, &domain, w)?);
    let h = &h[..pk.h_query.len().min(h.len())];
    debug!("Computed quotient polynomial");

    let a_scalars = select(w, &pk.infinity_a);
    let b_scalars = select(w, &pk.infinity_b);
    let private = &w[pk.num_public..];

    let ((a_sum, b_g1_sum), (b_g2_sum, (h_sum, l_sum))) = rayon::join(
        || {
            rayon::join(
                || msm::<E::G1>(&pk.a_query, &a_scalars),
                || {
                    // B in G1 only feeds the blinding term of C.
                    if zero_knowledge {
                        msm::<E::G1>(&pk.b_g1_query, &b_scalars)
                    } else {
                        Ok(E::G1::zero())
                    }
                },
            )
        },
        || {
            rayon::join(
                || msm::<E::G2>(&pk.b_g2_query, &b_scalars),
                || {
                    rayon::join(
                        || msm::<E::G1>(&pk.h_query, h),
                        || msm::<E::G1>(&pk.l_query, private),
                    )
                },
            )
        },
    );
    debug!("Computed multi-scalar multiplications");

    let a = a_sum? + pk.alpha_g1 + pk.delta_g1 * r;
    let b = b_g2_sum? + pk.beta_g2 + pk.delta_g2 * s;
    let mut c = h_sum? + l_sum?;
    if zero_knowledge {
        let b_g1 = b_g1_sum? + pk.beta_g1 + pk.delta_g1 * s;
        c += a * s + b_g1 * r - pk.delta_g1 * (r * s);
    }

    Ok(Proof {
        a: a.into_affine(),
        b: b.into_affine(),
        c: c.into_affine(),
    })
}
