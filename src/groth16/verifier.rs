use super::{Proof, VerifyingKey};
use crate::error::{Groth16Error, Result};
use crate::witness::Witness;
use ark_ec::pairing::Pairing;
use ark_ec::{AffineRepr, CurveGroup, VariableBaseMSM};
use log::{debug, info};
use rootcause::report;
use std::time::Instant;

/// Check `proof` against `verifying_key` and the public witness (constant one included).
///
/// Returns `Ok(false)` for a well formed but invalid proof; errors are reserved for a public
/// witness of the wrong length.
pub fn verify<E: Pairing>(
    proof: &Proof<E>,
    verifying_key: &VerifyingKey<E>,
    public_witness: &Witness<E::ScalarField>,
) -> Result<bool> {
    let start = Instant::now();
    if public_witness.len() != verifying_key.k.len() {
        return Err(report!(Groth16Error::InputSizeMismatch {
            expected: verifying_key.k.len(),
            actual: public_witness.len(),
        })
        .attach("Public witness length, constant one included"));
    }
    debug!("Public witness: {:?}", public_witness.values());

    let ic = E::G1::msm(&verifying_key.k, public_witness.values()).map_err(|_| {
        report!(Groth16Error::InputSizeMismatch {
            expected: verifying_key.k.len(),
            actual: public_witness.len(),
        })
    })?;

    // e(A, B) = e(α, β)·e(IC, γ)·e(C, δ), with the right hand side moved across.
    let negated = E::G1::normalize_batch(&[-ic, -proof.c.into_group()]);
    let lhs = E::multi_pairing(
        [proof.a, negated[0], negated[1]],
        [proof.b, verifying_key.gamma_g2, verifying_key.delta_g2],
    );
    let valid = lhs == verifying_key.alpha_beta;

    info!("verifier time: {:?}, valid: {}", start.elapsed(), valid);
    Ok(valid)
}
