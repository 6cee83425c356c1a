use ark_ff::Field;
use log::warn;
use rand::RngCore;

/// Sample a uniform field element by rejection from random bytes.
pub fn rand_scalar<T, S>(rng: &mut T) -> S
where
    T: RngCore + ?Sized,
    S: Field,
{
    // Enough bytes for any base prime field extension degree arkworks ships.
    let mut bytes = [0; 256];
    loop {
        rng.fill_bytes(&mut bytes);
        if let Some(out) = S::from_random_bytes(&bytes) {
            return out;
        }
    }
}

/// Like [`rand_scalar`], but never returns zero.
pub fn rand_nonzero_scalar<T, S>(rng: &mut T) -> S
where
    T: RngCore + ?Sized,
    S: Field,
{
    loop {
        let out: S = rand_scalar(rng);
        if !out.is_zero() {
            return out;
        }
    }
}

/// Run `op` on a dedicated rayon pool of `num_threads` workers, or on the global pool.
pub(crate) fn with_thread_pool<T, OP>(num_threads: Option<usize>, op: OP) -> T
where
    T: Send,
    OP: FnOnce() -> T + Send,
{
    let Some(num_threads) = num_threads else {
        return op();
    };
    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
    {
        Ok(pool) => pool.install(op),
        Err(e) => {
            warn!("Could not build a {num_threads} thread pool, falling back to the global one: {e}");
            op()
        }
    }
}

#[cfg(test)]
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::Zero;

    type Field = ark_mnt6_753::Fr;

    #[test]
    fn scalars_are_not_repeated() {
        let mut rng = rand::rng();
        let a: Field = rand_scalar(&mut rng);
        let b: Field = rand_scalar(&mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn nonzero_scalar() {
        let mut rng = rand::rng();
        for _ in 0..16 {
            let x: Field = rand_nonzero_scalar(&mut rng);
            assert!(!x.is_zero());
        }
    }

    #[test]
    fn thread_pool_hint_runs_closure() {
        assert_eq!(with_thread_pool(Some(2), || rayon::current_num_threads()), 2);
        assert_eq!(with_thread_pool(None, || 7), 7);
    }
}
