//! Password list partitioning.
//!
//! Reproduces the legacy brute CLI's sharding behavior exactly, quirks
//! included, so shard layouts derived from it stay valid:
//!
//! - `per = P / W`, then `chunk = P / per` is the slicing stride. The double
//!   division is deliberate fidelity; do not simplify it. It makes the stride
//!   drift away from `per` whenever the integer divisions round differently,
//!   which can leave *fewer* windows than requested workers (e.g. P=6, W=4
//!   yields a single window). The coordinator simply runs one worker per
//!   shard, exactly like the legacy CLI spawned one thread per non-empty chunk.
//! - Excess windows beyond the worker count are dissolved one element at a
//!   time: pop a uniformly random element, append it to a uniformly random
//!   surviving shard. The RNG is a parameter so tests can seed it; only the
//!   multiset union is a stable contract of that step.

use rand::Rng;

use crate::error::{PicklockError, Result};

/// Split `passwords` into at most `workers` non-empty shards whose multiset
/// union equals the input.
pub fn partition(passwords: &[String], workers: usize) -> Result<Vec<Vec<String>>> {
    partition_with_rng(passwords, workers, &mut rand::thread_rng())
}

/// Partition with a caller-supplied RNG for the rebalancing step.
pub fn partition_with_rng<R: Rng>(
    passwords: &[String],
    workers: usize,
    rng: &mut R,
) -> Result<Vec<Vec<String>>> {
    if workers == 0 {
        return Err(PicklockError::Config(
            "thread count must be at least 1".into(),
        ));
    }
    if workers > passwords.len() {
        return Err(PicklockError::Config(
            "too many workers for password count".into(),
        ));
    }

    if workers == passwords.len() {
        return Ok(passwords.iter().map(|p| vec![p.clone()]).collect());
    }
    if workers == 1 {
        return Ok(vec![passwords.to_vec()]);
    }

    let per = passwords.len() / workers;
    let chunk = passwords.len() / per;
    let mut shards: Vec<Vec<String>> = passwords.chunks(chunk).map(<[String]>::to_vec).collect();

    if shards.len() > workers {
        // Dissolve the excess windows into the surviving shards, one random
        // element to one random shard at a time.
        for excess in workers..shards.len() {
            while !shards[excess].is_empty() {
                let shard = rng.gen_range(0..workers);
                let pick = rng.gen_range(0..shards[excess].len());
                let password = shards[excess].remove(pick);
                shards[shard].push(password);
            }
        }
        shards.truncate(workers);
    }

    Ok(shards)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn passwords(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("pw{i:03}")).collect()
    }

    fn multiset(shards: &[Vec<String>]) -> Vec<String> {
        let mut all: Vec<String> = shards.iter().flatten().cloned().collect();
        all.sort();
        all
    }

    #[test]
    fn one_worker_gets_everything() {
        let input = passwords(7);
        let shards = partition(&input, 1).unwrap();
        assert_eq!(shards, vec![input]);
    }

    #[test]
    fn worker_per_password_gives_singletons() {
        let input = passwords(4);
        let shards = partition(&input, 4).unwrap();
        assert_eq!(shards.len(), 4);
        for (shard, password) in shards.iter().zip(&input) {
            assert_eq!(shard, &vec![password.clone()]);
        }
    }

    #[test]
    fn rejects_more_workers_than_passwords() {
        let err = partition(&passwords(3), 4).unwrap_err();
        assert!(matches!(err, PicklockError::Config(_)));
        assert!(err.to_string().contains("too many workers"));
    }

    #[test]
    fn rejects_zero_workers() {
        assert!(partition(&passwords(3), 0).is_err());
    }

    #[test]
    fn excess_windows_dissolve_into_survivors() {
        // P=10, W=3: per=3, chunk=10/3=3 -> four windows, the fourth
        // (one element) gets dissolved into the first three.
        let input = passwords(10);
        let mut rng = StdRng::seed_from_u64(42);
        let shards = partition_with_rng(&input, 3, &mut rng).unwrap();
        assert_eq!(shards.len(), 3);
        let mut expected = input.clone();
        expected.sort();
        assert_eq!(multiset(&shards), expected);
        assert!(shards.iter().all(|s| !s.is_empty()));
    }

    #[test]
    fn stride_quirk_may_yield_fewer_shards_than_workers() {
        // P=6, W=4: per=1, chunk=6 -> one window holding the whole list.
        // Preserved on purpose; the coordinator runs one worker per shard.
        let input = passwords(6);
        let shards = partition(&input, 4).unwrap();
        assert_eq!(shards.len(), 1);
        assert_eq!(shards[0], input);
    }

    #[test]
    fn shard_order_is_contiguous_before_rebalancing() {
        // P=8, W=2: per=4, chunk=2 -> windows of two, four of them, last two
        // dissolved. The first `per` elements of the surviving shards keep
        // their contiguous window prefixes.
        let input = passwords(8);
        let mut rng = StdRng::seed_from_u64(7);
        let shards = partition_with_rng(&input, 2, &mut rng).unwrap();
        assert_eq!(shards.len(), 2);
        assert_eq!(&shards[0][..2], &input[0..2]);
        assert_eq!(&shards[1][..2], &input[2..4]);
        let mut expected = input.clone();
        expected.sort();
        assert_eq!(multiset(&shards), expected);
    }

    #[test]
    fn multiset_union_holds_across_sizes_and_counts() {
        for len in 1..=40 {
            let input = passwords(len);
            for workers in 1..=len {
                let mut rng = StdRng::seed_from_u64((len * 100 + workers) as u64);
                let shards = partition_with_rng(&input, workers, &mut rng).unwrap();
                assert!(shards.len() <= workers);
                assert!(shards.iter().all(|s| !s.is_empty()), "P={len} W={workers}");
                let mut expected = input.clone();
                expected.sort();
                assert_eq!(multiset(&shards), expected, "P={len} W={workers}");
            }
        }
    }
}
