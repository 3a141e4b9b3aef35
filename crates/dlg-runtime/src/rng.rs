pub(crate) fn next_random_u32(state: &mut u32) -> u32 {
    let mut next = state.wrapping_add(0x6d2b79f5);
    *state = next;
    next = (next ^ (next >> 15)).wrapping_mul(next | 1);
    next ^= next.wrapping_add((next ^ (next >> 7)).wrapping_mul(next | 61));
    next ^ (next >> 14)
}

/// Uniform integer in `[0, bound)`, rejecting the biased tail.
pub(crate) fn next_random_bounded(state: &mut u32, bound: u32) -> u32 {
    let limit = (u64::from(u32::MAX) + 1) / u64::from(bound) * u64::from(bound);
    loop {
        let candidate = next_random_u32(state);
        if u64::from(candidate) < limit {
            return candidate % bound;
        }
    }
}

/// Uniform sample in `[0, 1)`.
pub(crate) fn next_random_unit(state: &mut u32) -> f64 {
    next_random_unit_with(state, next_random_u32)
}

pub(crate) fn next_random_unit_with<F>(state: &mut u32, mut next: F) -> f64
where
    F: FnMut(&mut u32) -> u32,
{
    f64::from(next(state)) / (f64::from(u32::MAX) + 1.0)
}

#[cfg(test)]
mod rng_tests {
    use super::*;

    #[test]
    fn unit_sample_stays_below_one() {
        let mut state = 0u32;
        assert_eq!(next_random_unit_with(&mut state, |_s| 0), 0.0);
        let top = next_random_unit_with(&mut state, |_s| u32::MAX);
        assert!(top < 1.0);
        assert!(top > 0.999_999);
    }

    #[test]
    fn bounded_values_stay_in_range() {
        let mut state = 11u32;
        assert!((0..1_000).all(|_| next_random_bounded(&mut state, 6) < 6));
    }

    #[test]
    fn sequence_is_deterministic_for_a_seed() {
        let mut left = 7u32;
        let mut right = 7u32;
        let a = (0..4).map(|_| next_random_u32(&mut left)).collect::<Vec<_>>();
        let b = (0..4).map(|_| next_random_u32(&mut right)).collect::<Vec<_>>();
        assert_eq!(a, b);
        assert_eq!(left, right);
    }
}
