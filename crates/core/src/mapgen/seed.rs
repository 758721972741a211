//! Seed mixing shared by the generator and the confused-stumble roll.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::Rng;

pub(crate) fn mix_seed_stream(seed: u64, stream: u64) -> u64 {
    let mut mixed = seed ^ stream.wrapping_mul(0xD6E8_FD9A_5B89_7A4D);
    mixed ^= mixed >> 33;
    mixed = mixed.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    mixed ^= mixed >> 33;
    mixed = mixed.wrapping_mul(0xC4CE_B9FE_1A85_EC53);
    mixed ^ (mixed >> 33)
}

/// One independent stream per floor of a session.
pub(crate) fn derive_floor_seed(session_seed: u64, floor_index: u32) -> u64 {
    let mut mixed = session_seed ^ 0x9E37_79B9_7F4A_7C15;
    mixed ^= u64::from(floor_index).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    mixed ^= mixed >> 30;
    mixed = mixed.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    mixed ^= mixed >> 27;
    mixed = mixed.wrapping_mul(0x94D0_49BB_1331_11EB);
    mixed ^ (mixed >> 31)
}

/// Uniform pick in `min..=max`.
pub(super) fn roll(rng: &mut ChaCha8Rng, min: usize, max: usize) -> usize {
    debug_assert!(min <= max);
    min + (rng.next_u64() as usize % (max - min + 1))
}

pub(super) fn coin_flip(rng: &mut ChaCha8Rng) -> bool {
    rng.next_u64() & 1 == 0
}

#[cfg(test)]
mod tests {
    use rand_chacha::rand_core::SeedableRng;

    use super::*;

    #[test]
    fn roll_stays_inside_requested_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(12_345);
        for _ in 0..200 {
            assert!((7..=13).contains(&roll(&mut rng, 7, 13)));
        }
        assert_eq!(roll(&mut rng, 4, 4), 4);
    }

    #[test]
    fn floor_seed_changes_when_inputs_change() {
        let baseline = derive_floor_seed(99, 2);
        assert_ne!(baseline, derive_floor_seed(98, 2));
        assert_ne!(baseline, derive_floor_seed(99, 3));
        assert_eq!(baseline, derive_floor_seed(99, 2));
    }
}
