use rand::seq::SliceRandom;
use rand::Rng;

/// Count members of each group `0..num_groups`
/// * `membership` - group index of each element
/// * `num_groups` - number of groups
pub fn count_membership(membership: &[usize], num_groups: usize) -> Vec<usize> {
    let mut counts = vec![0; num_groups];
    for &k in membership {
        if k < num_groups {
            counts[k] += 1;
        }
    }
    counts
}

/// Randomly permute a membership vector in place, drawing from
/// `rng` only. Group sizes are kept.
pub fn shuffle_membership<T, R>(membership: &mut [T], rng: &mut R)
where
    R: Rng + ?Sized,
{
    membership.shuffle(rng);
}
