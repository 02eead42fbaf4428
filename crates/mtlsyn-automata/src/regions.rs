//! The K-region abstraction of clock values
//!
//! For a maximal constant K, the non-negative reals are partitioned into the
//! regions `{0}, (0, 1), {1}, (1, 2), …, {K}, (K, ∞)`. Regions are numbered
//! consecutively: the region index of an integral value `v ≤ K` is `2v`, the
//! index of a fractional value `v < K + 1` is `2⌊v⌋ + 1`, and every larger
//! value belongs to the saturated class with index `2K + 1`. Two clock
//! values with the same region index satisfy the same clock constraints with
//! constants up to K.

use crate::{ClockConstraint, ComparisonOp, Time};

/// Index of a clock region
pub type RegionIndex = u32;

/// The integer part of a time value
pub fn get_integer_part(value: Time) -> RegionIndex {
    value.trunc() as RegionIndex
}

/// The fractional part of a time value
pub fn get_fractional_part(value: Time) -> Time {
    value.fract()
}

/// The largest region index for the maximal constant `k`
pub fn get_maximal_region_index(k: RegionIndex) -> RegionIndex {
    2 * k + 1
}

/// Compute the region index of a clock value for the maximal constant `k`
///
/// # Example
///
/// ```
/// use mtlsyn_automata::regions::get_region_index;
///
/// assert_eq!(get_region_index(0.0, 2), 0);
/// assert_eq!(get_region_index(0.5, 2), 1);
/// assert_eq!(get_region_index(2.0, 2), 4);
/// assert_eq!(get_region_index(2.5, 2), 5);
/// // values of 3.0 and beyond are all in the saturated class
/// assert_eq!(get_region_index(17.0, 2), 5);
/// ```
pub fn get_region_index(value: Time, k: RegionIndex) -> RegionIndex {
    let integer_part = get_integer_part(value);
    if get_fractional_part(value) == 0.0 && integer_part <= k {
        2 * integer_part
    } else if value < Time::from(k + 1) {
        2 * integer_part + 1
    } else {
        get_maximal_region_index(k)
    }
}

/// The clock constraints describing a region
///
/// An even region index `2n` corresponds to `x = n`, an odd index `2n + 1`
/// below the saturated class to `n < x < n + 1`, and the saturated class to
/// `x > K`. Used to reconstruct guards when extracting a controller.
pub fn get_clock_constraints_from_region_index(
    region_index: RegionIndex,
    k: RegionIndex,
) -> Vec<ClockConstraint> {
    if region_index >= get_maximal_region_index(k) {
        vec![ClockConstraint::new(ComparisonOp::Greater, k)]
    } else if region_index % 2 == 0 {
        vec![ClockConstraint::new(ComparisonOp::Equal, region_index / 2)]
    } else {
        vec![
            ClockConstraint::new(ComparisonOp::Greater, (region_index - 1) / 2),
            ClockConstraint::new(ComparisonOp::Less, (region_index + 1) / 2),
        ]
    }
}

/// Enumerate the time successors of a single region
///
/// Returns the regions reachable from `region_index` by letting time elapse,
/// together with the number of region steps needed to reach them, starting
/// with `(0, region_index)` and ending in the saturated class.
pub fn get_region_time_successors(
    region_index: RegionIndex,
    k: RegionIndex,
) -> Vec<(RegionIndex, RegionIndex)> {
    let max_index = get_maximal_region_index(k);
    (region_index..=max_index)
        .map(|successor| (successor - region_index, successor))
        .collect()
}
