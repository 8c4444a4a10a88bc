//! Seats per category, before any candidate is looked at.

use log::debug;

use crate::config::*;

/// Seats given to each category by its percentage, and the seats lost to rounding.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct QuotaSplit {
    pub base: PerCategory<u32>,
    pub leftover: u32,
}

/// Computes `floor(total_seats * percentage)` for each category.
///
/// The leftover is whatever the floors did not assign. The floors never add
/// up to more than `total_seats`: the tolerance on the percentages can push
/// them a few seats over for very large seat counts, in which case the excess
/// is taken back from the lowest priority categories first.
pub fn compute_quotas(total_seats: u32, percentages: &PerCategory<f64>) -> QuotaSplit {
    let mut base = percentages.map(|pct| {
        let seats = (total_seats as f64) * pct.max(0.0) + PCT_EPSILON;
        seats.floor() as u32
    });
    let assigned: u64 = base.0.iter().map(|x| *x as u64).sum();
    let mut excess = assigned.saturating_sub(total_seats as u64);
    if excess > 0 {
        debug!(
            "compute_quotas: floors exceed {} seats by {}",
            total_seats, excess
        );
    }
    for category in Category::ALL.into_iter().rev() {
        let taken = excess.min(base[category] as u64);
        base[category] -= taken as u32;
        excess -= taken;
    }
    let assigned: u32 = base.0.iter().sum();
    let leftover = total_seats - assigned;
    debug!(
        "compute_quotas: seats: {} base: {:?} leftover: {}",
        total_seats, base, leftover
    );
    QuotaSplit { base, leftover }
}

/// How many of the leftover seats each category receives.
///
/// One seat at a time, in priority order, starting again from `Aluno` if
/// there are more leftover seats than categories.
pub fn leftover_shares(leftover: u32) -> PerCategory<u32> {
    let n = Category::ALL.len() as u32;
    PerCategory::from_fn(|c| {
        let position = (c.rank() - 1) as u32;
        leftover / n + u32::from(position < leftover % n)
    })
}

/// Base quotas plus the leftover shares.
pub fn distribute_leftover(split: &QuotaSplit) -> PerCategory<u32> {
    let shares = leftover_shares(split.leftover);
    PerCategory::from_fn(|c| split.base[c] + shares[c])
}
