//! Independent draws per group ("turma").

use log::info;

use std::collections::{BTreeMap, HashSet};

use snafu::prelude::*;

use crate::config::*;
use crate::quota::compute_quotas;
use crate::{allocate, check_unique_ids, partition_by_category};

/// Resolves the seat count of a group: the override wins over the declared count.
pub fn resolve_seats(group: &Group, overrides: &BTreeMap<String, u32>) -> LotteryResult<u32> {
    overrides
        .get(&group.id)
        .copied()
        .or(group.seats)
        .context(MissingGroupSeatsSnafu {
            group_id: group.id.clone(),
        })
}

/// Runs one draw per group, with the same percentages and seed for all of them.
///
/// Arguments:
/// * `groups` the groups, each with its own candidates
/// * `percentages` the share of each category, applied to every group
/// * `seed` the seed of the run. Each group derives its own streams from it
/// and from its id, so a group's draw does not depend on the other groups.
/// * `overrides` seat counts by group id, which take precedence over the
/// seats declared with the groups
///
/// The whole run is validated before any draw: a group without seats, a
/// duplicated group or a duplicated candidate aborts everything.
pub fn run_lottery_grouped(
    groups: &[Group],
    percentages: &PerCategory<f64>,
    seed: u64,
    overrides: &BTreeMap<String, u32>,
) -> LotteryResult<BTreeMap<String, Allocation>> {
    validate_percentages(percentages)?;

    let mut seen: HashSet<&str> = HashSet::new();
    let mut plan: Vec<(&Group, u32, &PerCategory<f64>)> = Vec::new();
    for group in groups.iter() {
        ensure!(
            seen.insert(group.id.as_str()),
            DuplicateGroupSnafu {
                group_id: group.id.clone()
            }
        );
        check_unique_ids(&group.candidates)?;
        let seats = resolve_seats(group, overrides)?;
        let group_percentages = match &group.percentages {
            Some(p) => {
                validate_percentages(p)?;
                p
            }
            None => percentages,
        };
        plan.push((group, seats, group_percentages));
    }

    info!(
        "Processing {} groups, seed: {}, percentages: {:?}",
        plan.len(),
        seed,
        percentages
    );

    let mut res: BTreeMap<String, Allocation> = BTreeMap::new();
    for (group, seats, group_percentages) in plan {
        info!(
            "Group {:?}: {} candidates for {} seats",
            group.id,
            group.candidates.len(),
            seats
        );
        if group.percentages.is_some() {
            info!(
                "Group {:?}: own percentages {:?}",
                group.id, group_percentages
            );
        }
        let split = compute_quotas(seats, group_percentages);
        let pools = partition_by_category(&group.candidates);
        let allocation = allocate(pools, &split, seed, Some(group.id.as_str()))?;
        res.insert(group.id.clone(), allocation);
    }
    Ok(res)
}
