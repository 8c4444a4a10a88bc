/*!
Deterministic seat lotteries with priority quotas.

A fixed number of seats is shared among candidates of three categories,
[`Category::Aluno`], [`Category::Servidor`] and
[`Category::ComunidadeExterna`], in that order of priority. Each category is
reserved a percentage of the seats; seats lost to rounding and seats that a
category cannot fill are handed to the other categories by priority. Inside a
category, candidates are drawn with a generator derived from a single seed, so
that anyone holding the input and the seed can replay the draw.

See the [`manual`] for the full rules, and [`builder::Builder`] for the
simplest way to run a draw.
*/

mod config;
pub mod builder;
pub mod groups;
pub mod manual;
pub mod quota;
pub mod sampler;

use log::{debug, info, warn};

use std::collections::HashSet;

pub use crate::config::*;
pub use crate::groups::run_lottery_grouped;
use crate::quota::{compute_quotas, leftover_shares, QuotaSplit};
use crate::sampler::{category_salt, shuffle};

/// Runs a single draw over all the candidates.
///
/// Arguments:
/// * `candidates` the candidates, in input order. The order matters for
/// reproducibility: the same file must be given in the same order.
/// * `config` the seats and the percentages
/// * `seed` the seed of the draw
pub fn run_lottery(
    candidates: &[Candidate],
    config: &QuotaConfig,
    seed: u64,
) -> LotteryResult<Allocation> {
    validate_percentages(&config.percentages)?;
    check_unique_ids(candidates)?;
    info!(
        "Processing {} candidates for {} seats, seed: {}",
        candidates.len(),
        config.total_seats,
        seed
    );
    let pools = partition_by_category(candidates);
    let split = compute_quotas(config.total_seats, &config.percentages);
    allocate(pools, &split, seed, None)
}

/// Splits the candidates by category, keeping the input order inside each category.
pub fn partition_by_category(candidates: &[Candidate]) -> PerCategory<Vec<Candidate>> {
    let mut pools: PerCategory<Vec<Candidate>> = PerCategory::default();
    for c in candidates.iter() {
        pools[c.category].push(c.clone());
    }
    pools
}

pub(crate) fn check_unique_ids(candidates: &[Candidate]) -> LotteryResult<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for c in candidates.iter() {
        if !seen.insert(c.id.as_str()) {
            return DuplicateCandidateSnafu { id: c.id.clone() }.fail();
        }
    }
    Ok(())
}

/// Draws the candidates of each category against the quotas.
///
/// Arguments:
/// * `pools` the candidates of each category, in input order
/// * `split` the base quotas and the rounding leftover
/// * `seed` the seed of the draw
/// * `group` the group being drawn, if any. It qualifies the salts of the
/// shuffles, so that two groups never share a draw.
///
/// The procedure:
/// 1. the rounding leftover goes one seat at a time to each category, by priority;
/// 2. each category, by priority, is shuffled and its first `quota` candidates are approved;
/// 3. a category without enough candidates passes the missing seats to the next category;
/// 4. seats that are still empty at the end go to the waitlists, by priority;
/// 5. approved and waitlisted candidates are gathered by priority.
pub fn allocate(
    pools: PerCategory<Vec<Candidate>>,
    split: &QuotaSplit,
    seed: u64,
    group: Option<&str>,
) -> LotteryResult<Allocation> {
    let total_seats: u32 = split.base.0.iter().sum::<u32>() + split.leftover;
    let total_candidates: usize = pools.0.iter().map(|p| p.len()).sum();
    if total_candidates == 0 {
        warn!("allocate: group {:?}: no candidates", group);
    }
    if total_seats == 0 {
        warn!(
            "allocate: group {:?}: no seats, all {} candidates go to the waitlist",
            group, total_candidates
        );
    }

    let bonus = leftover_shares(split.leftover);
    let mut stats: PerCategory<CategoryStats> = PerCategory::default();
    let mut approved: PerCategory<Vec<Candidate>> = PerCategory::default();
    let mut waiting: PerCategory<Vec<Candidate>> = PerCategory::default();

    // Seats passed down by categories that ran out of candidates.
    let mut carry: u32 = 0;
    for category in Category::ALL {
        let pool = &pools[category];
        let salt = category_salt(group, category);
        let mut drawn = shuffle(pool, seed, &salt)?;

        let quota = split.base[category] + bonus[category] + carry;
        let available = drawn.len() as u32;
        let taken = quota.min(available);
        let rest = drawn.split_off(taken as usize);
        let shortfall = quota - taken;

        stats[category] = CategoryStats {
            base_quota: split.base[category],
            rounding_bonus: bonus[category],
            carried_in: carry,
            quota,
            available,
            approved: taken,
            swept_in: 0,
            shortfall,
        };
        debug!(
            "allocate: group {:?} {}: quota {} (base {}, bonus {}, carried {}) available {} approved {}",
            group, category, quota, split.base[category], bonus[category], carry, available, taken
        );

        approved[category] = drawn;
        waiting[category] = rest;
        carry = shortfall;
    }

    // The last categories may have left seats that nobody after them could
    // take. Offer them to the waitlists, highest priority first.
    let mut empty_seats = carry;
    for category in Category::ALL {
        if empty_seats == 0 {
            break;
        }
        let n = empty_seats.min(waiting[category].len() as u32);
        if n > 0 {
            let moved: Vec<Candidate> = waiting[category].drain(..n as usize).collect();
            debug!(
                "allocate: group {:?} {}: {} seats filled from the waitlist",
                group, category, n
            );
            approved[category].extend(moved);
            stats[category].swept_in = n;
            empty_seats -= n;
        }
    }
    if empty_seats > 0 {
        info!(
            "allocate: group {:?}: {} seats left empty for lack of candidates",
            group, empty_seats
        );
    }

    let allocation = Allocation {
        approved: approved.0.into_iter().flatten().collect(),
        waitlist: waiting.0.into_iter().flatten().collect(),
        stats,
        unfilled: empty_seats,
    };
    info!(
        "allocate: group {:?}: {} approved, {} on the waitlist",
        group,
        allocation.approved.len(),
        allocation.waitlist.len()
    );
    Ok(allocation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn make(prefix: &str, category: Category, n: usize) -> Vec<Candidate> {
        (0..n)
            .map(|i| Candidate::new(&format!("{}{}", prefix, i), category))
            .collect()
    }

    fn field(aluno: usize, servidor: usize, comunidade: usize) -> Vec<Candidate> {
        let mut res = make("a", Category::Aluno, aluno);
        res.extend(make("s", Category::Servidor, servidor));
        res.extend(make("c", Category::ComunidadeExterna, comunidade));
        res
    }

    fn config(seats: u32, a: f64, s: f64, c: f64) -> QuotaConfig {
        QuotaConfig::new(seats, PerCategory::new(a, s, c)).unwrap()
    }

    fn count(cs: &[Candidate], category: Category) -> usize {
        cs.iter().filter(|c| c.category == category).count()
    }

    fn ids(cs: &[Candidate]) -> Vec<String> {
        cs.iter().map(|c| c.id.clone()).collect()
    }

    fn check_partition(candidates: &[Candidate], res: &Allocation) {
        assert_eq!(
            res.approved.len() + res.waitlist.len(),
            candidates.len(),
            "conservation"
        );
        let mut all = ids(&res.approved);
        all.extend(ids(&res.waitlist));
        all.sort();
        let mut expected = ids(candidates);
        expected.sort();
        assert_eq!(all, expected);
        for c in res.approved.iter().chain(res.waitlist.iter()) {
            let input = candidates.iter().find(|o| o.id == c.id).unwrap();
            assert_eq!(input.category, c.category);
        }
    }

    #[test]
    fn quotas_met_with_surplus() {
        init();
        let candidates = field(10, 2, 1);
        let res = run_lottery(&candidates, &config(7, 0.5, 0.3, 0.2), 42).unwrap();
        check_partition(&candidates, &res);
        assert_eq!(res.approved.len(), 7);
        assert_eq!(count(&res.approved, Category::Aluno), 4);
        assert_eq!(count(&res.approved, Category::Servidor), 2);
        assert_eq!(count(&res.approved, Category::ComunidadeExterna), 1);
        assert_eq!(res.waitlist.len(), 6);
        assert!(res.waitlist.iter().all(|c| c.category == Category::Aluno));
        assert_eq!(res.unfilled, 0);
        assert_eq!(res.stats[Category::Aluno].base_quota, 3);
        assert_eq!(res.stats[Category::Aluno].rounding_bonus, 1);
        assert_eq!(res.stats[Category::Aluno].quota, 4);
    }

    #[test]
    fn same_seed_same_draw() {
        let candidates = field(10, 5, 5);
        let cfg = config(7, 0.5, 0.3, 0.2);
        let r1 = run_lottery(&candidates, &cfg, 42).unwrap();
        let r2 = run_lottery(&candidates, &cfg, 42).unwrap();
        assert_eq!(ids(&r1.approved), ids(&r2.approved));
        assert_eq!(ids(&r1.waitlist), ids(&r2.waitlist));
    }

    #[test]
    fn other_seed_other_draw() {
        let candidates = field(40, 0, 0);
        let cfg = config(10, 1.0, 0.0, 0.0);
        let r1 = run_lottery(&candidates, &cfg, 1).unwrap();
        let r2 = run_lottery(&candidates, &cfg, 2).unwrap();
        assert_ne!(ids(&r1.approved), ids(&r2.approved));
    }

    #[test]
    fn shortfall_flows_down() {
        let candidates = field(2, 2, 1);
        let res = run_lottery(&candidates, &config(7, 0.5, 0.3, 0.2), 42).unwrap();
        check_partition(&candidates, &res);
        assert_eq!(res.approved.len(), 5);
        assert!(res.waitlist.is_empty());
        assert_eq!(res.unfilled, 2);

        let aluno = res.stats[Category::Aluno];
        assert_eq!((aluno.quota, aluno.approved, aluno.shortfall), (4, 2, 2));
        let servidor = res.stats[Category::Servidor];
        assert_eq!(servidor.carried_in, 2);
        assert_eq!(
            (servidor.quota, servidor.approved, servidor.shortfall),
            (4, 2, 2)
        );
        let comunidade = res.stats[Category::ComunidadeExterna];
        assert_eq!(comunidade.carried_in, 2);
        assert_eq!(comunidade.quota, 3);
        assert_eq!(comunidade.approved, 1);
    }

    #[test]
    fn shortfall_absorbed_by_next_category() {
        // Aluno quota 4 with 1 candidate: Servidor gets 3 more seats.
        let candidates = field(1, 10, 10);
        let res = run_lottery(&candidates, &config(7, 0.5, 0.3, 0.2), 3).unwrap();
        check_partition(&candidates, &res);
        assert_eq!(res.approved.len(), 7);
        assert_eq!(count(&res.approved, Category::Aluno), 1);
        assert_eq!(count(&res.approved, Category::Servidor), 5);
        assert_eq!(count(&res.approved, Category::ComunidadeExterna), 1);
        assert_eq!(res.stats[Category::Servidor].carried_in, 3);
    }

    #[test]
    fn last_category_shortfall_goes_to_waitlists_by_priority() {
        // Comunidade has no candidates: its seat goes to the Aluno waitlist.
        let candidates = field(10, 5, 0);
        let res = run_lottery(&candidates, &config(7, 0.5, 0.3, 0.2), 42).unwrap();
        check_partition(&candidates, &res);
        assert_eq!(res.approved.len(), 7);
        assert_eq!(count(&res.approved, Category::Aluno), 5);
        assert_eq!(count(&res.approved, Category::Servidor), 2);
        assert_eq!(res.stats[Category::Aluno].swept_in, 1);
        assert_eq!(res.stats[Category::Servidor].swept_in, 0);
        assert_eq!(res.unfilled, 0);
    }

    #[test]
    fn swept_candidates_are_the_head_of_the_waitlist() {
        let candidates = field(10, 0, 0);
        let cfg_full = config(5, 1.0, 0.0, 0.0);
        let cfg_sweep = config(5, 0.0, 0.0, 1.0);
        // Same salt for Aluno in both runs: the sweep takes the waitlist in draw order.
        let full = run_lottery(&candidates, &cfg_full, 9).unwrap();
        let swept = run_lottery(&candidates, &cfg_sweep, 9).unwrap();
        assert_eq!(ids(&full.approved), ids(&swept.approved));
        assert_eq!(ids(&full.waitlist), ids(&swept.waitlist));
        assert_eq!(swept.stats[Category::Aluno].swept_in, 5);
    }

    #[test]
    fn fewer_candidates_than_seats() {
        let candidates = field(1, 1, 1);
        let res = run_lottery(&candidates, &config(10, 0.5, 0.3, 0.2), 0).unwrap();
        check_partition(&candidates, &res);
        assert_eq!(res.approved.len(), 3);
        assert!(res.waitlist.is_empty());
        assert_eq!(res.unfilled, 7);
        assert_eq!(res.total_seats(), 10);
    }

    #[test]
    fn no_candidates() {
        let res = run_lottery(&[], &config(10, 0.5, 0.3, 0.2), 0).unwrap();
        assert!(res.approved.is_empty());
        assert!(res.waitlist.is_empty());
        assert_eq!(res.unfilled, 10);
    }

    #[test]
    fn huge_seat_count_reports_the_configured_seats() {
        let res = run_lottery(&[], &config(4_000_000_000, 0.5000000005, 0.5, 0.0), 0).unwrap();
        assert_eq!(res.total_seats(), 4_000_000_000);
        assert_eq!(res.unfilled, 4_000_000_000);
    }

    #[test]
    fn no_seats() {
        let candidates = field(3, 2, 1);
        let res = run_lottery(&candidates, &config(0, 0.5, 0.3, 0.2), 0).unwrap();
        check_partition(&candidates, &res);
        assert!(res.approved.is_empty());
        assert_eq!(res.waitlist.len(), 6);
    }

    #[test]
    fn rounding_leftover_favours_priority() {
        // base 2/2/2, leftover 2 -> 3/3/2
        let candidates = field(10, 10, 10);
        let res = run_lottery(&candidates, &config(8, 0.3, 0.3, 0.3), 5).unwrap();
        assert_eq!(count(&res.approved, Category::Aluno), 3);
        assert_eq!(count(&res.approved, Category::Servidor), 3);
        assert_eq!(count(&res.approved, Category::ComunidadeExterna), 2);
    }

    #[test]
    fn approved_are_ordered_by_priority() {
        let mut candidates = field(0, 0, 4);
        candidates.extend(field(4, 4, 0));
        let res = run_lottery(&candidates, &config(6, 0.34, 0.33, 0.33), 11).unwrap();
        let ranks: Vec<u8> = res.approved.iter().map(|c| c.category.rank()).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
        let ranks: Vec<u8> = res.waitlist.iter().map(|c| c.category.rank()).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
    }

    #[test]
    fn seat_bound_holds() {
        for seats in 0..15 {
            for (a, s, c) in [(0, 0, 0), (3, 0, 9), (12, 1, 0), (2, 2, 2), (0, 7, 1)] {
                let candidates = field(a, s, c);
                let res =
                    run_lottery(&candidates, &config(seats, 0.5, 0.25, 0.25), seats as u64)
                        .unwrap();
                check_partition(&candidates, &res);
                let expected = (seats as usize).min(candidates.len());
                assert_eq!(res.approved.len(), expected);
            }
        }
    }

    #[test]
    fn attributes_are_carried() {
        let c = Candidate::with_attributes(
            "1",
            Category::Servidor,
            vec![("nome".to_string(), "Maria".to_string())],
        );
        let res = run_lottery(&[c.clone()], &config(1, 0.5, 0.5, 0.0), 1).unwrap();
        assert_eq!(res.approved, vec![c]);
        assert_eq!(res.approved[0].attribute("nome"), Some("Maria"));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut candidates = field(2, 0, 0);
        candidates.push(Candidate::new("a0", Category::Servidor));
        let err = run_lottery(&candidates, &config(2, 0.5, 0.5, 0.0), 1).unwrap_err();
        assert_eq!(
            err,
            LotteryError::DuplicateCandidate {
                id: "a0".to_string()
            }
        );
    }

    #[test]
    fn invalid_percentages() {
        let err = QuotaConfig::new(5, PerCategory::new(0.6, 0.3, 0.2)).unwrap_err();
        assert!(matches!(err, LotteryError::PercentagesExceedOne { .. }));
        let err = QuotaConfig::new(5, PerCategory::new(-0.1, 0.3, 0.2)).unwrap_err();
        assert!(matches!(
            err,
            LotteryError::InvalidPercentage {
                category: Category::Aluno,
                ..
            }
        ));
        let err = QuotaConfig::new(5, PerCategory::new(0.1, f64::NAN, 0.2)).unwrap_err();
        assert!(matches!(
            err,
            LotteryError::InvalidPercentage {
                category: Category::Servidor,
                ..
            }
        ));
        // A config built by hand is still checked.
        let cfg = QuotaConfig {
            total_seats: 5,
            percentages: PerCategory::new(1.0, 1.0, 0.0),
        };
        assert!(run_lottery(&field(1, 1, 1), &cfg, 0).is_err());
    }

    #[test]
    fn category_labels() {
        assert_eq!(
            "Comunidade Externa".parse::<Category>(),
            Ok(Category::ComunidadeExterna)
        );
        assert_eq!(" Aluno ".parse::<Category>(), Ok(Category::Aluno));
        assert!("Professor".parse::<Category>().is_err());
        assert!(Category::Aluno < Category::Servidor);
        assert!(Category::Servidor < Category::ComunidadeExterna);
        assert_eq!(Category::ComunidadeExterna.rank(), 3);
    }
}
