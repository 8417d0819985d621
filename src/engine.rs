//! Refund computation engine.
//!
//! The `engine` module turns a snapshot of paid participants and the
//! season's counted problems into a [`RefundCalculation`].  The work
//! runs in four steps: per-participant missed counts, drop
//! classification, competition ranking of the remaining participants,
//! and distribution of the dropped pool by rank.  Per-participant
//! tallies are computed in parallel with [`rayon`].
//!
//! The engine is a pure function of its inputs and the reference day
//! start; it never mutates the slices it is given.

use crate::distribution::{floored_share, RefundDistribution};
use crate::models::{
    ParticipantInput, ParticipantStatus, Problem, RefundCalculation, RefundResult,
};
use chrono::{DateTime, Utc};
use rayon::prelude::*;

/// Missed past-due problems at which an active participant is dropped.
pub const DROP_THRESHOLD: usize = 3;

/// Calculates refunds with the standard distribution table.
///
/// `reference_day_start` is the start of "today" in the study's
/// reference zone; only problems assigned strictly before it can be
/// missed.  Unpaid participants are ignored.
pub fn calculate_refund(
    participants: &[ParticipantInput],
    problems: &[Problem],
    entry_fee: u64,
    reference_day_start: DateTime<Utc>,
) -> RefundCalculation {
    calculate_refund_with(
        participants,
        problems,
        entry_fee,
        reference_day_start,
        &RefundDistribution::standard(),
    )
}

/// Like [`calculate_refund`] but with an explicit distribution table.
pub fn calculate_refund_with(
    participants: &[ParticipantInput],
    problems: &[Problem],
    entry_fee: u64,
    reference_day_start: DateTime<Utc>,
    distribution: &RefundDistribution,
) -> RefundCalculation {
    let past_problems: Vec<&str> = problems
        .iter()
        .filter(|p| p.assigned_date < reference_day_start)
        .map(|p| p.id.as_str())
        .collect();

    let paid: Vec<&ParticipantInput> = participants.iter().filter(|p| p.is_paid).collect();
    let total_pool = pool_of(paid.len(), entry_fee);

    let results: Vec<RefundResult> = paid
        .into_par_iter()
        .map(|participant| tally(participant, &past_problems, problems.len()))
        .collect();

    let (mut active, dropped): (Vec<RefundResult>, Vec<RefundResult>) =
        results.into_iter().partition(|r| !r.is_dropped);
    let dropped_pool = pool_of(dropped.len(), entry_fee);

    assign_ranks(&mut active);
    distribute(&mut active, dropped_pool, entry_fee, distribution);

    tracing::debug!(
        paid = active.len() + dropped.len(),
        active = active.len(),
        dropped = dropped.len(),
        past_problems = past_problems.len(),
        total_pool,
        dropped_pool,
        "calculated refunds"
    );

    active.extend(dropped);
    RefundCalculation {
        total_pool,
        dropped_pool,
        results: active,
    }
}

/// `count` entry fees, saturating at `u64::MAX`.
fn pool_of(count: usize, entry_fee: u64) -> u64 {
    u64::try_from(count)
        .unwrap_or(u64::MAX)
        .saturating_mul(entry_fee)
}

fn tally(
    participant: &ParticipantInput,
    past_problems: &[&str],
    total_problems: usize,
) -> RefundResult {
    let missed_count = past_problems
        .iter()
        .filter(|id| !participant.submitted_problem_ids.contains(**id))
        .count();
    RefundResult {
        identifier: participant.identifier.clone(),
        total_problems,
        submitted_count: participant.submitted_problem_ids.len(),
        missed_count,
        rank: None,
        refund_percentage: 0.0,
        refund_amount: 0,
        is_dropped: is_dropped(participant.status, missed_count),
    }
}

/// Explicitly dropped participants are dropped; active participants
/// are dropped once they miss [`DROP_THRESHOLD`] problems.  Completed
/// participants are never dropped.
pub fn is_dropped(status: ParticipantStatus, missed_count: usize) -> bool {
    match status {
        ParticipantStatus::Dropped => true,
        ParticipantStatus::Active => missed_count >= DROP_THRESHOLD,
        ParticipantStatus::Completed => false,
    }
}

/// Sorts by missed count and assigns standard competition ranks
/// (1, 1, 3, ...).  The sort is stable, so ties keep input order.
fn assign_ranks(active: &mut [RefundResult]) {
    active.sort_by_key(|r| r.missed_count);
    let mut current = 1u32;
    let mut previous_missed = None;
    for (i, result) in active.iter_mut().enumerate() {
        if previous_missed.is_some_and(|prev| result.missed_count > prev) {
            current = u32::try_from(i + 1).unwrap_or(u32::MAX);
        }
        previous_missed = Some(result.missed_count);
        result.rank = Some(current);
    }
}

/// Splits the dropped pool across rank groups and adds the entry fee
/// back to every active participant.  Expects `active` ranked.
fn distribute(
    active: &mut [RefundResult],
    dropped_pool: u64,
    entry_fee: u64,
    distribution: &RefundDistribution,
) {
    for group in active.chunk_by_mut(|a, b| a.rank == b.rank) {
        let rank = group[0].rank.unwrap_or(0);
        let group_percentage = distribution.group_percentage(rank, group.len());
        let percentage = f64::from(group_percentage) / group.len() as f64;
        let bonus = floored_share(dropped_pool, group_percentage, group.len());
        for result in group.iter_mut() {
            result.refund_percentage = percentage;
            result.refund_amount = bonus.saturating_add(entry_fee);
        }
    }
}

/// Display label for a rank.
pub fn rank_label(rank: Option<u32>) -> String {
    match rank {
        None => "Dropped".to_string(),
        Some(r) => {
            let suffix = match (r % 10, r % 100) {
                (_, 11..=13) => "th",
                (1, _) => "st",
                (2, _) => "nd",
                (3, _) => "rd",
                _ => "th",
            };
            format!("{r}{suffix}")
        }
    }
}
