//! Season reports built around the refund engine.
//!
//! This module sits between a [`SeasonRecord`] and the engine: it
//! prepares the engine inputs from stored data and aggregates the
//! engine output into the summaries shown to administrators and
//! participants.  It also builds the season submission dashboard.

use crate::auth::Viewer;
use crate::engine::rank_label;
use crate::models::{
    Dashboard, DashboardParticipant, DashboardProblem, MyRefund, MyStatus, ParticipantInput,
    ParticipantRecord, ParticipantStatus, Problem, ProblemStatus, RankCounts, RankSummary,
    RefundCalculation, RefundResult, RefundSummary, SeasonRecord, SeasonStatus,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Engine inputs extracted from a season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundInputs {
    pub problems: Vec<Problem>,
    pub participants: Vec<ParticipantInput>,
}

/// Prepares engine inputs: non-practice problems, paid participants,
/// and each participant's valid submissions to those problems.
pub fn refund_inputs(season: &SeasonRecord) -> RefundInputs {
    let problems: Vec<Problem> = season
        .problems
        .iter()
        .filter(|p| !p.is_practice)
        .map(|p| Problem {
            id: p.id.clone(),
            assigned_date: p.assigned_date,
        })
        .collect();
    let counted: HashSet<&str> = problems.iter().map(|p| p.id.as_str()).collect();

    let participants = season
        .participants
        .iter()
        .filter(|p| p.is_paid)
        .map(|p| ParticipantInput {
            identifier: p.identifier(),
            is_paid: p.is_paid,
            status: p.status,
            submitted_problem_ids: p
                .submissions
                .iter()
                .filter(|s| s.is_valid && counted.contains(s.problem_id.as_str()))
                .map(|s| s.problem_id.clone())
                .collect(),
        })
        .collect();

    RefundInputs { problems, participants }
}

fn bonus(result: &RefundResult, entry_fee: u64) -> u64 {
    result.refund_amount.saturating_sub(entry_fee)
}

/// Sums amounts, saturating at `u64::MAX`.
fn total(amounts: impl Iterator<Item = u64>) -> u64 {
    amounts.fold(0, u64::saturating_add)
}

/// Groups active results by rank, ascending.
pub fn rank_summaries(results: &[RefundResult], entry_fee: u64) -> Vec<RankSummary> {
    let mut groups: BTreeMap<u32, Vec<&RefundResult>> = BTreeMap::new();
    for result in results.iter().filter(|r| !r.is_dropped) {
        if let Some(rank) = result.rank {
            groups.entry(rank).or_default().push(result);
        }
    }
    groups
        .into_iter()
        .map(|(rank, group)| RankSummary {
            rank,
            label: rank_label(Some(rank)),
            count: group.len(),
            total_percentage: group.iter().map(|r| r.refund_percentage).sum(),
            total_bonus: total(group.iter().map(|r| bonus(r, entry_fee))),
            total_refund: total(group.iter().map(|r| r.refund_amount)),
        })
        .collect()
}

/// Season-level totals, including the part of the dropped pool left
/// over after flooring.
pub fn summarize(calculation: &RefundCalculation, entry_fee: u64) -> RefundSummary {
    let active: Vec<&RefundResult> =
        calculation.results.iter().filter(|r| !r.is_dropped).collect();
    let dropped_count = calculation.results.len() - active.len();

    let mut rank_counts = RankCounts::default();
    for result in &active {
        match result.rank {
            Some(1) => rank_counts.first += 1,
            Some(2) => rank_counts.second += 1,
            Some(3) => rank_counts.third += 1,
            Some(_) => rank_counts.other += 1,
            None => {}
        }
    }

    let active_refund_total = total(active.iter().map(|r| r.refund_amount));
    let bonus_total = total(active.iter().map(|r| bonus(r, entry_fee)));

    RefundSummary {
        paid_count: calculation.results.len(),
        active_count: active.len(),
        dropped_count,
        rank_counts,
        rank_summaries: rank_summaries(&calculation.results, entry_fee),
        active_refund_total,
        bonus_total,
        bonus_remainder: calculation.dropped_pool.saturating_sub(bonus_total),
    }
}

/// Looks up the viewer among the season's participants and returns
/// their own refund figures.
pub fn viewer_refund(
    season: &SeasonRecord,
    calculation: &RefundCalculation,
    viewer: &Viewer,
) -> MyRefund {
    let total_problems = season.problems.iter().filter(|p| !p.is_practice).count();
    let mut my = MyRefund {
        status: MyStatus::NotRegistered,
        refund_amount: 0,
        missed_count: 0,
        submitted_count: 0,
        total_problems,
    };

    let email = viewer.email.as_deref().map(str::to_lowercase);
    let participant = season.participants.iter().find(|p| {
        let email_match = email.is_some()
            && p.email.as_deref().map(str::to_lowercase) == email;
        let github_match =
            viewer.github_username.is_some() && p.github_username == viewer.github_username;
        email_match || github_match
    });

    let Some(participant) = participant else {
        return my;
    };
    if !participant.is_paid {
        my.status = MyStatus::Unpaid;
        return my;
    }

    let identifier = participant.identifier();
    if let Some(result) = calculation.results.iter().find(|r| r.identifier == identifier) {
        my.status = if result.is_dropped {
            MyStatus::Dropped
        } else {
            MyStatus::Active
        };
        my.refund_amount = result.refund_amount;
        my.missed_count = result.missed_count;
        my.submitted_count = result.submitted_count;
        my.total_problems = result.total_problems;
    }
    my
}

/// Sort key placing participants without a GitHub handle last.
fn handle_order(participant: &ParticipantRecord) -> (bool, Option<&str>) {
    let handle = participant.github_username.as_deref();
    (handle.is_none(), handle)
}

/// Active seasons, newest first, with problems by day and participants
/// by GitHub handle.  Submissions are left out.
pub fn current_seasons(mut seasons: Vec<SeasonRecord>) -> Vec<SeasonRecord> {
    seasons.retain(|s| s.effective_status() == SeasonStatus::Active);
    seasons.sort_by(|a, b| b.season_number.cmp(&a.season_number));
    for season in &mut seasons {
        season.problems.sort_by_key(|p| p.day_number);
        season.participants.sort_by(|a, b| handle_order(a).cmp(&handle_order(b)));
        for participant in &mut season.participants {
            participant.submissions.clear();
        }
    }
    seasons
}

/// Submission grid for every participant not dropped by an
/// administrator, sorted by GitHub handle.
pub fn dashboard(season: &SeasonRecord) -> Dashboard {
    let mut problems: Vec<_> = season.problems.iter().collect();
    problems.sort_by_key(|p| p.day_number);

    let mut participants: Vec<_> = season
        .participants
        .iter()
        .filter(|p| p.status != ParticipantStatus::Dropped)
        .collect();
    participants.sort_by(|a, b| handle_order(a).cmp(&handle_order(b)));

    let participants = participants
        .into_iter()
        .map(|participant| {
            let submitted: BTreeSet<&str> = participant
                .submissions
                .iter()
                .filter(|s| s.is_valid)
                .map(|s| s.problem_id.as_str())
                .collect();
            DashboardParticipant {
                id: participant.id.clone(),
                github_username: participant.github_username.clone(),
                submitted_count: submitted.len(),
                total_problems: problems.len(),
                problem_status: problems
                    .iter()
                    .map(|p| ProblemStatus {
                        problem_id: p.id.clone(),
                        day_number: p.day_number,
                        submitted: submitted.contains(p.id.as_str()),
                    })
                    .collect(),
            }
        })
        .collect();

    Dashboard {
        season: season.summary(),
        problems: problems
            .iter()
            .map(|p| DashboardProblem {
                id: p.id.clone(),
                day_number: p.day_number,
                title: p.title.clone(),
                assigned_date: p.assigned_date,
                is_practice: p.is_practice,
            })
            .collect(),
        participants,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::calculate_refund;
    use crate::models::{ProblemKind, ProblemRecord, SubmissionRecord};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn today() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 15, 0, 0).unwrap()
    }

    fn problem(id: &str, day: u32, practice: bool) -> ProblemRecord {
        ProblemRecord {
            id: id.into(),
            day_number: day,
            title: format!("Problem {id}"),
            assigned_date: today() - Duration::days(10 - i64::from(day)),
            kind: ProblemKind::Regular,
            is_practice: practice,
        }
    }

    /// A paid, active participant with valid submissions for `solved`.
    fn member(id: &str, github: Option<&str>, solved: &[&str]) -> ParticipantRecord {
        ParticipantRecord {
            id: id.into(),
            email: None,
            github_username: github.map(Into::into),
            is_paid: true,
            status: ParticipantStatus::Active,
            submissions: solved
                .iter()
                .map(|p| SubmissionRecord {
                    problem_id: p.to_string(),
                    submitted_at: today(),
                    is_valid: true,
                })
                .collect(),
        }
    }

    fn season() -> SeasonRecord {
        let mut amy = member("2", Some("amy"), &["d1", "d2", "d3"]);
        amy.email = Some("Amy@Example.com".into());
        let mut late = member("4", None, &["d1", "d2"]);
        late.email = Some("late@example.com".into());
        late.submissions.push(SubmissionRecord {
            problem_id: "d3".into(),
            submitted_at: today(),
            is_valid: false,
        });
        let mut guest = member("5", Some("guest"), &[]);
        guest.email = Some("guest@example.com".into());
        guest.is_paid = false;
        let mut quit = member("6", Some("quit"), &["d1"]);
        quit.status = ParticipantStatus::Dropped;

        SeasonRecord {
            id: "s1".into(),
            season_number: 1,
            name: "Season 1".into(),
            start_date: today() - Duration::days(9),
            end_date: today() + Duration::days(4),
            entry_fee: 10_000,
            status: None,
            is_active: Some(true),
            problems: vec![
                problem("d2", 2, false),
                problem("d1", 1, false),
                problem("d3", 3, false),
                problem("warmup", 0, true),
            ],
            participants: vec![
                member("1", Some("zed"), &["d1", "d2", "d3", "warmup"]),
                amy,
                member("3", Some("gone"), &[]),
                late,
                guest,
                quit,
            ],
        }
    }

    fn calculate(season: &SeasonRecord) -> RefundCalculation {
        let inputs = refund_inputs(season);
        calculate_refund(&inputs.participants, &inputs.problems, season.entry_fee, today())
    }

    #[test]
    fn inputs_keep_paid_members_and_counted_valid_submissions() {
        let inputs = refund_inputs(&season());
        assert_eq!(inputs.problems.len(), 3);
        let ids: Vec<_> = inputs.participants.iter().map(|p| p.identifier.as_str()).collect();
        assert_eq!(ids, ["zed", "amy", "gone", "late@example.com", "quit"]);
        assert_eq!(inputs.participants[0].submitted_problem_ids.len(), 3);
        assert_eq!(inputs.participants[3].submitted_problem_ids.len(), 2);
    }

    #[test]
    fn summary_accounts_for_every_unit_of_the_pool() {
        let season = season();
        let calc = calculate(&season);
        let summary = summarize(&calc, season.entry_fee);

        assert_eq!(summary.paid_count, 5);
        assert_eq!(summary.dropped_count, 2);
        assert_eq!(summary.active_count, 3);
        // zed and amy tie at rank 1 (90%), late is rank 3 (10%).
        assert_eq!(summary.rank_counts, RankCounts { first: 2, second: 0, third: 1, other: 0 });
        assert_eq!(summary.rank_summaries.len(), 2);
        assert_eq!(summary.rank_summaries[0].total_percentage, 90.0);
        assert_eq!(summary.rank_summaries[0].total_bonus, 18_000);
        assert_eq!(summary.rank_summaries[0].label, "1st");
        assert_eq!(summary.rank_summaries[1].rank, 3);
        assert_eq!(summary.rank_summaries[1].label, "3rd");
        assert_eq!(summary.rank_summaries[1].total_bonus, 2_000);
        assert_eq!(summary.bonus_total, 20_000);
        assert_eq!(summary.bonus_remainder, 0);
        assert_eq!(summary.active_refund_total, 50_000);
    }

    #[test]
    fn remainder_is_what_flooring_left_behind() {
        let calc = RefundCalculation {
            total_pool: 40_000,
            dropped_pool: 10_000,
            results: (0..3)
                .map(|i| RefundResult {
                    identifier: format!("p{i}"),
                    total_problems: 1,
                    submitted_count: 1,
                    missed_count: 0,
                    rank: Some(1),
                    refund_percentage: 100.0 / 3.0,
                    refund_amount: 13_333,
                    is_dropped: false,
                })
                .collect(),
        };
        let summary = summarize(&calc, 10_000);
        assert_eq!(summary.bonus_total, 9_999);
        assert_eq!(summary.bonus_remainder, 1);
    }

    #[test]
    fn viewer_lookup_by_email_or_handle() {
        let season = season();
        let calc = calculate(&season);

        let by_email = Viewer {
            email: Some("amy@example.com".into()),
            github_username: None,
        };
        let my = viewer_refund(&season, &calc, &by_email);
        assert_eq!(my.status, MyStatus::Active);
        assert_eq!(my.refund_amount, 19_000);

        let dropped = Viewer {
            email: None,
            github_username: Some("gone".into()),
        };
        let my = viewer_refund(&season, &calc, &dropped);
        assert_eq!(my.status, MyStatus::Dropped);
        assert_eq!(my.missed_count, 3);
        assert_eq!(my.refund_amount, 0);

        let guest = Viewer {
            email: Some("guest@example.com".into()),
            github_username: None,
        };
        assert_eq!(viewer_refund(&season, &calc, &guest).status, MyStatus::Unpaid);

        let stranger = Viewer {
            email: Some("who@example.com".into()),
            github_username: None,
        };
        let my = viewer_refund(&season, &calc, &stranger);
        assert_eq!(my.status, MyStatus::NotRegistered);
        assert_eq!(my.total_problems, 3);
    }

    #[test]
    fn dashboard_orders_days_and_handles() {
        let board = dashboard(&season());
        let days: Vec<_> = board.problems.iter().map(|p| p.day_number).collect();
        assert_eq!(days, [0, 1, 2, 3]);

        let handles: Vec<_> = board
            .participants
            .iter()
            .map(|p| p.github_username.as_deref().unwrap_or("-"))
            .collect();
        assert_eq!(handles, ["amy", "gone", "guest", "zed", "-"]);

        let zed = &board.participants[3];
        assert_eq!(zed.submitted_count, 4);
        assert!(zed.problem_status.iter().all(|s| s.submitted));
        let late = &board.participants[4];
        assert_eq!(late.submitted_count, 2);
        assert!(!late.problem_status[3].submitted);
    }

    #[test]
    fn totals_saturate_for_huge_amounts() {
        let result = |name: &str| RefundResult {
            identifier: name.into(),
            total_problems: 0,
            submitted_count: 0,
            missed_count: 0,
            rank: Some(1),
            refund_percentage: 50.0,
            refund_amount: u64::MAX,
            is_dropped: false,
        };
        let calc = RefundCalculation {
            total_pool: u64::MAX,
            dropped_pool: u64::MAX,
            results: vec![result("a"), result("b")],
        };
        let summary = summarize(&calc, u64::MAX / 2);
        assert_eq!(summary.active_refund_total, u64::MAX);
        assert_eq!(summary.bonus_total, u64::MAX);
        assert_eq!(summary.bonus_remainder, 0);
        assert_eq!(summary.rank_summaries[0].total_refund, u64::MAX);
    }

    #[test]
    fn current_seasons_are_active_and_newest_first() {
        let mut older = season();
        older.id = "s0".into();
        older.season_number = 0;
        let mut finished = season();
        finished.id = "s-done".into();
        finished.season_number = 9;
        finished.status = Some(SeasonStatus::Completed);
        let mut next = season();
        next.id = "s2".into();
        next.season_number = 2;

        let current = current_seasons(vec![older, finished, next]);
        let ids: Vec<_> = current.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["s2", "s0"]);

        let days: Vec<_> = current[0].problems.iter().map(|p| p.day_number).collect();
        assert_eq!(days, [0, 1, 2, 3]);
        let handles: Vec<_> = current[0]
            .participants
            .iter()
            .map(|p| p.github_username.as_deref().unwrap_or("-"))
            .collect();
        assert_eq!(handles, ["amy", "gone", "guest", "quit", "zed", "-"]);
        assert!(current[0].participants.iter().all(|p| p.submissions.is_empty()));

        assert!(current_seasons(vec![]).is_empty());
    }
}
