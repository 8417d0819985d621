//! Data models for the Refund Engine.
//!
//! The `models` module defines the serialisable structs and enums that
//! flow through the crate: the engine's inputs and outputs, the season
//! records served by a [`crate::repository::SeasonRepository`], and the
//! report shapes returned over HTTP.  All types derive `Serialize` and
//! `Deserialize` and use camelCase field names on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Opaque problem identifier.
pub type ProblemId = String;

/// A problem that counts toward completion.
///
/// Callers pass only non-practice problems to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: ProblemId,
    /// Start of the day the problem was assigned, as stored.
    pub assigned_date: DateTime<Utc>,
}

/// Participation state recorded for a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantStatus {
    /// Still in the season.  May be dropped by the missed-count rule.
    Active,
    /// Explicitly dropped by an administrator.
    Dropped,
    /// Marked complete.  Never dropped retroactively.
    Completed,
}

/// A participant as seen by the refund engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInput {
    /// Display name: GitHub handle, email or a fallback id.
    pub identifier: String,
    pub is_paid: bool,
    pub status: ParticipantStatus,
    /// Problems the participant has a valid submission for.  Ids that do
    /// not match any supplied problem are tolerated.
    pub submitted_problem_ids: BTreeSet<ProblemId>,
}

/// Per-participant outcome of a refund calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResult {
    pub identifier: String,
    pub total_problems: usize,
    pub submitted_count: usize,
    pub missed_count: usize,
    /// Competition rank, `None` for dropped participants.
    pub rank: Option<u32>,
    /// Share of the dropped pool in percent (0–100, may be fractional).
    pub refund_percentage: f64,
    /// Entry fee plus floored bonus share; zero for dropped participants.
    pub refund_amount: u64,
    pub is_dropped: bool,
}

/// The aggregate result of a refund calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundCalculation {
    /// Paid participant count times the entry fee.
    pub total_pool: u64,
    /// Dropped participant count times the entry fee.
    pub dropped_pool: u64,
    /// Active participants by rank, followed by dropped participants.
    pub results: Vec<RefundResult>,
}

/// Lifecycle state of a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeasonStatus {
    Upcoming,
    Active,
    Completed,
}

impl SeasonStatus {
    /// Resolves the effective status from the stored status and the
    /// legacy `is_active` flag.  `Completed` always wins; otherwise an
    /// active flag or status makes the season active.
    pub fn resolve(status: Option<SeasonStatus>, is_active: Option<bool>) -> SeasonStatus {
        if status == Some(SeasonStatus::Completed) {
            return SeasonStatus::Completed;
        }
        if is_active.unwrap_or(false) || status == Some(SeasonStatus::Active) {
            return SeasonStatus::Active;
        }
        SeasonStatus::Upcoming
    }
}

/// Kind of daily problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemKind {
    /// Must be submitted on its assigned day.
    #[default]
    Regular,
    /// Free-choice problem without a submission window.
    Free,
    /// Rest day.
    Rest,
}

/// A stored problem belonging to a season.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRecord {
    pub id: ProblemId,
    pub day_number: u32,
    pub title: String,
    pub assigned_date: DateTime<Utc>,
    #[serde(default, rename = "problemType")]
    pub kind: ProblemKind,
    #[serde(default)]
    pub is_practice: bool,
}

/// A stored submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub problem_id: ProblemId,
    pub submitted_at: DateTime<Utc>,
    pub is_valid: bool,
}

/// A stored participant together with their submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecord {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub github_username: Option<String>,
    pub is_paid: bool,
    pub status: ParticipantStatus,
    #[serde(default)]
    pub submissions: Vec<SubmissionRecord>,
}

impl ParticipantRecord {
    /// Display identifier used in refund results: the GitHub handle,
    /// then the email, then `participant-{id}`.
    pub fn identifier(&self) -> String {
        self.github_username
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.email.as_deref().filter(|s| !s.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| format!("participant-{}", self.id))
    }
}

/// A complete season snapshot as served by a repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonRecord {
    pub id: String,
    pub season_number: u32,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub entry_fee: u64,
    #[serde(default)]
    pub status: Option<SeasonStatus>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub problems: Vec<ProblemRecord>,
    #[serde(default)]
    pub participants: Vec<ParticipantRecord>,
}

impl SeasonRecord {
    pub fn effective_status(&self) -> SeasonStatus {
        SeasonStatus::resolve(self.status, self.is_active)
    }

    pub fn info(&self) -> SeasonInfo {
        SeasonInfo {
            id: self.id.clone(),
            season_number: self.season_number,
            name: self.name.clone(),
            entry_fee: self.entry_fee,
        }
    }

    pub fn summary(&self) -> SeasonSummary {
        SeasonSummary {
            id: self.id.clone(),
            season_number: self.season_number,
            name: self.name.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            entry_fee: self.entry_fee,
            status: self.effective_status(),
            counts: SeasonCounts {
                participants: self.participants.len(),
                problems: self.problems.len(),
                submissions: self.participants.iter().map(|p| p.submissions.len()).sum(),
            },
        }
    }
}

/// Season header included in refund reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonInfo {
    pub id: String,
    pub season_number: u32,
    pub name: String,
    pub entry_fee: u64,
}

/// Listing entry for a season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonSummary {
    pub id: String,
    pub season_number: u32,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub entry_fee: u64,
    pub status: SeasonStatus,
    #[serde(rename = "_count")]
    pub counts: SeasonCounts,
}

/// Record counts attached to a season listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonCounts {
    pub participants: usize,
    pub problems: usize,
    pub submissions: usize,
}

/// Totals for one rank group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankSummary {
    pub rank: u32,
    /// Display label such as `"1st"`.
    pub label: String,
    pub count: usize,
    pub total_percentage: f64,
    /// Sum of `refund_amount - entry_fee` over the group.
    pub total_bonus: u64,
    pub total_refund: u64,
}

/// Number of active participants at ranks 1, 2, 3 and beyond.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankCounts {
    pub first: usize,
    pub second: usize,
    pub third: usize,
    pub other: usize,
}

/// Season-level aggregation of a refund calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundSummary {
    pub paid_count: usize,
    pub active_count: usize,
    pub dropped_count: usize,
    pub rank_counts: RankCounts,
    pub rank_summaries: Vec<RankSummary>,
    pub active_refund_total: u64,
    pub bonus_total: u64,
    /// Part of the dropped pool left undistributed by flooring.
    pub bonus_remainder: u64,
}

/// Where the signed-in viewer stands in a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MyStatus {
    NotRegistered,
    Unpaid,
    Active,
    Dropped,
}

/// The viewer's own refund figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyRefund {
    pub status: MyStatus,
    pub refund_amount: u64,
    pub missed_count: usize,
    pub submitted_count: usize,
    pub total_problems: usize,
}

/// Full refund report served to administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundReport {
    pub season: SeasonInfo,
    pub total_problems: usize,
    #[serde(flatten)]
    pub calculation: RefundCalculation,
}

/// Refund overview served to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyRefundReport {
    pub season: SeasonInfo,
    pub total_problems: usize,
    pub total_pool: u64,
    pub dropped_pool: u64,
    pub summary: RefundSummary,
    pub my: MyRefund,
}

/// Submission state of one problem for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemStatus {
    pub problem_id: ProblemId,
    pub day_number: u32,
    pub submitted: bool,
}

/// Dashboard row for one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardParticipant {
    pub id: String,
    pub github_username: Option<String>,
    pub submitted_count: usize,
    pub total_problems: usize,
    pub problem_status: Vec<ProblemStatus>,
}

/// Problem column of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardProblem {
    pub id: ProblemId,
    pub day_number: u32,
    pub title: String,
    pub assigned_date: DateTime<Utc>,
    pub is_practice: bool,
}

/// Submission grid for a season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub season: SeasonSummary,
    pub problems: Vec<DashboardProblem>,
    pub participants: Vec<DashboardParticipant>,
}
