use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::model::{Assessment, ClassFilter, Gender, Scores, StudentRecord};

/// Rounds the exact binary value of `x` to `places` decimals, halves away from
/// zero. `x * 10^places` is never formed in floating point, so 80.05 (stored just
/// below the half) rounds down while an exact 0.25 rounds up.
pub fn round_off(x: f64, places: u32) -> f64 {
    Decimal::from_f64_retain(x)
        .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(x)
}

pub fn round_off_1_decimal(x: f64) -> f64 {
    round_off(x, 1)
}

pub fn round_off_2_decimal(x: f64) -> f64 {
    round_off(x, 2)
}

/// A student's personal average over the three assessments, 2 decimals.
pub fn student_average(scores: &Scores) -> f64 {
    round_off_2_decimal(scores.sum() / 3.0)
}

fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut n: usize = 0;
    let mut sum = 0.0;
    for v in values {
        n += 1;
        sum += v;
    }
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentAverage {
    pub assessment: Assessment,
    pub label: String,
    /// Class mean of this assessment, 1 decimal.
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenderAggregate {
    pub gender: Gender,
    pub count: usize,
    /// Mean of member students' personal averages, 1 decimal; 0 for an empty group.
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub count: usize,
    pub assessment_averages: Vec<AssessmentAverage>,
    pub overall_average: f64,
    pub overall_average_display: f64,
    pub gender_aggregates: Vec<GenderAggregate>,
    pub top_student: StudentRecord,
    pub lowest_student: StudentRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum StatsOutcome {
    /// Nothing to aggregate: empty roster, or a filter matching no record.
    Empty,
    Ready(Box<Stats>),
}

/// Everything the dashboard needs for one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub classes: Vec<String>,
    pub filter: ClassFilter,
    pub outcome: StatsOutcome,
}

/// Unique non-empty class names of the whole roster, ascending.
pub fn distinct_classes(roster: &[StudentRecord]) -> Vec<String> {
    roster
        .iter()
        .filter(|r| !r.class_name.is_empty())
        .map(|r| r.class_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn filter_roster<'a>(
    roster: &'a [StudentRecord],
    filter: &ClassFilter,
) -> Vec<&'a StudentRecord> {
    roster.iter().filter(|r| filter.matches(r)).collect()
}

/// Left fold keeping the current leader unless `better(candidate, leader)`.
/// With a strict comparison the first occurrence wins ties.
fn pick_extreme<'a, F>(rows: &[&'a StudentRecord], better: F) -> Option<&'a StudentRecord>
where
    F: Fn(f64, f64) -> bool,
{
    let mut it = rows.iter().copied();
    let first = it.next()?;
    Some(it.fold(first, |leader, cand| {
        if better(cand.average, leader.average) {
            cand
        } else {
            leader
        }
    }))
}

pub fn compute_stats(roster: &[StudentRecord], filter: &ClassFilter) -> StatsOutcome {
    let rows = filter_roster(roster, filter);
    let (Some(top), Some(lowest)) = (
        pick_extreme(&rows, |c, l| c > l),
        pick_extreme(&rows, |c, l| c < l),
    ) else {
        return StatsOutcome::Empty;
    };

    let mut raw_means = [0.0f64; 3];
    let assessment_averages = Assessment::ALL
        .iter()
        .map(|a| {
            let m = mean(rows.iter().map(|r| r.scores.get(*a))).unwrap_or(0.0);
            raw_means[a.index()] = m;
            AssessmentAverage {
                assessment: *a,
                label: a.label(),
                average: round_off_1_decimal(m),
            }
        })
        .collect::<Vec<_>>();

    // Mean of the per-assessment class means, not of the per-student averages.
    let overall_average = raw_means.iter().sum::<f64>() / 3.0;

    let gender_aggregates = Gender::ALL
        .iter()
        .map(|g| {
            let members = rows.iter().filter(|r| r.gender == *g);
            let count = members.clone().count();
            let average = mean(members.map(|r| r.average))
                .map(round_off_1_decimal)
                .unwrap_or(0.0);
            GenderAggregate {
                gender: *g,
                count,
                average,
            }
        })
        .collect();

    StatsOutcome::Ready(Box::new(Stats {
        count: rows.len(),
        assessment_averages,
        overall_average,
        overall_average_display: round_off_1_decimal(overall_average),
        gender_aggregates,
        top_student: top.clone(),
        lowest_student: lowest.clone(),
    }))
}

pub fn dashboard(roster: &[StudentRecord], filter: &ClassFilter) -> DashboardView {
    DashboardView {
        classes: distinct_classes(roster),
        filter: filter.clone(),
        outcome: compute_stats(roster, filter),
    }
}
