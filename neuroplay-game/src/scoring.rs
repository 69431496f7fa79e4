//! Score aggregation: points, accuracy, screening domains and trends.
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{
    BAND_MILD_MIN, BAND_MODERATE_MIN, BAND_NORMAL_MIN, POINTS_PER_CORRECT_ROUND,
    SCREENING_MAX_SCORE, TREND_THRESHOLD, TREND_WINDOW_DAYS,
};
use crate::evaluator::Evaluation;
use crate::numbers::{mean_f64, mean_percent, percent};
use crate::puzzle::{CognitiveDomain, GameKind};

/// Clinical band of an overall screening score. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        if score >= BAND_NORMAL_MIN {
            Self::Normal
        } else if score >= BAND_MILD_MIN {
            Self::Mild
        } else if score >= BAND_MODERATE_MIN {
            Self::Moderate
        } else {
            Self::Severe
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-domain averages. A domain without questions is `None` and does not
/// count towards the overall mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DomainScores {
    pub orientation: Option<u8>,
    pub memory: Option<u8>,
    pub attention: Option<u8>,
    pub language: Option<u8>,
    pub executive: Option<u8>,
}

impl DomainScores {
    #[must_use]
    pub const fn get(&self, domain: CognitiveDomain) -> Option<u8> {
        match domain {
            CognitiveDomain::Orientation => self.orientation,
            CognitiveDomain::Memory => self.memory,
            CognitiveDomain::Attention => self.attention,
            CognitiveDomain::Language => self.language,
            CognitiveDomain::Executive => self.executive,
        }
    }

    const fn slot(&mut self, domain: CognitiveDomain) -> &mut Option<u8> {
        match domain {
            CognitiveDomain::Orientation => &mut self.orientation,
            CognitiveDomain::Memory => &mut self.memory,
            CognitiveDomain::Attention => &mut self.attention,
            CognitiveDomain::Language => &mut self.language,
            CognitiveDomain::Executive => &mut self.executive,
        }
    }

    /// Mean of the domains that have a score.
    #[must_use]
    pub fn overall(&self) -> Option<u8> {
        let present: Vec<u8> = CognitiveDomain::ALL
            .into_iter()
            .filter_map(|domain| self.get(domain))
            .collect();
        mean_percent(&present)
    }
}

/// Running totals for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreAggregator {
    kind: GameKind,
    rounds: usize,
    correct: usize,
    points: u32,
    by_domain: BTreeMap<CognitiveDomain, Vec<u8>>,
}

impl ScoreAggregator {
    #[must_use]
    pub const fn new(kind: GameKind) -> Self {
        Self {
            kind,
            rounds: 0,
            correct: 0,
            points: 0,
            by_domain: BTreeMap::new(),
        }
    }

    /// Aggregate a finished history in one go.
    #[must_use]
    pub fn from_history<I>(kind: GameKind, history: I) -> Self
    where
        I: IntoIterator<Item = (Evaluation, Option<CognitiveDomain>)>,
    {
        let mut aggregator = Self::new(kind);
        for (evaluation, domain) in history {
            aggregator.record(evaluation, domain);
        }
        aggregator
    }

    pub fn record(&mut self, evaluation: Evaluation, domain: Option<CognitiveDomain>) {
        self.rounds += 1;
        if evaluation.correct {
            self.correct += 1;
            self.points = self.points.saturating_add(POINTS_PER_CORRECT_ROUND);
        }
        if let Some(domain) = domain {
            self.by_domain.entry(domain).or_default().push(evaluation.score);
        }
    }

    #[must_use]
    pub const fn total_rounds(&self) -> usize {
        self.rounds
    }

    #[must_use]
    pub const fn correct_rounds(&self) -> usize {
        self.correct
    }

    /// `round(100 * correct / total)`, 0 before any round.
    #[must_use]
    pub fn accuracy(&self) -> u8 {
        percent(self.correct, self.rounds)
    }

    #[must_use]
    pub fn domain_scores(&self) -> DomainScores {
        let mut scores = DomainScores::default();
        for (domain, values) in &self.by_domain {
            *scores.slot(*domain) = mean_percent(values);
        }
        scores
    }

    /// Game points, or the overall domain mean for screening.
    #[must_use]
    pub fn total_score(&self) -> u32 {
        if self.kind.is_screening() {
            self.domain_scores().overall().map_or(0, u32::from)
        } else {
            self.points
        }
    }

    /// Best achievable score for a session of `planned_rounds`.
    #[must_use]
    pub const fn max_score(&self, planned_rounds: u32) -> u32 {
        if self.kind.is_screening() {
            SCREENING_MAX_SCORE
        } else {
            planned_rounds.saturating_mul(POINTS_PER_CORRECT_ROUND)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

/// One historical score, as stored by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorePoint {
    pub on: NaiveDate,
    pub score: f64,
}

/// Compare the most recent week against the week before it, relative to the
/// latest point in `history`.
#[must_use]
pub fn classify_trend(history: &[ScorePoint]) -> Trend {
    let Some(now) = history.iter().map(|point| point.on).max() else {
        return Trend::Stable;
    };
    let window = Days::new(TREND_WINDOW_DAYS);
    let (Some(week_ago), Some(two_weeks_ago)) = (
        now.checked_sub_days(window),
        now.checked_sub_days(Days::new(TREND_WINDOW_DAYS * 2)),
    ) else {
        return Trend::Stable;
    };

    let scores_between = |after: NaiveDate, until: NaiveDate| -> Vec<f64> {
        history
            .iter()
            .filter(|point| point.on > after && point.on <= until)
            .map(|point| point.score)
            .collect()
    };
    let (Some(recent), Some(prior)) = (
        mean_f64(&scores_between(week_ago, now)),
        mean_f64(&scores_between(two_weeks_ago, week_ago)),
    ) else {
        return Trend::Stable;
    };

    let delta = recent - prior;
    if delta > TREND_THRESHOLD {
        Trend::Improving
    } else if delta < -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(correct: bool, score: u8) -> Evaluation {
        Evaluation { correct, score }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn game_points_and_accuracy() {
        let history = [true, false, true, true].map(|c| (Evaluation::binary(c), None));
        let agg = ScoreAggregator::from_history(GameKind::SequenceRecall, history);
        assert_eq!(agg.total_score(), 30);
        assert_eq!(agg.max_score(4), 40);
        assert_eq!(agg.accuracy(), 75);
    }

    #[test]
    fn accuracy_matches_rounded_ratio_for_any_history() {
        for total in 1..=12_usize {
            for correct in 0..=total {
                let history = (0..total).map(|i| (Evaluation::binary(i < correct), None));
                let agg = ScoreAggregator::from_history(GameKind::FaceName, history);
                let expected = (100.0 * correct as f64 / total as f64).round() as u8;
                assert_eq!(agg.accuracy(), expected, "{correct}/{total}");
            }
        }
    }

    #[test]
    fn screening_averages_domains() {
        let history = [
            (eval(true, 100), Some(CognitiveDomain::Orientation)),
            (eval(false, 0), Some(CognitiveDomain::Orientation)),
            (eval(false, 80), Some(CognitiveDomain::Attention)),
            (eval(true, 100), Some(CognitiveDomain::Memory)),
        ];
        let agg = ScoreAggregator::from_history(GameKind::Screening, history);
        let domains = agg.domain_scores();
        assert_eq!(domains.orientation, Some(50));
        assert_eq!(domains.attention, Some(80));
        assert_eq!(domains.language, None);
        // (50 + 100 + 80) / 3
        assert_eq!(domains.overall(), Some(77));
        assert_eq!(agg.total_score(), 77);
        assert_eq!(agg.max_score(14), 100);
        assert_eq!(Severity::from_score(77), Severity::Mild);
    }

    #[test]
    fn severity_bands() {
        assert_eq!(Severity::from_score(100), Severity::Normal);
        assert_eq!(Severity::from_score(80), Severity::Normal);
        assert_eq!(Severity::from_score(79), Severity::Mild);
        assert_eq!(Severity::from_score(40), Severity::Moderate);
        assert_eq!(Severity::from_score(39), Severity::Severe);
    }

    #[test]
    fn trend_compares_consecutive_weeks() {
        let point = |d, score| ScorePoint { on: day(d), score };
        let improving = [point(1, 60.0), point(3, 62.0), point(10, 70.0), point(12, 72.0)];
        assert_eq!(classify_trend(&improving), Trend::Improving);
        let declining = [point(2, 80.0), point(9, 70.0)];
        assert_eq!(classify_trend(&declining), Trend::Declining);
        let flat = [point(2, 70.0), point(9, 75.0)];
        assert_eq!(classify_trend(&flat), Trend::Stable);
    }

    #[test]
    fn trend_needs_both_weeks() {
        assert_eq!(classify_trend(&[]), Trend::Stable);
        let recent_only = [
            ScorePoint {
                on: day(10),
                score: 20.0,
            },
            ScorePoint {
                on: day(12),
                score: 90.0,
            },
        ];
        assert_eq!(classify_trend(&recent_only), Trend::Stable);
    }
}
