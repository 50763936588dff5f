use strum_macros::Display;

use crate::history::AttemptHistory;

/// Derived numbers pushed to the presentation layer after a round
/// completes, the session resets, or the best time is cleared.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatsSnapshot {
    /// Reaction of the round that just finished, if this payload follows one
    pub current: Option<f64>,
    pub best: Option<f64>,
    pub average: Option<f64>,
    pub most_recent: Option<f64>,
    pub session_count: usize,
    pub std_dev: Option<f64>,
    /// Quickest attempt still in the session history
    pub fastest: Option<f64>,
    /// Newest-first copy of the session history
    pub attempts: Vec<f64>,
}

impl StatsSnapshot {
    pub fn from_history(history: &AttemptHistory, current: Option<f64>, best: Option<f64>) -> Self {
        Self {
            current,
            best,
            average: history.average(),
            most_recent: history.most_recent(),
            session_count: history.count(),
            std_dev: history.std_dev(),
            fastest: history.fastest(),
            attempts: history.snapshot(),
        }
    }
}

/// Rough human benchmark bucket for a reaction time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Category {
    Amazing,
    #[strum(serialize = "Very Good")]
    VeryGood,
    Good,
    Average,
    #[strum(serialize = "Below Average")]
    BelowAverage,
}

impl Category {
    pub fn of(ms: f64) -> Option<Self> {
        if !ms.is_finite() || ms <= 0.0 {
            return None;
        }
        Some(match ms {
            ms if ms < 150.0 => Category::Amazing,
            ms if ms < 200.0 => Category::VeryGood,
            ms if ms < 250.0 => Category::Good,
            ms if ms < 350.0 => Category::Average,
            _ => Category::BelowAverage,
        })
    }
}

/// "220 ms", or an em dash placeholder when there is nothing to show
pub fn format_ms(ms: Option<f64>) -> String {
    match ms {
        Some(ms) if ms.is_finite() => format!("{} ms", ms.max(0.0).round()),
        _ => "—".to_string(),
    }
}

pub fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        count => Some(data.iter().sum::<f64>() / count as f64),
    }
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;

            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;

    Some(variance.sqrt())
}
