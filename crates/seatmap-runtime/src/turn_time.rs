#![forbid(unsafe_code)]

//! Turn-time badges: how long a seated party has been at its table relative
//! to how long it is expected to stay.
//!
//! ```text
//! elapsed    = now - seated_at
//! percentage = elapsed / expected_minutes * 100
//! status     = green  if percentage <  amber_from
//!              amber  if percentage <= red_above
//!              red    otherwise
//! ```
//!
//! Two lookups for `expected_minutes` exist and are both kept: a flat value
//! (the floor plan's historical behaviour) and a party-size bucket table
//! (the reservation detail's). Which one a view uses is configuration.

use seatmap_core::entity::Occupant;

const MS_PER_MINUTE: f64 = 60_000.0;

/// Expected minutes under the flat policy.
pub const DEFAULT_FLAT_MINUTES: u32 = 75;

/// How the expected stay is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config-file", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "config-file",
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum TurnTimePolicy {
    /// Same expectation for every party.
    Flat { minutes: u32 },
    /// Expectation by party size: `<= 2`, `<= 4`, `<= 6`, larger.
    PartySizeBuckets {
        up_to_2: u32,
        up_to_4: u32,
        up_to_6: u32,
        larger: u32,
    },
}

impl Default for TurnTimePolicy {
    fn default() -> Self {
        Self::Flat {
            minutes: DEFAULT_FLAT_MINUTES,
        }
    }
}

impl TurnTimePolicy {
    /// The 60/75/90/105 bucket table.
    pub const BUCKETED: Self = Self::PartySizeBuckets {
        up_to_2: 60,
        up_to_4: 75,
        up_to_6: 90,
        larger: 105,
    };

    /// Expected stay in minutes for a party of `party_size`.
    #[must_use]
    pub const fn expected_minutes(&self, party_size: u32) -> u32 {
        match *self {
            Self::Flat { minutes } => minutes,
            Self::PartySizeBuckets {
                up_to_2,
                up_to_4,
                up_to_6,
                larger,
            } => match party_size {
                0..=2 => up_to_2,
                3..=4 => up_to_4,
                5..=6 => up_to_6,
                _ => larger,
            },
        }
    }
}

/// Percent boundaries between colours.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "config-file", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct TurnTimeThresholds {
    /// Amber starts at this percentage (inclusive).
    pub amber_from: f64,
    /// Red starts above this percentage (exclusive).
    pub red_above: f64,
}

impl Default for TurnTimeThresholds {
    fn default() -> Self {
        Self {
            amber_from: 75.0,
            red_above: 100.0,
        }
    }
}

/// Badge colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnTimeStatus {
    Green,
    Amber,
    Red,
}

impl TurnTimeStatus {
    #[must_use]
    pub fn from_percentage(percentage: f64, thresholds: &TurnTimeThresholds) -> Self {
        if percentage < thresholds.amber_from {
            Self::Green
        } else if percentage <= thresholds.red_above {
            Self::Amber
        } else {
            Self::Red
        }
    }
}

/// Everything a badge needs to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnTimeBadge {
    pub elapsed_minutes: f64,
    pub expected_minutes: u32,
    pub percentage: f64,
    pub status: TurnTimeStatus,
}

impl TurnTimeBadge {
    /// Whole elapsed minutes, e.g. `"42m"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}m", self.elapsed_minutes.floor() as i64)
    }
}

/// Badge for `occupant` at `now_ms` (Unix epoch milliseconds).
///
/// A seated time in the future (clock skew between devices) counts as zero
/// elapsed. An expectation of zero minutes is treated as already overdue.
#[must_use]
pub fn turn_time_status(
    occupant: &Occupant,
    now_ms: i64,
    policy: &TurnTimePolicy,
    thresholds: &TurnTimeThresholds,
) -> TurnTimeBadge {
    let elapsed_ms = now_ms.saturating_sub(occupant.seated_at_ms).max(0);
    let elapsed_minutes = elapsed_ms as f64 / MS_PER_MINUTE;
    let expected_minutes = policy.expected_minutes(occupant.party_size);
    let percentage = if expected_minutes == 0 {
        f64::INFINITY
    } else {
        elapsed_minutes / f64::from(expected_minutes) * 100.0
    };
    TurnTimeBadge {
        elapsed_minutes,
        expected_minutes,
        percentage,
        status: TurnTimeStatus::from_percentage(percentage, thresholds),
    }
}
