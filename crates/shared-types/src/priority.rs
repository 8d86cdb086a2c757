//! # Priority Classes
//!
//! Scheduling tiers used by the priority-aware bus. Lower discriminant means
//! higher priority, so the derived `Ord` sorts most urgent first.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheduling tier of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityClass {
    /// Lifecycle signals: handshakes, navigation, availability.
    Critical = 0,
    /// Request/response traffic driven by the user.
    Normal = 1,
    /// High-frequency, low-value updates (profiler frames, highlights).
    Background = 2,
}

impl PriorityClass {
    /// Number of classes.
    pub const COUNT: usize = 3;

    /// All classes, most urgent first.
    pub const ALL: [PriorityClass; Self::COUNT] = [Self::Critical, Self::Normal, Self::Background];

    /// Class assigned to topics the catalog does not map explicitly.
    pub const DEFAULT: PriorityClass = PriorityClass::Normal;

    /// Queue index of this class (0 is the most urgent).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Class stored at a queue index.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// True if `self` is drained before `other` under strict priority.
    #[must_use]
    pub fn outranks(self, other: PriorityClass) -> bool {
        self < other
    }

    /// Lowercase label, used for logs and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Normal => "normal",
            Self::Background => "background",
        }
    }
}

impl Default for PriorityClass {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
