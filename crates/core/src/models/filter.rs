use chrono::{DateTime, Duration, Utc};

use crate::errors::CoreError;

use super::transaction::TransactionType;

/// Which transaction types a listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Only(TransactionType),
}

impl TypeFilter {
    pub fn matches(&self, kind: TransactionType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(k) => *k == kind,
        }
    }
}

impl std::str::FromStr for TypeFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("ALL") {
            Ok(TypeFilter::All)
        } else {
            s.parse().map(TypeFilter::Only)
        }
    }
}

/// Relative look-back window for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    /// No cutoff
    #[default]
    All,
    Last24Hours,
    Last7Days,
    Last30Days,
    Last3Months,
    Last6Months,
    LastYear,
    Last2Years,
    Last5Years,
}

impl TimeRange {
    /// Every range, narrowest window first (ending with `All`).
    pub const ORDERED: [TimeRange; 9] = [
        TimeRange::Last24Hours,
        TimeRange::Last7Days,
        TimeRange::Last30Days,
        TimeRange::Last3Months,
        TimeRange::Last6Months,
        TimeRange::LastYear,
        TimeRange::Last2Years,
        TimeRange::Last5Years,
        TimeRange::All,
    ];

    /// Window length. Months are 30 days and years 365 days.
    pub fn window(&self) -> Option<Duration> {
        match self {
            TimeRange::All => None,
            TimeRange::Last24Hours => Some(Duration::hours(24)),
            TimeRange::Last7Days => Some(Duration::days(7)),
            TimeRange::Last30Days => Some(Duration::days(30)),
            TimeRange::Last3Months => Some(Duration::days(90)),
            TimeRange::Last6Months => Some(Duration::days(180)),
            TimeRange::LastYear => Some(Duration::days(365)),
            TimeRange::Last2Years => Some(Duration::days(730)),
            TimeRange::Last5Years => Some(Duration::days(1825)),
        }
    }

    /// Earliest timestamp still inside the window.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.window().map(|w| now - w)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::All => "ALL",
            TimeRange::Last24Hours => "24H",
            TimeRange::Last7Days => "7D",
            TimeRange::Last30Days => "30D",
            TimeRange::Last3Months => "3M",
            TimeRange::Last6Months => "6M",
            TimeRange::LastYear => "1Y",
            TimeRange::Last2Years => "2Y",
            TimeRange::Last5Years => "5Y",
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for TimeRange {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        TimeRange::ORDERED
            .into_iter()
            .find(|r| r.label() == upper)
            .ok_or_else(|| {
                CoreError::ValidationError(format!(
                    "Unknown time range '{s}' (expected ALL, 24H, 7D, 30D, 3M, 6M, 1Y, 2Y or 5Y)"
                ))
            })
    }
}

/// Listing criteria: type, time window and free-text search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub kind: TypeFilter,
    pub range: TimeRange,
    /// Case-insensitive substring over description and method; blank matches everything
    pub search: String,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: TypeFilter) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_range(mut self, range: TimeRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }
}
