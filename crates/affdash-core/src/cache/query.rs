use chrono::{DateTime, Duration, Utc};

/// The independent queries behind the dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    Dashboard,
    Conversions,
    Payouts,
}

impl Query {
    pub const ALL: [Query; 3] = [Query::Dashboard, Query::Conversions, Query::Payouts];

    /// How long a successful result counts as fresh.
    pub fn stale_after(self) -> Duration {
        match self {
            Query::Dashboard => Duration::seconds(15),
            Query::Conversions | Query::Payouts => Duration::seconds(30),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Query::Dashboard => "dashboard",
            Query::Conversions => "conversions",
            Query::Payouts => "payouts",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CachedData<T> {
    pub data: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            fetched_at: Utc::now(),
        }
    }

    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.fetched_at).num_seconds()
    }

    pub fn age_display(&self) -> String {
        let seconds = self.age_seconds();
        if seconds < 10 {
            // Also covers clock skew
            "just now".to_string()
        } else if seconds < 60 {
            format!("{}s ago", seconds)
        } else if seconds < 3600 {
            format!("{}m ago", seconds / 60)
        } else {
            format!("{}h ago", seconds / 3600)
        }
    }

    pub fn is_stale(&self, query: Query) -> bool {
        Utc::now() - self.fetched_at > query.stale_after()
    }
}

/// True when there is nothing cached or the cached value has gone stale.
pub fn needs_fetch<T>(cached: Option<&CachedData<T>>, query: Query) -> bool {
    cached.map(|c| c.is_stale(query)).unwrap_or(true)
}
