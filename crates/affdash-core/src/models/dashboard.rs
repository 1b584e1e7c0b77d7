use serde::{Deserialize, Serialize};

use super::validate::{
    require_non_empty, require_non_negative, require_non_negative_ratio, require_percentage, Validate,
};
use super::Pence;

/// Response of `GET /dashboard`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardData {
    pub stats: DashboardStats,
    pub affiliate: Affiliate,
}

/// Server-computed totals. Never recomputed client side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_clicks: u64,
    pub total_signups: u64,
    pub total_earnings_pence: Pence,
    pub total_paid_pence: Pence,
    pub pending_pence: Pence,
    /// Percentage of clicks that became signups
    pub conversion_rate: f64,
    #[serde(default)]
    pub last_30_days_clicks: u64,
    #[serde(default)]
    pub last_30_days_signups: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Affiliate {
    pub id: String,
    pub name: String,
    pub email: String,
    pub referral_code: String,
    /// Commission percentage, e.g. `10` or `12.5`
    pub commission_rate: f64,
}

impl Affiliate {
    /// First word of the display name, for the greeting.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(self.name.as_str())
    }
}

impl Validate for DashboardData {
    fn validate(&self) -> Result<(), String> {
        let stats = &self.stats;
        require_non_negative("stats.total_earnings_pence", stats.total_earnings_pence.0)?;
        require_non_negative("stats.total_paid_pence", stats.total_paid_pence.0)?;
        require_non_negative("stats.pending_pence", stats.pending_pence.0)?;
        require_non_negative_ratio("stats.conversion_rate", stats.conversion_rate)?;

        let affiliate = &self.affiliate;
        require_non_empty("affiliate.id", &affiliate.id)?;
        require_non_empty("affiliate.referral_code", &affiliate.referral_code)?;
        require_percentage("affiliate.commission_rate", affiliate.commission_rate)?;
        Ok(())
    }
}
