use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::lead::{LeadStats, LeadWithAssignee};

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub stats: LeadStats,
    pub follow_ups: Vec<LeadWithAssignee>,
    pub recent_leads: Vec<LeadWithAssignee>,
    pub today: NaiveDate,
}

impl DashboardView {
    /// Rendered when the aggregation queries fail.
    pub fn empty(today: NaiveDate) -> Self {
        Self {
            stats: LeadStats::default(),
            follow_ups: Vec::new(),
            recent_leads: Vec::new(),
            today,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub member_since: DateTime<Utc>,
    pub profile_stats: LeadStats,
    pub recent_leads: Vec<LeadWithAssignee>,
}
