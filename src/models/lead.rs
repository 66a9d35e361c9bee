use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    New,
    #[serde(rename = "In Progress")]
    InProgress,
    Closed,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 3] = [LeadStatus::New, LeadStatus::InProgress, LeadStatus::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::InProgress => "In Progress",
            LeadStatus::Closed => "Closed",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown lead status: {}", s))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lead {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: String,
    pub project_type: Option<String>,
    pub budget: Option<String>,
    pub status: String,
    pub follow_up_date: Option<NaiveDate>,
    pub comment: Option<String>,
    pub assigned_to: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A lead joined with its assignee's display name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LeadWithAssignee {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub lead: Lead,
    pub assignee_name: Option<String>,
}

/// Values written by create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadFields {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub source: String,
    pub project_type: Option<String>,
    pub budget: Option<String>,
    pub status: LeadStatus,
    pub follow_up_date: Option<NaiveDate>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct LeadStats {
    pub total: i64,
    pub new_leads: i64,
    pub in_progress: i64,
    pub closed: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_display_names() {
        for status in LeadStatus::ALL {
            assert_eq!(status.as_str().parse::<LeadStatus>(), Ok(status));
        }
        assert_eq!("in progress".parse::<LeadStatus>(), Ok(LeadStatus::InProgress));
        assert!("Won".parse::<LeadStatus>().is_err());
    }

    #[test]
    fn status_serializes_with_spaces() {
        let json = serde_json::to_string(&LeadStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
    }
}
