use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::lead::{Lead, LeadFields, LeadStatus, LeadWithAssignee};
use crate::models::user::UserOption;
use crate::services::lead_query::{LeadQuery, Pagination, Viewer};
use crate::utils::time::parse_form_date;
use crate::utils::validation::non_blank;

/// Query string of `GET /leads`. Everything arrives as text from the filter form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadListParams {
    pub status: Option<String>,
    pub bde: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
}

impl LeadListParams {
    pub fn to_query(&self, viewer: Viewer) -> LeadQuery {
        LeadQuery::new(viewer)
            .status(self.status.as_deref())
            .assignee(parse_id(self.bde.as_deref()))
            .search(self.search.as_deref())
            .page(self.page.as_deref().and_then(|p| p.trim().parse().ok()))
    }
}

fn parse_id(raw: Option<&str>) -> Option<i64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// Body of the create and edit lead forms.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LeadForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "Name, source, and status are required"))]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "Name, source, and status are required"))]
    pub source: String,
    pub project_type: Option<String>,
    pub budget: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "Name, source, and status are required"))]
    pub status: String,
    pub follow_up_date: Option<String>,
    pub comment: Option<String>,
    pub assigned_to: Option<String>,
}

impl LeadForm {
    pub fn to_fields(&self) -> Result<LeadFields, String> {
        let trimmed = LeadForm {
            name: self.name.trim().to_string(),
            source: self.source.trim().to_string(),
            status: self.status.trim().to_string(),
            ..LeadForm::default()
        };
        if let Err(errors) = trimmed.validate() {
            return Err(crate::utils::validation::first_message(&errors)
                .unwrap_or_else(|| "Name, source, and status are required".to_string()));
        }

        let status: LeadStatus = trimmed
            .status
            .parse()
            .map_err(|_| "Invalid status selected".to_string())?;

        let follow_up_date = match non_blank(self.follow_up_date.as_deref()) {
            None => None,
            Some(raw) => Some(
                parse_form_date(&raw).ok_or_else(|| "Follow-up date must be YYYY-MM-DD".to_string())?,
            ),
        };

        Ok(LeadFields {
            name: trimmed.name,
            email: non_blank(self.email.as_deref()),
            phone: non_blank(self.phone.as_deref()),
            source: trimmed.source,
            project_type: non_blank(self.project_type.as_deref()),
            budget: non_blank(self.budget.as_deref()),
            status,
            follow_up_date,
            comment: non_blank(self.comment.as_deref()),
        })
    }

    pub fn requested_assignee(&self) -> Option<i64> {
        parse_id(self.assigned_to.as_deref())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadFilters {
    pub status: Option<String>,
    pub bde: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadListView {
    pub leads: Vec<LeadWithAssignee>,
    pub pagination: Pagination,
    pub total_leads: i64,
    pub filters: LeadFilters,
    pub bde_users: Vec<UserOption>,
    pub follow_ups_today: i64,
    pub today: NaiveDate,
    pub statuses: Vec<LeadStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadFormView {
    pub lead: Option<Lead>,
    pub bde_users: Vec<UserOption>,
    pub statuses: Vec<LeadStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use crate::services::lead_query::MAX_PAGE;

    fn valid_form() -> LeadForm {
        LeadForm {
            name: " Acme Corp ".into(),
            email: Some("  ".into()),
            phone: Some(" 555-0101 ".into()),
            source: "Website".into(),
            status: "In Progress".into(),
            follow_up_date: Some("2026-04-01".into()),
            assigned_to: Some("12".into()),
            ..LeadForm::default()
        }
    }

    #[test]
    fn form_converts_and_trims() {
        let fields = valid_form().to_fields().unwrap();
        assert_eq!(fields.name, "Acme Corp");
        assert_eq!(fields.email, None);
        assert_eq!(fields.phone.as_deref(), Some("555-0101"));
        assert_eq!(fields.status, LeadStatus::InProgress);
        assert_eq!(fields.follow_up_date, NaiveDate::from_ymd_opt(2026, 4, 1));
        assert_eq!(valid_form().requested_assignee(), Some(12));
    }

    #[test]
    fn form_requires_name_source_status() {
        let mut form = valid_form();
        form.source = "   ".into();
        assert_eq!(
            form.to_fields().unwrap_err(),
            "Name, source, and status are required"
        );
    }

    #[test]
    fn form_rejects_unknown_status_and_bad_dates() {
        let mut form = valid_form();
        form.status = "Won".into();
        assert_eq!(form.to_fields().unwrap_err(), "Invalid status selected");

        let mut form = valid_form();
        form.follow_up_date = Some("tomorrow".into());
        assert!(form.to_fields().is_err());
    }

    #[test]
    fn list_params_are_lenient() {
        let params = LeadListParams {
            status: Some("all".into()),
            bde: Some("".into()),
            search: Some("  ".into()),
            page: Some("abc".into()),
        };
        let query = params.to_query(Viewer::new(1, Role::Admin));
        assert_eq!(query.status_filter(), None);
        assert_eq!(query.assignee_filter(), None);
        assert_eq!(query.search_filter(), None);
        assert_eq!(query.current_page(), 1);

        let params = LeadListParams {
            status: Some("Closed".into()),
            bde: Some("5".into()),
            search: Some("acme".into()),
            page: Some("3".into()),
        };
        let query = params.to_query(Viewer::new(1, Role::Admin));
        assert_eq!(query.status_filter(), Some("Closed"));
        assert_eq!(query.assignee_filter(), Some(5));
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn max_page_string_is_capped() {
        let params = LeadListParams {
            page: Some("9223372036854775807".into()),
            ..LeadListParams::default()
        };
        let query = params.to_query(Viewer::new(2, Role::Bde));
        assert_eq!(query.current_page(), MAX_PAGE);
        assert!(query.offset() >= 0);
    }
}
