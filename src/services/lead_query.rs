//! Composition of the role-scoped lead listing query.
//!
//! The composer is pure: it produces a `WHERE` clause with Postgres
//! placeholders plus the values to bind, and the pagination window. Running it
//! is left to [`LeadService`](crate::services::lead_service::LeadService).

use serde::Serialize;

use crate::models::user::Role;

pub const PAGE_SIZE: i64 = 10;
/// Highest page number whose offset still fits in an `i64`.
pub const MAX_PAGE: i64 = i64::MAX / PAGE_SIZE;

/// Who is asking. Visibility rules are derived from this alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub id: i64,
    pub role: Role,
}

impl Viewer {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether this viewer may read or change a lead with the given assignee.
    pub fn can_access(&self, assigned_to: Option<i64>) -> bool {
        self.is_admin() || assigned_to == Some(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlArg {
    Int(i64),
    Text(String),
}

/// A conjunction of predicates over `leads l` and its bind values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlFilter {
    predicates: Vec<String>,
    args: Vec<SqlArg>,
}

impl SqlFilter {
    fn unconditional() -> Self {
        Self {
            predicates: vec!["TRUE".to_string()],
            args: Vec::new(),
        }
    }

    fn next_placeholder(&self) -> String {
        format!("${}", self.args.len() + 1)
    }

    fn push(&mut self, predicate: impl FnOnce(&str) -> String, arg: SqlArg) {
        let placeholder = self.next_placeholder();
        self.predicates.push(predicate(&placeholder));
        self.args.push(arg);
    }

    pub fn clause(&self) -> String {
        self.predicates.join(" AND ")
    }

    pub fn args(&self) -> &[SqlArg] {
        &self.args
    }
}

/// Filters and page requested for the lead list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadQuery {
    viewer: Viewer,
    status: Option<String>,
    assignee: Option<i64>,
    search: Option<String>,
    page: i64,
}

impl LeadQuery {
    pub fn new(viewer: Viewer) -> Self {
        Self {
            viewer,
            status: None,
            assignee: None,
            search: None,
            page: 1,
        }
    }

    /// Blank and `all` mean no status filter.
    pub fn status(mut self, status: Option<&str>) -> Self {
        self.status = status
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
            .map(str::to_string);
        self
    }

    /// Only honoured for admins.
    pub fn assignee(mut self, assignee: Option<i64>) -> Self {
        self.assignee = assignee.filter(|_| self.viewer.is_admin());
        self
    }

    pub fn search(mut self, search: Option<&str>) -> Self {
        self.search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self
    }

    /// Clamped to `1..=MAX_PAGE` so the offset always fits in an `i64`.
    pub fn page(mut self, page: Option<i64>) -> Self {
        self.page = page.unwrap_or(1).clamp(1, MAX_PAGE);
        self
    }

    pub fn viewer(&self) -> Viewer {
        self.viewer
    }

    pub fn current_page(&self) -> i64 {
        self.page
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * PAGE_SIZE
    }

    pub fn status_filter(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn assignee_filter(&self) -> Option<i64> {
        self.assignee
    }

    pub fn search_filter(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn filter(&self) -> SqlFilter {
        let mut filter = SqlFilter::unconditional();

        if !self.viewer.is_admin() {
            filter.push(|p| format!("l.assigned_to = {}", p), SqlArg::Int(self.viewer.id));
        }
        if let Some(status) = &self.status {
            filter.push(|p| format!("l.status = {}", p), SqlArg::Text(status.clone()));
        }
        if let Some(assignee) = self.assignee {
            filter.push(|p| format!("l.assigned_to = {}", p), SqlArg::Int(assignee));
        }
        if let Some(search) = &self.search {
            filter.push(
                |p| {
                    format!(
                        "(l.name ILIKE {p} ESCAPE '\\' OR l.email ILIKE {p} ESCAPE '\\' OR l.phone ILIKE {p} ESCAPE '\\')"
                    )
                },
                SqlArg::Text(format!("%{}%", escape_like(search))),
            );
        }

        filter
    }

    pub fn count_sql(&self, filter: &SqlFilter) -> String {
        format!("SELECT COUNT(*) FROM leads l WHERE {}", filter.clause())
    }

    /// Page query; `LIMIT` and `OFFSET` follow the filter's own placeholders.
    pub fn page_sql(&self, filter: &SqlFilter) -> String {
        let limit = filter.args().len() + 1;
        format!(
            "SELECT l.id, l.name, l.email, l.phone, l.source, l.project_type, l.budget, l.status,
                    l.follow_up_date, l.comment, l.assigned_to, l.created_at,
                    u.name AS assignee_name
             FROM leads l
             LEFT JOIN users u ON u.id = l.assigned_to
             WHERE {}
             ORDER BY l.created_at DESC, l.id DESC
             LIMIT ${} OFFSET ${}",
            filter.clause(),
            limit,
            limit + 1
        )
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total_pages(total, per_page),
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

pub fn total_pages(total: i64, per_page: i64) -> i64 {
    if total <= 0 || per_page <= 0 {
        0
    } else {
        (total + per_page - 1) / per_page
    }
}
