use chrono::NaiveDate;
use sqlx::{postgres::PgArguments, query::QueryAs, query::QueryScalar, PgPool, Postgres};

use crate::error::Result;
use crate::models::lead::{Lead, LeadFields, LeadStats, LeadWithAssignee};
use crate::models::user::UserOption;
use crate::services::lead_query::{LeadQuery, Pagination, SqlArg, Viewer, PAGE_SIZE};

const LEAD_COLUMNS: &str = "l.id, l.name, l.email, l.phone, l.source, l.project_type, l.budget, \
     l.status, l.follow_up_date, l.comment, l.assigned_to, l.created_at";

#[derive(Clone)]
pub struct LeadService {
    pool: PgPool,
}

#[derive(Debug)]
pub struct LeadPage {
    pub items: Vec<LeadWithAssignee>,
    pub pagination: Pagination,
}

/// Where a lead lookup ended for a given viewer.
#[derive(Debug)]
pub enum LeadAccess {
    Granted(Lead),
    Missing,
    Forbidden,
}

fn bind_scalar<'q>(
    mut statement: QueryScalar<'q, Postgres, i64, PgArguments>,
    args: &[SqlArg],
) -> QueryScalar<'q, Postgres, i64, PgArguments> {
    for arg in args {
        statement = match arg {
            SqlArg::Int(v) => statement.bind(*v),
            SqlArg::Text(v) => statement.bind(v.clone()),
        };
    }
    statement
}

fn bind_rows<'q, O>(
    mut statement: QueryAs<'q, Postgres, O, PgArguments>,
    args: &[SqlArg],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for arg in args {
        statement = match arg {
            SqlArg::Int(v) => statement.bind(*v),
            SqlArg::Text(v) => statement.bind(v.clone()),
        };
    }
    statement
}

fn scope_clause(viewer: Viewer, column: &str, placeholder: usize) -> (String, Option<i64>) {
    if viewer.is_admin() {
        (String::new(), None)
    } else {
        (format!(" AND {} = ${}", column, placeholder), Some(viewer.id))
    }
}

fn update_sql(viewer: Viewer) -> (String, Option<i64>) {
    let (scope, owner) = scope_clause(viewer, "assigned_to", 12);
    let sql = format!(
        "UPDATE leads \
         SET name = $2, email = $3, phone = $4, source = $5, project_type = $6, \
             budget = $7, status = $8, follow_up_date = $9, comment = $10, assigned_to = $11 \
         WHERE id = $1{} \
         RETURNING id, name, email, phone, source, project_type, budget, \
                   status, follow_up_date, comment, assigned_to, created_at",
        scope
    );
    (sql, owner)
}

impl LeadService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: &LeadQuery) -> Result<LeadPage> {
        let filter = query.filter();

        let total = bind_scalar(
            sqlx::query_scalar::<_, i64>(&query.count_sql(&filter)),
            filter.args(),
        )
        .fetch_one(&self.pool)
        .await?;

        let page_sql = query.page_sql(&filter);
        let items = bind_rows(
            sqlx::query_as::<_, LeadWithAssignee>(&page_sql),
            filter.args(),
        )
        .bind(PAGE_SIZE)
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(
            viewer = query.viewer().id,
            page = query.current_page(),
            total,
            returned = items.len(),
            "Listed leads"
        );

        Ok(LeadPage {
            items,
            pagination: Pagination::new(query.current_page(), PAGE_SIZE, total),
        })
    }

    pub async fn find(&self, id: i64) -> Result<Option<Lead>> {
        let sql = format!("SELECT {} FROM leads l WHERE l.id = $1", LEAD_COLUMNS);
        let lead = sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(lead)
    }

    /// Loads a lead and applies the ownership rule for `viewer`.
    pub async fn find_for(&self, viewer: Viewer, id: i64) -> Result<LeadAccess> {
        Ok(match self.find(id).await? {
            None => LeadAccess::Missing,
            Some(lead) if viewer.can_access(lead.assigned_to) => LeadAccess::Granted(lead),
            Some(_) => LeadAccess::Forbidden,
        })
    }

    pub async fn create(&self, fields: &LeadFields, assigned_to: Option<i64>) -> Result<Lead> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (
                name, email, phone, source, project_type, budget,
                status, follow_up_date, comment, assigned_to
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, name, email, phone, source, project_type, budget,
                      status, follow_up_date, comment, assigned_to, created_at
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.source)
        .bind(&fields.project_type)
        .bind(&fields.budget)
        .bind(fields.status.as_str())
        .bind(fields.follow_up_date)
        .bind(&fields.comment)
        .bind(assigned_to)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(lead_id = lead.id, assigned_to = ?assigned_to, "Lead created");
        Ok(lead)
    }

    /// Writes the lead only while `viewer` may still access it, so a BDE's
    /// edit cannot land on a lead reassigned after the ownership check.
    /// `None` means the lead is gone or no longer theirs.
    pub async fn update(
        &self,
        viewer: Viewer,
        id: i64,
        fields: &LeadFields,
        assigned_to: Option<i64>,
    ) -> Result<Option<Lead>> {
        let (sql, owner) = update_sql(viewer);
        let mut statement = sqlx::query_as::<_, Lead>(&sql)
            .bind(id)
            .bind(&fields.name)
            .bind(&fields.email)
            .bind(&fields.phone)
            .bind(&fields.source)
            .bind(&fields.project_type)
            .bind(&fields.budget)
            .bind(fields.status.as_str())
            .bind(fields.follow_up_date)
            .bind(&fields.comment)
            .bind(assigned_to);
        if let Some(owner) = owner {
            statement = statement.bind(owner);
        }
        let lead = statement.fetch_optional(&self.pool).await?;

        match &lead {
            Some(_) => tracing::info!(lead_id = id, assigned_to = ?assigned_to, "Lead updated"),
            None => tracing::warn!(lead_id = id, viewer = viewer.id, "Lead update matched no row"),
        }
        Ok(lead)
    }

    /// Returns false when no such lead existed.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let res = sqlx::query("DELETE FROM leads WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let deleted = res.rows_affected() > 0;
        if deleted {
            tracing::info!(lead_id = id, "Lead deleted");
        }
        Ok(deleted)
    }

    pub async fn count_follow_ups_on(&self, viewer: Viewer, day: NaiveDate) -> Result<i64> {
        let (scope, owner) = scope_clause(viewer, "assigned_to", 2);
        let sql = format!(
            "SELECT COUNT(*) FROM leads WHERE follow_up_date = $1{}",
            scope
        );
        let mut statement = sqlx::query_scalar::<_, i64>(&sql).bind(day);
        if let Some(owner) = owner {
            statement = statement.bind(owner);
        }
        Ok(statement.fetch_one(&self.pool).await?)
    }

    pub async fn follow_ups_on(
        &self,
        viewer: Viewer,
        day: NaiveDate,
        limit: i64,
    ) -> Result<Vec<LeadWithAssignee>> {
        let (scope, owner) = scope_clause(viewer, "l.assigned_to", 3);
        let sql = format!(
            "SELECT {}, u.name AS assignee_name
             FROM leads l
             LEFT JOIN users u ON u.id = l.assigned_to
             WHERE l.follow_up_date = $1{}
             ORDER BY l.name
             LIMIT $2",
            LEAD_COLUMNS, scope
        );
        let mut statement = sqlx::query_as::<_, LeadWithAssignee>(&sql)
            .bind(day)
            .bind(limit);
        if let Some(owner) = owner {
            statement = statement.bind(owner);
        }
        Ok(statement.fetch_all(&self.pool).await?)
    }

    pub async fn recent(&self, viewer: Viewer, limit: i64) -> Result<Vec<LeadWithAssignee>> {
        let (scope, owner) = scope_clause(viewer, "l.assigned_to", 2);
        let sql = format!(
            "SELECT {}, u.name AS assignee_name
             FROM leads l
             LEFT JOIN users u ON u.id = l.assigned_to
             WHERE TRUE{}
             ORDER BY l.created_at DESC, l.id DESC
             LIMIT $1",
            LEAD_COLUMNS, scope
        );
        let mut statement = sqlx::query_as::<_, LeadWithAssignee>(&sql).bind(limit);
        if let Some(owner) = owner {
            statement = statement.bind(owner);
        }
        Ok(statement.fetch_all(&self.pool).await?)
    }

    pub async fn stats(&self, viewer: Viewer) -> Result<LeadStats> {
        let (scope, owner) = scope_clause(viewer, "assigned_to", 1);
        let sql = format!(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'New') AS new_leads,
                COUNT(*) FILTER (WHERE status = 'In Progress') AS in_progress,
                COUNT(*) FILTER (WHERE status = 'Closed') AS closed
             FROM leads
             WHERE TRUE{}",
            scope
        );
        let mut statement = sqlx::query_as::<_, LeadStats>(&sql);
        if let Some(owner) = owner {
            statement = statement.bind(owner);
        }
        Ok(statement.fetch_one(&self.pool).await?)
    }

    /// Every lead with its assignee, newest first. Feeds the spreadsheet export.
    pub async fn all_for_export(&self) -> Result<Vec<LeadWithAssignee>> {
        let sql = format!(
            "SELECT {}, u.name AS assignee_name
             FROM leads l
             LEFT JOIN users u ON u.id = l.assigned_to
             ORDER BY l.created_at DESC, l.id DESC",
            LEAD_COLUMNS
        );
        let items = sqlx::query_as::<_, LeadWithAssignee>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Active BDE users an admin can assign leads to.
    pub async fn assignable_users(&self) -> Result<Vec<UserOption>> {
        let users = sqlx::query_as::<_, UserOption>(
            "SELECT id, name FROM users WHERE role = 'bde' AND is_active = TRUE ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }
}
