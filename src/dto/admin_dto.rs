use serde::Serialize;

use crate::models::user::UserSummary;

#[derive(Debug, Clone, Serialize)]
pub struct UserListView {
    pub users: Vec<UserSummary>,
}
