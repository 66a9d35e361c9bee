pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::Config;
use crate::services::{
    auth_service::AuthService, lead_service::LeadService, user_service::UserService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub user_service: UserService,
    pub lead_service: LeadService,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let user_service = UserService::new(pool.clone());
        let auth_service = AuthService::new(user_service.clone());
        let lead_service = LeadService::new(pool.clone());

        Self {
            pool,
            config: Arc::new(config),
            auth_service,
            user_service,
            lead_service,
        }
    }
}
