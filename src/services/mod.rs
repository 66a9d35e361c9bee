pub mod auth_service;
pub mod export_service;
pub mod lead_query;
pub mod lead_service;
pub mod user_service;
