pub mod admin_dto;
pub mod auth_dto;
pub mod dashboard_dto;
pub mod lead_dto;
pub mod view;
