pub mod auth;
pub mod health_check;
