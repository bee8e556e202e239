pub mod admin_handler;
pub mod auth_handler;
pub mod user_handler;
