pub mod admin_middleware;
pub mod user_middleware;
