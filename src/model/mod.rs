pub mod admin;
pub mod deposit;
pub mod user;
pub mod withdrawal;
