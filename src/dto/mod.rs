pub mod account_dto;
pub mod admin_dto;
pub mod auth_dto;
