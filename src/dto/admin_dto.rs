use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AdminSignInRequestDto {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BroadcastRequestDto {
    #[validate(length(min = 2, max = 120))]
    pub subject: String,
    #[validate(length(min = 2, max = 10000))]
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct BroadcastResponseDto {
    pub sent: usize,
}

#[derive(Debug, Serialize)]
pub struct JobReportResponseDto {
    pub job: String,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}
