use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequestDto {
    #[validate(length(min = 3, max = 32))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 2, max = 100))]
    pub full_name: String,
    #[validate(length(min = 2, max = 64))]
    pub nationality: String,
    #[validate(length(min = 6, max = 6))]
    pub referral_code: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequestDto {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshTokenRequestDto {
    #[validate(length(min = 10))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequestDto {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequestDto {
    #[validate(length(min = 6, max = 6))]
    pub token: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}
