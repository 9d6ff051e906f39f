use serde::{Deserialize, Serialize};

use super::user::PublicUser;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminResetPasswordRequest {
    pub token: String,
    pub email: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

/// Returned by register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// The new plaintext is echoed back so the admin can relay it through a
/// secondary channel if email delivery is unavailable.
#[derive(Debug, Serialize)]
pub struct AdminResetPasswordResponse {
    pub message: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}
