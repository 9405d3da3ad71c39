use serde::Deserialize;

/// Incoming payload for account registration.
#[derive(Debug, Deserialize)]
pub struct AuthRegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Incoming payload for password login.
#[derive(Debug, Deserialize)]
pub struct AuthLoginRequest {
    pub email: String,
    pub password: String,
}

/// Incoming payload for the platform-admin bootstrap.
#[derive(Debug, Deserialize)]
pub struct BootstrapRequest {
    pub email: String,
    pub token: String,
}
