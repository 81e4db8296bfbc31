use serde::Serialize;

#[derive(Default, Serialize)]
pub struct RegisterResponse {
    pub account_id: i32,
    pub username: String,
    pub role: String,
}

#[derive(Default, Serialize)]
pub struct LoginResponse {
    pub login_token: String,
    pub account_id: i32,
    pub username: String,
    pub role: String,
}

/// Role-specific fields are left out rather than sent empty.
#[derive(Default, Serialize)]
pub struct ViewInfoResponse {
    pub account_id: i32,
    pub username: String,
    pub email: String,
    pub role: String,
    pub name: String,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<String>,
    pub created_at: String,
}
