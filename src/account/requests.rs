use serde::Deserialize;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ModifyInfoRequest {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub address: Option<String>,
    pub preferences: Option<String>,
}

#[derive(Deserialize)]
pub struct ModifyPasswordRequest {
    pub password_old: String,
    pub password_new: String,
}
