use serde::Deserialize;

#[derive(Deserialize)]
pub struct AddBusinessRequest {
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
}

/// Absent fields are left alone. An empty `logo` removes the logo.
#[derive(Deserialize)]
pub struct ModifyBusinessRequest {
    pub business_id: i32,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub logo: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

#[derive(Deserialize)]
pub struct BusinessIdRequest {
    pub business_id: i32,
}

#[derive(Deserialize)]
pub struct WindowRequest {
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Deserialize)]
pub struct SetAvailabilityRequest {
    pub business_id: i32,
    pub windows: Vec<WindowRequest>,
}

#[derive(Deserialize)]
pub struct WindowIdRequest {
    pub window_id: i32,
}

#[derive(Deserialize)]
pub struct ModifyAvailabilityRequest {
    pub window_id: i32,
    pub day_of_week: Option<i32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchAppointRequest {
    pub business_id: Option<i32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct AppointIdRequest {
    pub appointment_id: i32,
}

#[derive(Deserialize)]
pub struct ModifyAppointRequest {
    pub appointment_id: i32,
    pub notes: String,
}
