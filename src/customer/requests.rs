use serde::Deserialize;

/// `customers` defaults to the caller alone.
#[derive(Deserialize)]
pub struct AppointRequest {
    pub business_id: i32,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub notes: String,
    pub customers: Option<Vec<i32>>,
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
