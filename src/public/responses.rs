use serde::Serialize;

#[derive(Default, Serialize)]
pub struct CheckSlotResponse {
    pub business_id: i32,
    pub date: String,
    pub time: String,
    pub available: bool,
}
