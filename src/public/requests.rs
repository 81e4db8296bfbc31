use serde::Deserialize;

#[derive(Deserialize)]
pub struct SearchBusinessRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Deserialize)]
pub struct ListBusinessRequest {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct ViewBusinessRequest {
    pub business_id: i32,
}

#[derive(Deserialize)]
pub struct CheckSlotRequest {
    pub business_id: i32,
    pub date: String,
    pub time: String,
}
