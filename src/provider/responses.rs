use serde::Serialize;

use crate::protocol::WindowItem;

#[derive(Serialize)]
pub struct WindowResponse {
    pub window: WindowItem,
}

#[derive(Serialize)]
pub struct WindowsResponse {
    pub windows: Vec<WindowItem>,
}
