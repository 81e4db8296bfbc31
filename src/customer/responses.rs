use serde::Serialize;

use crate::protocol::AppointmentItem;

#[derive(Serialize)]
pub struct GroupedAppointResponse {
    pub upcoming: Vec<AppointmentItem>,
    pub past: Vec<AppointmentItem>,
}
