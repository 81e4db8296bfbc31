use crate::schema::appointment_participants;
use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Insertable)]
#[diesel(table_name = appointment_participants)]
pub struct NewParticipant {
    pub appointment_id: i32,
    pub customer_id: i32,
    pub joined_at: NaiveDateTime,
}

/// A participant joined with the customer's display name.
#[derive(Debug, Clone, PartialEq, Eq, Queryable)]
pub struct Participant {
    pub appointment_id: i32,
    pub customer_id: i32,
    pub full_name: String,
    pub joined_at: NaiveDateTime,
}
