use crate::schema::sessions;
use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Queryable, Selectable, Insertable)]
#[diesel(table_name = sessions)]
pub struct SessionData {
    pub token: String,
    pub account_id: i32,
    pub login_time: NaiveDateTime,
}
