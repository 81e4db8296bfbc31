use crate::schema::businesses;
use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = businesses)]
pub struct Business {
    pub id: i32,
    pub provider_id: i32,
    pub name: String,
    pub summary: String,
    pub logo: Option<String>,
    pub description: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = businesses)]
pub struct NewBusiness {
    pub provider_id: i32,
    pub name: String,
    pub summary: String,
    pub logo: Option<String>,
    pub description: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = businesses)]
pub struct UpdateBusiness {
    pub name: Option<String>,
    pub summary: Option<String>,
    pub logo: Option<Option<String>>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub updated_at: Option<NaiveDateTime>,
}

/// The slice of a business an appointment view needs.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = businesses)]
pub struct BusinessRef {
    pub id: i32,
    pub provider_id: i32,
    pub name: String,
}
