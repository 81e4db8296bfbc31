use crate::schema::customer_profiles;
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = customer_profiles, primary_key(account_id))]
pub struct CustomerProfile {
    pub account_id: i32,
    pub full_name: String,
    pub phone_number: String,
    pub preferences: String,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = customer_profiles)]
pub struct UpdateCustomer {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub preferences: Option<String>,
}
