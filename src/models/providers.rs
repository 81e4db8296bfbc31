use crate::schema::provider_profiles;
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Identifiable)]
#[diesel(table_name = provider_profiles, primary_key(account_id))]
pub struct ProviderProfile {
    pub account_id: i32,
    pub business_name: String,
    pub bio: String,
    pub phone_number: String,
    pub address: String,
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = provider_profiles)]
pub struct UpdateProvider {
    pub business_name: Option<String>,
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
}
