use crate::schema::accounts;
use chrono::NaiveDateTime;
use diesel::{deserialize::FromSqlRow, expression::AsExpression, prelude::*, sql_types::Text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum Role {
    Provider,
    Customer,
}

crate::impl_text_column!(Role {
    Provider => "PROVIDER",
    Customer => "CUSTOMER",
});

impl Role {
    /// Accepts `provider` / `customer` in any letter case.
    pub fn parse_loose(s: &str) -> Option<Self> {
        s.trim().to_uppercase().parse().ok()
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = accounts)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = accounts)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
