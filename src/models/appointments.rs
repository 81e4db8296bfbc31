use crate::schema::appointments;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::{deserialize::FromSqlRow, expression::AsExpression, prelude::*, sql_types::Text};

/// Lifecycle of an appointment. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum AppointmentStatus {
    Active,
    Cancelled,
}

crate::impl_text_column!(AppointmentStatus {
    Active => "ACTIVE",
    Cancelled => "CANCELLED",
});

impl AppointmentStatus {
    /// The only transition: `Active -> Cancelled`. Returns `None` when the
    /// appointment is already cancelled.
    pub fn cancel(self) -> Option<Self> {
        match self {
            Self::Active => Some(Self::Cancelled),
            Self::Cancelled => None,
        }
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = appointments)]
pub struct Appointment {
    pub id: i32,
    pub business_id: i32,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    pub notes: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.appointment_date.and_time(self.appointment_time)
    }

    /// Active and strictly after `now`.
    pub fn is_upcoming(&self, now: NaiveDateTime) -> bool {
        self.status.is_active() && self.starts_at() > now
    }
}

/// New rows always start `Active`; there is no way to insert another status.
#[derive(Insertable)]
#[diesel(table_name = appointments)]
pub struct NewAppointment {
    pub business_id: i32,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    status: AppointmentStatus,
    pub notes: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewAppointment {
    pub fn active(
        business_id: i32,
        appointment_date: NaiveDate,
        appointment_time: NaiveTime,
        notes: String,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            business_id,
            appointment_date,
            appointment_time,
            status: AppointmentStatus::Active,
            notes,
            created_at: now,
            updated_at: now,
        }
    }
}
