table! {
    accounts (id) {
        id -> Integer,
        username -> Text,
        email -> Text,
        password_hash -> Text,
        role -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    appointment_participants (id) {
        id -> Integer,
        appointment_id -> Integer,
        customer_id -> Integer,
        joined_at -> Timestamp,
    }
}

table! {
    appointments (id) {
        id -> Integer,
        business_id -> Integer,
        appointment_date -> Date,
        appointment_time -> Time,
        status -> Text,
        notes -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    availability_windows (id) {
        id -> Integer,
        business_id -> Integer,
        day_of_week -> Integer,
        start_time -> Time,
        end_time -> Time,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    businesses (id) {
        id -> Integer,
        provider_id -> Integer,
        name -> Text,
        summary -> Text,
        logo -> Nullable<Text>,
        description -> Text,
        phone -> Text,
        email -> Text,
        address -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    customer_profiles (account_id) {
        account_id -> Integer,
        full_name -> Text,
        phone_number -> Text,
        preferences -> Text,
    }
}

table! {
    provider_profiles (account_id) {
        account_id -> Integer,
        business_name -> Text,
        bio -> Text,
        phone_number -> Text,
        address -> Text,
    }
}

table! {
    sessions (token) {
        token -> Text,
        account_id -> Integer,
        login_time -> Timestamp,
    }
}

joinable!(appointment_participants -> appointments (appointment_id));
joinable!(appointment_participants -> customer_profiles (customer_id));
joinable!(appointments -> businesses (business_id));
joinable!(availability_windows -> businesses (business_id));
joinable!(businesses -> provider_profiles (provider_id));
joinable!(customer_profiles -> accounts (account_id));
joinable!(provider_profiles -> accounts (account_id));
joinable!(sessions -> accounts (account_id));

allow_tables_to_appear_in_same_query!(
    accounts,
    appointment_participants,
    appointments,
    availability_windows,
    businesses,
    customer_profiles,
    provider_profiles,
    sessions,
);
