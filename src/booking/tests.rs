use std::sync::{Arc, Barrier};
use std::thread;

use super::query::*;
use super::*;
use crate::database::testing::{business, caller, customer, provider, stamp, test_pool};
use crate::models::appointments::AppointmentStatus;

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

fn booking(business_id: i32, customer_ids: Vec<i32>, day: &str, at: &str) -> NewBooking {
    NewBooking {
        business_id,
        customer_ids,
        date: date(day),
        time: time(at),
        notes: String::new(),
    }
}

fn active_count(conn: &mut SqliteConnection, business_id: i32, day: &str, at: &str) -> i64 {
    use crate::schema::appointments;

    appointments::table
        .filter(appointments::business_id.eq(business_id))
        .filter(appointments::appointment_date.eq(date(day)))
        .filter(appointments::appointment_time.eq(time(at)))
        .filter(appointments::status.eq(AppointmentStatus::Active))
        .count()
        .get_result(conn)
        .unwrap()
}

#[test]
fn booking_a_taken_slot_conflicts() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();
    let owner = provider(&mut conn, "owner@example.com");
    let shop = business(&mut conn, owner, "Barber");
    let ann = customer(&mut conn, "ann@example.com");
    let bob = customer(&mut conn, "bob@example.com");

    let created = create_appointment(
        &mut conn,
        booking(shop.id, vec![ann], "2030-01-01", "10:00"),
        stamp(),
    )
    .unwrap();
    assert_eq!(created.appointment.status, AppointmentStatus::Active);
    assert_eq!(created.business.id, shop.id);
    assert_eq!(created.participants.len(), 1);
    assert_eq!(created.participants[0].customer_id, ann);

    let second = create_appointment(
        &mut conn,
        booking(shop.id, vec![bob], "2030-01-01", "10:00"),
        stamp(),
    );
    assert!(matches!(second, Err(ServiceError::SlotConflict(_))));

    // a neighbouring slot is unaffected
    create_appointment(
        &mut conn,
        booking(shop.id, vec![bob], "2030-01-01", "10:30"),
        stamp(),
    )
    .unwrap();
}

#[test]
fn preconditions_fail_in_order() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();
    let owner = provider(&mut conn, "owner@example.com");
    let shop = business(&mut conn, owner, "Barber");
    let ann = customer(&mut conn, "ann@example.com");

    match create_appointment(&mut conn, booking(shop.id, vec![], "2030-01-01", "10:00"), stamp()) {
        Err(ServiceError::InvalidInput(msg)) => {
            assert!(msg.to_lowercase().contains("at least one customer"))
        }
        other => panic!("unexpected result: {:?}", other.map(|d| d.appointment.id)),
    }

    // empty customers wins over an unknown business
    assert!(matches!(
        create_appointment(&mut conn, booking(9999, vec![], "2030-01-01", "10:00"), stamp()),
        Err(ServiceError::InvalidInput(_))
    ));

    match create_appointment(&mut conn, booking(shop.id, vec![ann], "2020-01-01", "10:00"), stamp()) {
        Err(ServiceError::InvalidInput(msg)) => assert!(msg.contains("future")),
        other => panic!("unexpected result: {:?}", other.map(|d| d.appointment.id)),
    }

    // exactly now is not in the future
    assert!(matches!(
        create_appointment(&mut conn, booking(shop.id, vec![ann], "2030-01-01", "08:00"), stamp()),
        Err(ServiceError::InvalidInput(_))
    ));

    // the past wins over an unknown business
    assert!(matches!(
        create_appointment(&mut conn, booking(9999, vec![ann], "2020-01-01", "10:00"), stamp()),
        Err(ServiceError::InvalidInput(_))
    ));

    assert!(matches!(
        create_appointment(&mut conn, booking(9999, vec![ann], "2030-01-01", "10:00"), stamp()),
        Err(ServiceError::NotFound(_))
    ));

    let missing = ann + 500;
    match create_appointment(
        &mut conn,
        booking(shop.id, vec![ann, missing], "2030-01-01", "10:00"),
        stamp(),
    ) {
        Err(ServiceError::InvalidInput(msg)) => assert!(msg.contains(&missing.to_string())),
        other => panic!("unexpected result: {:?}", other.map(|d| d.appointment.id)),
    }

    // a provider id is not a customer
    assert!(matches!(
        create_appointment(&mut conn, booking(shop.id, vec![owner], "2030-01-01", "10:00"), stamp()),
        Err(ServiceError::InvalidInput(_))
    ));

    assert_eq!(active_count(&mut conn, shop.id, "2030-01-01", "10:00"), 0);
}

#[test]
fn group_bookings_link_every_customer() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();
    let owner = provider(&mut conn, "owner@example.com");
    let shop = business(&mut conn, owner, "Escape Room");
    let ann = customer(&mut conn, "ann@example.com");
    let bob = customer(&mut conn, "bob@example.com");

    let created = create_appointment(
        &mut conn,
        booking(shop.id, vec![ann, bob], "2030-03-01", "18:00"),
        stamp(),
    )
    .unwrap();
    let ids: Vec<i32> = created.participants.iter().map(|p| p.customer_id).collect();
    assert_eq!(ids, vec![ann, bob]);
    assert_eq!(created.participants[0].full_name, "User ann@example.com");

    // listing the same customer twice rolls the whole booking back
    let dup = create_appointment(
        &mut conn,
        booking(shop.id, vec![ann, ann], "2030-03-01", "19:00"),
        stamp(),
    );
    assert!(matches!(dup, Err(ServiceError::InvalidInput(_))));
    assert_eq!(active_count(&mut conn, shop.id, "2030-03-01", "19:00"), 0);
}

#[test]
fn constraint_violation_is_reported_as_a_conflict() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();
    let owner = provider(&mut conn, "owner@example.com");
    let shop = business(&mut conn, owner, "Clinic");
    let ann = customer(&mut conn, "ann@example.com");
    let bob = customer(&mut conn, "bob@example.com");

    insert_appointment(&mut conn, &booking(shop.id, vec![ann], "2030-05-05", "09:00"), stamp())
        .unwrap();
    // skips the availability check, as a racing writer effectively does
    let res = insert_appointment(
        &mut conn,
        &booking(shop.id, vec![bob], "2030-05-05", "09:00"),
        stamp(),
    );
    assert!(matches!(res, Err(ServiceError::SlotConflict(_))));
    assert_eq!(active_count(&mut conn, shop.id, "2030-05-05", "09:00"), 1);
}

#[test]
fn concurrent_bookings_for_one_slot_have_one_winner() {
    const BOOKERS: usize = 8;

    let (_dir, pool) = test_pool();
    let (business_id, customers) = {
        let mut conn = pool.get().unwrap();
        let owner = provider(&mut conn, "owner@example.com");
        let shop = business(&mut conn, owner, "Popular");
        let customers: Vec<i32> = (0..BOOKERS)
            .map(|i| customer(&mut conn, &format!("c{}@example.com", i)))
            .collect();
        (shop.id, customers)
    };

    let barrier = Arc::new(Barrier::new(BOOKERS));
    let handles: Vec<_> = customers
        .into_iter()
        .map(|customer_id| {
            let pool = pool.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut conn = pool.get().unwrap();
                barrier.wait();
                create_appointment(
                    &mut conn,
                    booking(business_id, vec![customer_id], "2030-06-01", "12:00"),
                    stamp(),
                )
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(ServiceError::SlotConflict(_))))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(conflicts, BOOKERS - 1);

    let mut conn = pool.get().unwrap();
    assert_eq!(active_count(&mut conn, business_id, "2030-06-01", "12:00"), 1);
}

#[test]
fn cancelling_frees_the_slot_and_keeps_history() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();
    let owner = provider(&mut conn, "owner@example.com");
    let shop = business(&mut conn, owner, "Barber");
    let ann = customer(&mut conn, "ann@example.com");
    let bob = customer(&mut conn, "bob@example.com");

    let first = create_appointment(
        &mut conn,
        booking(shop.id, vec![ann], "2030-01-01", "10:00"),
        stamp(),
    )
    .unwrap();
    let id = first.appointment.id;

    let ann_caller = caller(&mut conn, ann);
    let cancelled = cancel(&mut conn, &ann_caller, id, stamp()).unwrap();
    assert_eq!(cancelled.appointment.status, AppointmentStatus::Cancelled);
    assert!(is_slot_available(&mut conn, shop.id, date("2030-01-01"), time("10:00")).unwrap());

    let rebooked = create_appointment(
        &mut conn,
        booking(shop.id, vec![bob], "2030-01-01", "10:00"),
        stamp(),
    )
    .unwrap();
    assert_ne!(rebooked.appointment.id, id);
    assert!(!check_slot(&mut conn, shop.id, date("2030-01-01"), time("10:00")).unwrap());

    // the cancelled row is still there with its participant
    let old = get_appointment(&mut conn, id).unwrap();
    assert_eq!(old.appointment.status, AppointmentStatus::Cancelled);
    assert_eq!(old.participants.len(), 1);
    assert_eq!(old.participants[0].customer_id, ann);

    match cancel(&mut conn, &ann_caller, id, stamp()) {
        Err(ServiceError::InvalidInput(msg)) => assert!(msg.contains("already cancelled")),
        other => panic!("unexpected result: {:?}", other.map(|d| d.appointment.status)),
    }
    assert!(matches!(
        cancel_by_provider(&mut conn, owner, id, stamp()),
        Err(ServiceError::InvalidInput(_))
    ));
    assert_eq!(active_count(&mut conn, shop.id, "2030-01-01", "10:00"), 1);
}

#[test]
fn only_participants_and_owners_may_cancel() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();
    let owner = provider(&mut conn, "owner@example.com");
    let rival = provider(&mut conn, "rival@example.com");
    let shop = business(&mut conn, owner, "Barber");
    let ann = customer(&mut conn, "ann@example.com");
    let eve = customer(&mut conn, "eve@example.com");

    let id = create_appointment(
        &mut conn,
        booking(shop.id, vec![ann], "2030-01-02", "11:00"),
        stamp(),
    )
    .unwrap()
    .appointment
    .id;

    assert!(matches!(
        cancel_by_customer(&mut conn, eve, id, stamp()),
        Err(ServiceError::Unauthorized(_))
    ));
    assert!(matches!(
        cancel_by_provider(&mut conn, rival, id, stamp()),
        Err(ServiceError::Unauthorized(_))
    ));
    assert!(matches!(
        cancel_by_customer(&mut conn, ann, id + 100, stamp()),
        Err(ServiceError::NotFound(_))
    ));
    assert!(get_appointment(&mut conn, id).unwrap().appointment.status.is_active());

    let owner_caller = caller(&mut conn, owner);
    let by_owner = cancel(&mut conn, &owner_caller, id, stamp()).unwrap();
    assert_eq!(by_owner.appointment.status, AppointmentStatus::Cancelled);
}

#[test]
fn views_are_restricted_to_the_parties() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();
    let owner = provider(&mut conn, "owner@example.com");
    let rival = provider(&mut conn, "rival@example.com");
    let shop = business(&mut conn, owner, "Barber");
    let ann = customer(&mut conn, "ann@example.com");
    let eve = customer(&mut conn, "eve@example.com");
    let id = create_appointment(
        &mut conn,
        booking(shop.id, vec![ann], "2030-01-02", "11:00"),
        stamp(),
    )
    .unwrap()
    .appointment
    .id;

    assert!(get_appointment_for_customer(&mut conn, ann, id).is_ok());
    assert!(matches!(
        get_appointment_for_customer(&mut conn, eve, id),
        Err(ServiceError::Unauthorized(_))
    ));
    assert!(get_appointment_for_provider(&mut conn, owner, id).is_ok());
    assert!(matches!(
        get_appointment_for_provider(&mut conn, rival, id),
        Err(ServiceError::Unauthorized(_))
    ));
    assert!(matches!(
        get_appointment(&mut conn, id + 1),
        Err(ServiceError::NotFound(_))
    ));
}

#[test]
fn notes_are_the_only_editable_field() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();
    let owner = provider(&mut conn, "owner@example.com");
    let rival = provider(&mut conn, "rival@example.com");
    let shop = business(&mut conn, owner, "Barber");
    let ann = customer(&mut conn, "ann@example.com");
    let eve = customer(&mut conn, "eve@example.com");
    let created = create_appointment(
        &mut conn,
        booking(shop.id, vec![ann], "2030-01-02", "11:00"),
        stamp(),
    )
    .unwrap();
    let id = created.appointment.id;

    let later = stamp() + chrono::Duration::minutes(5);
    let ann_caller = caller(&mut conn, ann);
    let updated = update_notes(
        &mut conn,
        &ann_caller,
        id,
        "Beard trim too".to_string(),
        later,
    )
    .unwrap();
    assert_eq!(updated.appointment.notes, "Beard trim too");
    assert_eq!(updated.appointment.updated_at, later);
    assert_eq!(updated.appointment.starts_at(), created.appointment.starts_at());

    let owner_caller = caller(&mut conn, owner);
    update_notes(&mut conn, &owner_caller, id, "Confirmed".to_string(), later).unwrap();

    for outsider in [eve, rival] {
        let outsider = caller(&mut conn, outsider);
        assert!(matches!(
            update_notes(&mut conn, &outsider, id, "hi".to_string(), later),
            Err(ServiceError::Unauthorized(_))
        ));
    }
    assert_eq!(get_appointment(&mut conn, id).unwrap().appointment.notes, "Confirmed");
}

#[test]
fn listings_are_ordered_and_filtered() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();
    let owner = provider(&mut conn, "owner@example.com");
    let other = provider(&mut conn, "other@example.com");
    let cuts = business(&mut conn, owner, "Cuts");
    let nails = business(&mut conn, owner, "Nails");
    let elsewhere = business(&mut conn, other, "Elsewhere");
    let ann = customer(&mut conn, "ann@example.com");
    let bob = customer(&mut conn, "bob@example.com");

    let make = |conn: &mut SqliteConnection, b: i32, who: i32, day: &str, at: &str| {
        create_appointment(conn, booking(b, vec![who], day, at), stamp())
            .unwrap()
            .appointment
            .id
    };
    let late = make(&mut conn, cuts.id, ann, "2030-01-03", "15:00");
    let early = make(&mut conn, cuts.id, bob, "2030-01-03", "09:00");
    let nails_id = make(&mut conn, nails.id, ann, "2030-01-01", "12:00");
    let away = make(&mut conn, elsewhere.id, ann, "2030-01-02", "12:00");
    cancel_by_customer(&mut conn, bob, early, stamp()).unwrap();

    let ids = |list: Vec<AppointmentDetails>| -> Vec<i32> {
        list.iter().map(|d| d.appointment.id).collect()
    };
    let all = AppointmentFilter::default();

    assert_eq!(
        ids(appointments_by_business(&mut conn, cuts.id, &all).unwrap()),
        vec![early, late]
    );
    assert_eq!(
        ids(appointments_by_customer(&mut conn, ann, &all).unwrap()),
        vec![nails_id, away, late]
    );
    assert_eq!(
        ids(appointments_by_provider(&mut conn, owner, &all).unwrap()),
        vec![nails_id, early, late]
    );

    let active = AppointmentFilter {
        status: Some(AppointmentStatus::Active),
        ..Default::default()
    };
    assert_eq!(
        ids(appointments_by_business(&mut conn, cuts.id, &active).unwrap()),
        vec![late]
    );

    let first_two_days = AppointmentFilter {
        end_date: Some(date("2030-01-02")),
        ..Default::default()
    };
    assert_eq!(
        ids(appointments_by_customer(&mut conn, ann, &first_two_days).unwrap()),
        vec![nails_id, away]
    );
    let from_third = AppointmentFilter {
        start_date: Some(date("2030-01-03")),
        end_date: Some(date("2030-01-03")),
        ..Default::default()
    };
    assert_eq!(
        ids(provider_appointments(&mut conn, owner, None, &from_third).unwrap()),
        vec![early, late]
    );

    assert_eq!(
        ids(provider_appointments(&mut conn, owner, Some(nails.id), &all).unwrap()),
        vec![nails_id]
    );
    assert!(matches!(
        provider_appointments(&mut conn, owner, Some(elsewhere.id), &all),
        Err(ServiceError::Unauthorized(_))
    ));
    assert!(matches!(
        appointments_by_business(&mut conn, 9999, &all),
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        check_slot(&mut conn, 9999, date("2030-01-01"), time("10:00")),
        Err(ServiceError::NotFound(_))
    ));
}

#[test]
fn grouping_follows_the_clock_without_writes() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();
    let owner = provider(&mut conn, "owner@example.com");
    let shop = business(&mut conn, owner, "Barber");
    let ann = customer(&mut conn, "ann@example.com");

    let soon = create_appointment(
        &mut conn,
        booking(shop.id, vec![ann], "2030-01-01", "09:00"),
        stamp(),
    )
    .unwrap()
    .appointment
    .id;
    let later = create_appointment(
        &mut conn,
        booking(shop.id, vec![ann], "2030-02-01", "09:00"),
        stamp(),
    )
    .unwrap()
    .appointment
    .id;
    let dropped = create_appointment(
        &mut conn,
        booking(shop.id, vec![ann], "2030-03-01", "09:00"),
        stamp(),
    )
    .unwrap()
    .appointment
    .id;
    cancel_by_customer(&mut conn, ann, dropped, stamp()).unwrap();

    let ids = |list: &[AppointmentDetails]| -> Vec<i32> {
        list.iter().map(|d| d.appointment.id).collect()
    };

    let now = grouped_for_customer(&mut conn, ann, stamp()).unwrap();
    assert_eq!(ids(&now.upcoming), vec![soon, later]);
    assert_eq!(ids(&now.past), vec![dropped]);

    let a_month_on = "2030-01-15T00:00:00".parse().unwrap();
    let then = grouped_for_customer(&mut conn, ann, a_month_on).unwrap();
    assert_eq!(ids(&then.upcoming), vec![later]);
    assert_eq!(ids(&then.past), vec![soon, dropped]);

    // both halves together are always the full set
    let everything = appointments_by_customer(&mut conn, ann, &AppointmentFilter::default()).unwrap();
    for instant in [stamp(), a_month_on, "2031-01-01T00:00:00".parse().unwrap()] {
        let grouped = partition(everything.clone(), instant);
        assert_eq!(grouped.upcoming.len() + grouped.past.len(), everything.len());
        assert!(grouped
            .upcoming
            .iter()
            .all(|u| !grouped.past.iter().any(|p| p.appointment.id == u.appointment.id)));
    }
}
