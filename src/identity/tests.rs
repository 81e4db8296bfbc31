use super::*;
use crate::database::testing::test_pool;

fn now() -> NaiveDateTime {
    "2030-01-01T08:00:00".parse().unwrap()
}

fn registration(email: &str, role: &str) -> Registration {
    Registration {
        full_name: "Grace Hopper".to_string(),
        email: email.to_string(),
        password: "s3cret-pass".to_string(),
        role: role.to_string(),
        phone_number: Some("555-0100".to_string()),
    }
}

fn caller_for(account: &Account) -> Caller {
    Caller {
        account_id: account.id,
        role: account.role,
        token: String::new(),
    }
}

#[test]
fn usernames_come_from_the_email_local_part() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();

    let first = register(&mut conn, registration("grace@navy.mil", "customer"), now()).unwrap();
    let second = register(&mut conn, registration("grace@example.com", "Provider"), now()).unwrap();
    let third = register(&mut conn, registration("grace@other.org", "CUSTOMER"), now()).unwrap();

    assert_eq!(first.username, "grace");
    assert_eq!(second.username, "grace1");
    assert_eq!(third.username, "grace2");
    assert_eq!(second.role, Role::Provider);
}

#[test]
fn registration_rejects_bad_input() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();

    let res = register(&mut conn, registration("no-at-sign", "customer"), now());
    assert!(matches!(res, Err(ServiceError::InvalidInput(_))));

    let res = register(&mut conn, registration("@example.com", "customer"), now());
    assert!(matches!(res, Err(ServiceError::InvalidInput(_))));

    let res = register(&mut conn, registration("a@example.com", "admin"), now());
    assert!(matches!(res, Err(ServiceError::InvalidInput(_))));

    let mut short = registration("b@example.com", "customer");
    short.password = "short".to_string();
    assert!(matches!(
        register(&mut conn, short, now()),
        Err(ServiceError::InvalidInput(_))
    ));

    register(&mut conn, registration("c@example.com", "customer"), now()).unwrap();
    let dup = register(&mut conn, registration("c@example.com", "provider"), now());
    match dup {
        Err(ServiceError::InvalidInput(msg)) => assert!(msg.contains("already exists")),
        _ => panic!("duplicate email must be rejected"),
    }
}

#[test]
fn registration_creates_the_matching_profile() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();

    let provider = register(&mut conn, registration("shop@example.com", "provider"), now()).unwrap();
    match get_profile(&mut conn, &caller_for(&provider)).unwrap() {
        Profile::Provider(_, profile) => {
            assert_eq!(profile.business_name, "Grace Hopper");
            assert_eq!(profile.phone_number, "555-0100");
        }
        Profile::Customer(..) => panic!("expected a provider profile"),
    }

    let customer = register(&mut conn, registration("me@example.com", "customer"), now()).unwrap();
    assert!(matches!(
        get_profile(&mut conn, &caller_for(&customer)).unwrap(),
        Profile::Customer(..)
    ));
}

#[test]
fn authentication_checks_the_password_hash() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();
    let account = register(&mut conn, registration("login@example.com", "customer"), now()).unwrap();

    let found = authenticate(&mut conn, "login@example.com", "s3cret-pass").unwrap();
    assert_eq!(found.id, account.id);

    assert!(matches!(
        authenticate(&mut conn, "login@example.com", "wrong-pass"),
        Err(ServiceError::Unauthenticated(_))
    ));
    assert!(matches!(
        authenticate(&mut conn, "nobody@example.com", "s3cret-pass"),
        Err(ServiceError::Unauthenticated(_))
    ));
}

#[test]
fn password_hashes_are_salted_argon2() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();
    let first = register(&mut conn, registration("one@example.com", "customer"), now()).unwrap();
    let second = register(&mut conn, registration("two@example.com", "customer"), now()).unwrap();

    assert!(first.password_hash.starts_with("$argon2id$"));
    assert!(!first.password_hash.contains("s3cret-pass"));
    assert_ne!(first.password_hash, second.password_hash);
    assert!(verify_password("s3cret-pass", &second.password_hash).unwrap());
    assert!(!verify_password("s3cret-pas", &second.password_hash).unwrap());
}

#[test]
fn password_change_requires_the_old_password() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();
    let account = register(&mut conn, registration("pw@example.com", "customer"), now()).unwrap();
    let caller = caller_for(&account);

    assert!(matches!(
        change_password(&mut conn, &caller, "not-it-at-all", "new-password", now()),
        Err(ServiceError::InvalidInput(_))
    ));
    change_password(&mut conn, &caller, "s3cret-pass", "new-password", now()).unwrap();
    assert!(authenticate(&mut conn, "pw@example.com", "new-password").is_ok());
    assert!(authenticate(&mut conn, "pw@example.com", "s3cret-pass").is_err());
}

#[test]
fn profile_updates_respect_role_fields() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();
    let provider = register(&mut conn, registration("p@example.com", "provider"), now()).unwrap();
    let caller = caller_for(&provider);

    let updated = update_profile(
        &mut conn,
        &caller,
        ProfileChanges {
            bio: Some("Barber since 1999".to_string()),
            address: Some("1 Main St".to_string()),
            ..Default::default()
        },
        now(),
    )
    .unwrap();
    match updated {
        Profile::Provider(_, profile) => {
            assert_eq!(profile.bio, "Barber since 1999");
            assert_eq!(profile.address, "1 Main St");
        }
        Profile::Customer(..) => panic!("expected a provider profile"),
    }

    let too_long = update_profile(
        &mut conn,
        &caller,
        ProfileChanges {
            bio: Some("x".repeat(4097)),
            ..Default::default()
        },
        now(),
    );
    assert!(matches!(too_long, Err(ServiceError::InvalidInput(_))));

    let wrong_field = update_profile(
        &mut conn,
        &caller,
        ProfileChanges {
            preferences: Some("window seat".to_string()),
            ..Default::default()
        },
        now(),
    );
    assert!(matches!(wrong_field, Err(ServiceError::InvalidInput(_))));
}

#[test]
fn role_guards_reject_the_other_role() {
    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();
    let provider = register(&mut conn, registration("p@example.com", "provider"), now()).unwrap();
    let customer = register(&mut conn, registration("c@example.com", "customer"), now()).unwrap();

    assert_eq!(
        require_provider(&mut conn, &caller_for(&provider)).unwrap(),
        provider.id
    );
    assert!(matches!(
        require_provider(&mut conn, &caller_for(&customer)),
        Err(ServiceError::Unauthorized(_))
    ));
    assert!(matches!(
        require_customer(&mut conn, &caller_for(&provider)),
        Err(ServiceError::Unauthorized(_))
    ));
}

#[test]
fn deleting_an_account_removes_its_profile_and_sessions() {
    use crate::schema::{customer_profiles, sessions};

    let (_dir, pool) = test_pool();
    let mut conn = pool.get().unwrap();
    let account = register(&mut conn, registration("bye@example.com", "customer"), now()).unwrap();
    session::issue(&mut conn, &account, now()).unwrap();

    delete_account(&mut conn, &caller_for(&account)).unwrap();

    let profiles = customer_profiles::table
        .count()
        .get_result::<i64>(&mut conn)
        .unwrap();
    let tokens = sessions::table.count().get_result::<i64>(&mut conn).unwrap();
    assert_eq!((profiles, tokens), (0, 0));
    assert!(matches!(
        get_account(&mut conn, account.id),
        Err(ServiceError::NotFound(_))
    ));
}
