use medi_data::{AccountStore, AuthError};

#[test]
fn register_then_login() {
    let tmp = tempfile::tempdir().expect("tmpdir");
    let store = AccountStore::open(tmp.path()).expect("store");

    let ann = store
        .register("Ann", "ann@example.org", "s3cret", "s3cret")
        .expect("register ann");
    let bob = store
        .register("Bob", "bob@example.org", "hunter2", "hunter2")
        .expect("register bob");
    assert_eq!(ann.id, 1);
    assert_eq!(bob.id, 2);

    let logged = store.login("ann@example.org", "s3cret").expect("login");
    assert_eq!(logged, ann);

    let err = store.login("ann@example.org", "wrong").unwrap_err();
    assert_eq!(err.to_string(), "Invalid email or password.");
}

#[test]
fn duplicate_email_is_rejected() {
    let tmp = tempfile::tempdir().expect("tmpdir");
    let store = AccountStore::open(tmp.path()).expect("store");
    store
        .register("Ann", "ann@example.org", "a", "a")
        .expect("first");
    let err = store
        .register("Other Ann", "ann@example.org", "b", "b")
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken));
}

#[test]
fn accounts_survive_reopening() {
    let tmp = tempfile::tempdir().expect("tmpdir");
    {
        let store = AccountStore::open(tmp.path()).expect("store");
        store.register("Ann", "ann@example.org", "a", "a").expect("register");
    }
    let store = AccountStore::open(tmp.path()).expect("reopen");
    assert!(store.find_by_email("ann@example.org").unwrap().is_some());
    assert!(matches!(
        store.login("", "a"),
        Err(AuthError::MissingCredentials)
    ));
}
