use std::sync::Arc;

use roster_lib::auth::password::PasswordHasher;
use roster_lib::auth::register::{
    RegisterFlow, NAME_BLANK, NIM_BLANK, PASSWORD_BLANK, REGISTERED, REGISTER_FAILED,
};
use roster_lib::event::UiEvent;
use roster_repo::user_repo::{User, UserRepo};
use rstest::rstest;
use tracing::instrument;

use utils::mock::{FailingUserRepo, GatedUserRepo};
use utils::{hasher, repository, store, test_name, test_nim, tracing_setup};

mod utils;

fn fill(flow: &RegisterFlow, nim: &str, name: &str, password: &str) {
    flow.on_nim_changed(nim);
    flow.on_name_changed(name);
    flow.on_password_changed(password);
}

#[rstest]
#[case::all_blank("", "", "", true, true, true)]
#[case::nim_blank("", "Alice", "secret1", true, false, false)]
#[case::name_blank("001", "", "secret1", false, true, false)]
#[case::password_blank("001", "Alice", "", false, false, true)]
#[case::whitespace("   ", "Alice", "\t", true, false, true)]
#[actix_rt::test]
async fn test_blank_fields(
    _tracing_setup: &(),
    store: Arc<dyn UserRepo>,
    hasher: Arc<dyn PasswordHasher>,
    #[case] nim: &str,
    #[case] name: &str,
    #[case] password: &str,
    #[case] nim_blank: bool,
    #[case] name_blank: bool,
    #[case] password_blank: bool,
) {
    let flow = RegisterFlow::new(repository(store.clone()), hasher);
    let mut events = flow.events();
    fill(&flow, nim, name, password);

    flow.on_register_clicked().await;

    let state = flow.state().borrow().clone();
    assert_eq!(nim_blank.then(|| NIM_BLANK.to_owned()), state.nim_error);
    assert_eq!(name_blank.then(|| NAME_BLANK.to_owned()), state.name_error);
    assert_eq!(
        password_blank.then(|| PASSWORD_BLANK.to_owned()),
        state.password_error
    );
    assert!(!state.is_loading);
    assert!(events.drain().is_empty());
    assert!(store.get_all_users().await.unwrap().is_empty());
}

#[instrument(skip(store, hasher))]
#[rstest]
#[actix_rt::test]
async fn test_field_change_clears_its_error(
    _tracing_setup: &(),
    store: Arc<dyn UserRepo>,
    hasher: Arc<dyn PasswordHasher>,
) {
    let flow = RegisterFlow::new(repository(store), hasher);
    flow.on_register_clicked().await;

    flow.on_name_changed("Alice");

    let state = flow.state().borrow().clone();
    assert_eq!(Some(NIM_BLANK.to_owned()), state.nim_error);
    assert_eq!(None, state.name_error);
    assert_eq!(Some(PASSWORD_BLANK.to_owned()), state.password_error);
    assert_eq!("Alice", state.name);
}

#[instrument(skip(store, hasher))]
#[rstest]
#[actix_rt::test]
async fn test_register(
    _tracing_setup: &(),
    store: Arc<dyn UserRepo>,
    hasher: Arc<dyn PasswordHasher>,
) {
    let flow = RegisterFlow::new(repository(store.clone()), hasher.clone());
    let mut events = flow.events();
    let nim = test_nim();
    let name = test_name();
    fill(&flow, &nim, &name, "secret1");

    flow.on_register_clicked().await;

    assert_eq!(
        vec![
            UiEvent::ShowMessage(REGISTERED.to_owned()),
            UiEvent::NavigationSuccess
        ],
        events.drain()
    );
    assert!(!flow.state().borrow().is_loading);

    let stored = store.get_user(&nim).await.unwrap().unwrap();
    assert_eq!(nim, stored.nim);
    assert_eq!(name, stored.name);
    assert_ne!("secret1", stored.password_hash);
    assert!(hasher.verify("secret1", &stored.password_hash));
}

#[instrument(skip(store, hasher))]
#[rstest]
#[actix_rt::test]
async fn test_register_existing_nim_replaces(
    _tracing_setup: &(),
    store: Arc<dyn UserRepo>,
    hasher: Arc<dyn PasswordHasher>,
) {
    let nim = test_nim();
    store
        .insert_user(User::new(
            nim.clone(),
            "Old Name".to_owned(),
            "old hash".to_owned(),
        ))
        .await
        .unwrap();

    let flow = RegisterFlow::new(repository(store.clone()), hasher.clone());
    fill(&flow, &nim, "New Name", "secret2");
    flow.on_register_clicked().await;

    let users = store.get_all_users().await.unwrap();
    assert_eq!(1, users.len());
    assert_eq!("New Name", users[0].name);
    assert!(hasher.verify("secret2", &users[0].password_hash));
}

#[instrument(skip(hasher))]
#[rstest]
#[actix_rt::test]
async fn test_store_failure(_tracing_setup: &(), hasher: Arc<dyn PasswordHasher>) {
    let flow = RegisterFlow::new(repository(Arc::new(FailingUserRepo::new())), hasher);
    let mut events = flow.events();
    fill(&flow, "001", "Alice", "secret1");

    flow.on_register_clicked().await;

    assert_eq!(
        vec![UiEvent::ShowMessage(REGISTER_FAILED.to_owned())],
        events.drain()
    );
    assert!(!flow.state().borrow().is_loading);
}

#[instrument(skip(store, hasher))]
#[rstest]
#[actix_rt::test]
async fn test_submission_in_flight_is_ignored(
    _tracing_setup: &(),
    store: Arc<dyn UserRepo>,
    hasher: Arc<dyn PasswordHasher>,
) {
    let gated = Arc::new(GatedUserRepo::new(store.clone()));
    let flow = RegisterFlow::new(repository(gated.clone()), hasher);
    let mut events = flow.events();
    fill(&flow, "001", "Alice", "secret1");
    let state = flow.state();

    let first = flow.on_register_clicked();
    let second = async {
        while !state.borrow().is_loading {
            tokio::task::yield_now().await;
        }
        flow.on_register_clicked().await;
        gated.open();
    };
    futures::join!(first, second);

    assert_eq!(1, gated.inserts());
    assert_eq!(
        vec![
            UiEvent::ShowMessage(REGISTERED.to_owned()),
            UiEvent::NavigationSuccess
        ],
        events.drain()
    );
    assert!(!flow.state().borrow().is_loading);
    assert!(store.get_user("001").await.unwrap().is_some());
}

#[rstest]
fn test_toggle_password_visibility(store: Arc<dyn UserRepo>, hasher: Arc<dyn PasswordHasher>) {
    let flow = RegisterFlow::new(repository(store), hasher);

    flow.on_toggle_password_visibility();
    assert!(flow.state().borrow().password_visible);

    flow.on_toggle_password_visibility();
    assert!(!flow.state().borrow().password_visible);
}
