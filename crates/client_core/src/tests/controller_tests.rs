use super::*;
use std::{collections::VecDeque, sync::Mutex as StdMutex};

use async_trait::async_trait;
use shared::{domain::Activity, error::ErrorCode};
use tokio::time::Instant;

#[derive(Default)]
struct ScriptedApi {
    lists: StdMutex<VecDeque<Result<ActivitySnapshot, ClientError>>>,
    mutations: StdMutex<VecDeque<Result<MessageResponse, ClientError>>>,
    calls: StdMutex<Vec<String>>,
}

impl ScriptedApi {
    fn with_list(self, outcome: Result<ActivitySnapshot, ClientError>) -> Self {
        self.lists.lock().expect("lists").push_back(outcome);
        self
    }

    fn with_mutation(self, outcome: Result<MessageResponse, ClientError>) -> Self {
        self.mutations.lock().expect("mutations").push_back(outcome);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls").clone()
    }

    fn next_mutation(&self, call: String) -> Result<MessageResponse, ClientError> {
        self.calls.lock().expect("calls").push(call);
        self.mutations
            .lock()
            .expect("mutations")
            .pop_front()
            .expect("unexpected mutation call")
    }
}

#[async_trait]
impl RosterApi for ScriptedApi {
    async fn list_activities(&self) -> Result<ActivitySnapshot, ClientError> {
        self.calls.lock().expect("calls").push("list".to_string());
        self.lists
            .lock()
            .expect("lists")
            .pop_front()
            .expect("unexpected list call")
    }

    async fn signup(&self, activity: &str, email: &str) -> Result<MessageResponse, ClientError> {
        self.next_mutation(format!("signup {activity} {email}"))
    }

    async fn unregister(
        &self,
        activity: &str,
        email: &str,
    ) -> Result<MessageResponse, ClientError> {
        self.next_mutation(format!("unregister {activity} {email}"))
    }
}

fn chess_club(participants: &[&str]) -> ActivitySnapshot {
    let mut activity = Activity::new("Learn strategies", "Fridays", 2);
    activity.participants = participants.iter().map(|p| p.to_string()).collect();
    let mut snapshot = ActivitySnapshot::new();
    snapshot.insert("Chess Club".to_string(), activity);
    snapshot
}

fn rejected(code: ErrorCode, detail: &str) -> ClientError {
    ClientError::Rejected {
        status: code.http_status(),
        code: Some(code),
        detail: Some(detail.to_string()),
    }
}

fn bare_failure() -> ClientError {
    ClientError::Rejected {
        status: 502,
        code: None,
        detail: None,
    }
}

fn error_banner(text: &str) -> Option<Banner> {
    Some(Banner {
        kind: BannerKind::Error,
        text: text.to_string(),
    })
}

#[tokio::test]
async fn starts_loading_with_empty_form() {
    let controller = RosterController::new(ScriptedApi::default());
    assert_eq!(controller.view().await, ViewState::Loading);
    assert_eq!(controller.banner().await, None);
    assert_eq!(controller.form().await, SignupForm::default());
}

#[tokio::test]
async fn refresh_moves_to_ready_with_server_snapshot() {
    let api = ScriptedApi::default().with_list(Ok(chess_club(&["a@x.edu"])));
    let controller = RosterController::new(api);

    controller.refresh().await.expect("refresh");

    assert_eq!(
        controller.view().await,
        ViewState::Ready(chess_club(&["a@x.edu"]))
    );
    assert_eq!(controller.api().calls(), vec!["list"]);
}

#[tokio::test]
async fn failed_refresh_drops_previous_snapshot() {
    let api = ScriptedApi::default()
        .with_list(Ok(chess_club(&[])))
        .with_list(Err(bare_failure()));
    let controller = RosterController::new(api);

    controller.refresh().await.expect("first load");
    assert!(controller.refresh().await.is_err());

    assert_eq!(
        controller.view().await,
        ViewState::Error(LOAD_FAILED.to_string())
    );
    assert_eq!(controller.banner().await, error_banner(LOAD_FAILED));
}

#[tokio::test]
async fn successful_signup_shows_message_and_reloads() {
    let api = ScriptedApi::default()
        .with_mutation(Ok(MessageResponse::signed_up("a@x.edu", "Chess Club")))
        .with_list(Ok(chess_club(&["a@x.edu"])));
    let controller = RosterController::new(api);

    let response = controller
        .signup("Chess Club", "a@x.edu")
        .await
        .expect("signup");

    assert_eq!(response.message, "Signed up a@x.edu for Chess Club");
    assert_eq!(
        controller.banner().await,
        Some(Banner {
            kind: BannerKind::Success,
            text: "Signed up a@x.edu for Chess Club".to_string(),
        })
    );
    assert_eq!(
        controller.view().await,
        ViewState::Ready(chess_club(&["a@x.edu"]))
    );
    assert_eq!(
        controller.api().calls(),
        vec!["signup Chess Club a@x.edu", "list"]
    );
}

#[tokio::test]
async fn rejected_signup_shows_server_detail_without_reload() {
    let api = ScriptedApi::default()
        .with_list(Ok(chess_club(&["a@x.edu", "b@x.edu"])))
        .with_mutation(Err(rejected(ErrorCode::Full, "Activity is full")));
    let controller = RosterController::new(api);
    controller.refresh().await.expect("refresh");

    let err = controller
        .signup("Chess Club", "c@x.edu")
        .await
        .expect_err("full");

    assert_eq!(err.code(), Some(ErrorCode::Full));
    assert_eq!(controller.banner().await, error_banner("Activity is full"));
    assert_eq!(
        controller.view().await,
        ViewState::Ready(chess_club(&["a@x.edu", "b@x.edu"]))
    );
    assert_eq!(
        controller.api().calls(),
        vec!["list", "signup Chess Club c@x.edu"]
    );
}

#[tokio::test]
async fn unregister_reloads_after_success() {
    let api = ScriptedApi::default()
        .with_mutation(Ok(MessageResponse::unregistered("a@x.edu", "Chess Club")))
        .with_list(Ok(chess_club(&["b@x.edu"])));
    let controller = RosterController::new(api);

    controller
        .unregister("Chess Club", "a@x.edu")
        .await
        .expect("unregister");

    assert_eq!(
        controller.banner().await.map(|banner| banner.text),
        Some("Unregistered a@x.edu from Chess Club".to_string())
    );
    assert_eq!(
        controller.view().await,
        ViewState::Ready(chess_club(&["b@x.edu"]))
    );
}

#[tokio::test]
async fn failures_without_detail_use_fallback_messages() {
    let api = ScriptedApi::default()
        .with_mutation(Err(bare_failure()))
        .with_mutation(Err(bare_failure()));
    let controller = RosterController::new(api);

    assert!(controller.signup("Chess Club", "a@x.edu").await.is_err());
    assert_eq!(controller.banner().await, error_banner(SIGNUP_FAILED));

    assert!(controller.unregister("Chess Club", "a@x.edu").await.is_err());
    assert_eq!(controller.banner().await, error_banner(UNREGISTER_FAILED));
}

#[tokio::test]
async fn submit_signup_ignores_incomplete_form() {
    let controller = RosterController::new(ScriptedApi::default());

    controller.set_email("a@x.edu").await;
    assert!(controller.submit_signup().await.is_none());

    controller.set_email("").await;
    controller.select_activity("Chess Club").await;
    assert!(controller.submit_signup().await.is_none());

    assert!(controller.api().calls().is_empty());
    assert_eq!(controller.form().await.activity, "Chess Club");
}

#[tokio::test]
async fn submit_signup_clears_form_after_success() {
    let api = ScriptedApi::default()
        .with_mutation(Ok(MessageResponse::signed_up("a@x.edu", "Chess Club")))
        .with_list(Ok(chess_club(&["a@x.edu"])));
    let controller = RosterController::new(api);
    controller.select_activity("Chess Club").await;
    controller.set_email("a@x.edu").await;

    let outcome = controller.submit_signup().await.expect("submitted");

    assert!(outcome.is_ok());
    assert_eq!(controller.form().await, SignupForm::default());
}

#[tokio::test]
async fn submit_signup_clears_form_after_failure_too() {
    let api = ScriptedApi::default().with_mutation(Err(rejected(
        ErrorCode::AlreadyRegistered,
        "Student already signed up for this activity",
    )));
    let controller = RosterController::new(api);
    controller.select_activity("Chess Club").await;
    controller.set_email("a@x.edu").await;

    let outcome = controller.submit_signup().await.expect("submitted");

    assert!(outcome.is_err());
    assert_eq!(controller.form().await, SignupForm::default());
    assert_eq!(
        controller.banner().await,
        error_banner("Student already signed up for this activity")
    );
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn banner_clears_after_window() {
    let api = ScriptedApi::default().with_mutation(Err(bare_failure()));
    let controller = RosterController::new(api);

    let _ = controller.signup("Chess Club", "a@x.edu").await;
    let shown_at = Instant::now();

    tokio::time::sleep_until(shown_at + BANNER_TTL - Duration::from_millis(1)).await;
    assert_eq!(controller.banner().await, error_banner(SIGNUP_FAILED));

    tokio::time::sleep_until(shown_at + BANNER_TTL + Duration::from_millis(1)).await;
    assert_eq!(controller.banner().await, None);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn new_banner_restarts_window() {
    let api = ScriptedApi::default()
        .with_mutation(Err(rejected(ErrorCode::Full, "Activity is full")))
        .with_mutation(Err(rejected(ErrorCode::NotFound, "Activity not found")));
    let controller = RosterController::with_banner_ttl(api, Duration::from_secs(5));

    let _ = controller.signup("Chess Club", "a@x.edu").await;
    tokio::time::sleep(Duration::from_secs(3)).await;
    let _ = controller.signup("Chess Club", "b@x.edu").await;
    let replaced_at = Instant::now();

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(controller.banner().await, error_banner("Activity not found"));

    tokio::time::sleep_until(replaced_at + Duration::from_secs(5) + Duration::from_millis(1))
        .await;
    assert_eq!(controller.banner().await, None);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn dismissed_banner_timer_does_not_clear_successor() {
    let api = ScriptedApi::default()
        .with_mutation(Err(bare_failure()))
        .with_mutation(Err(bare_failure()));
    let controller = RosterController::with_banner_ttl(api, Duration::from_secs(2));

    let _ = controller.signup("Chess Club", "a@x.edu").await;
    controller.dismiss_banner().await;
    assert_eq!(controller.banner().await, None);

    tokio::time::sleep(Duration::from_secs(1)).await;
    let _ = controller.unregister("Chess Club", "a@x.edu").await;

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(controller.banner().await, error_banner(UNREGISTER_FAILED));
}

#[tokio::test]
async fn emits_events_for_each_transition() {
    let api = ScriptedApi::default()
        .with_mutation(Ok(MessageResponse::signed_up("a@x.edu", "Chess Club")))
        .with_list(Ok(chess_club(&["a@x.edu"])));
    let controller = RosterController::new(api);
    let mut events = controller.subscribe_events();

    controller.signup("Chess Club", "a@x.edu").await.expect("signup");

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(
        seen,
        vec![
            ControllerEvent::BannerChanged(Some(Banner {
                kind: BannerKind::Success,
                text: "Signed up a@x.edu for Chess Club".to_string(),
            })),
            ControllerEvent::ViewChanged(ViewState::Loading),
            ControllerEvent::ViewChanged(ViewState::Ready(chess_club(&["a@x.edu"]))),
        ]
    );
}
