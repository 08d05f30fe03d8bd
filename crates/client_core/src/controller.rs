use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use shared::{domain::ActivitySnapshot, protocol::MessageResponse};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::sleep,
};
use tracing::{info, warn};

use crate::{api::RosterApi, error::ClientError};

/// How long a feedback banner stays up before clearing itself.
pub const BANNER_TTL: Duration = Duration::from_secs(5);

pub const LOAD_FAILED: &str = "Failed to load activities. Please try again later.";
pub const SIGNUP_FAILED: &str = "Failed to sign up. Please try again.";
pub const UNREGISTER_FAILED: &str = "Failed to unregister. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Ready(ActivitySnapshot),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub activity: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    ViewChanged(ViewState),
    BannerChanged(Option<Banner>),
    FormChanged(SignupForm),
}

/// UI-facing state machine over a [`RosterApi`].
///
/// The roster snapshot is only ever replaced by a fresh `list` answer; the
/// controller never patches it locally after a mutation. A single banner is
/// shown at a time and every new banner restarts its expiry window.
pub struct RosterController<A: RosterApi + 'static> {
    api: A,
    banner_ttl: Duration,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<ControllerEvent>,
}

struct ControllerState {
    view: ViewState,
    banner: Option<Banner>,
    banner_generation: u64,
    banner_timer: Option<JoinHandle<()>>,
    form: SignupForm,
}

impl<A: RosterApi + 'static> RosterController<A> {
    pub fn new(api: A) -> Arc<Self> {
        Self::with_banner_ttl(api, BANNER_TTL)
    }

    pub fn with_banner_ttl(api: A, banner_ttl: Duration) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            banner_ttl,
            inner: Mutex::new(ControllerState {
                view: ViewState::Loading,
                banner: None,
                banner_generation: 0,
                banner_timer: None,
                form: SignupForm::default(),
            }),
            events,
        })
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn view(&self) -> ViewState {
        self.inner.lock().await.view.clone()
    }

    pub async fn banner(&self) -> Option<Banner> {
        self.inner.lock().await.banner.clone()
    }

    pub async fn form(&self) -> SignupForm {
        self.inner.lock().await.form.clone()
    }

    /// Reloads the whole roster. A failed load replaces the view with an
    /// error rather than keeping the previous snapshot on screen.
    pub async fn refresh(self: &Arc<Self>) -> Result<(), ClientError> {
        self.set_view(ViewState::Loading).await;
        match self.api.list_activities().await {
            Ok(snapshot) => {
                info!(activities = snapshot.len(), "roster loaded");
                self.set_view(ViewState::Ready(snapshot)).await;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to load activities");
                self.set_view(ViewState::Error(LOAD_FAILED.to_string())).await;
                self.show_banner(BannerKind::Error, LOAD_FAILED).await;
                Err(err)
            }
        }
    }

    pub async fn signup(
        self: &Arc<Self>,
        activity: &str,
        email: &str,
    ) -> Result<MessageResponse, ClientError> {
        let outcome = self.api.signup(activity, email).await;
        self.settle("signup", activity, email, outcome, SIGNUP_FAILED)
            .await
    }

    pub async fn unregister(
        self: &Arc<Self>,
        activity: &str,
        email: &str,
    ) -> Result<MessageResponse, ClientError> {
        let outcome = self.api.unregister(activity, email).await;
        self.settle("unregister", activity, email, outcome, UNREGISTER_FAILED)
            .await
    }

    /// Submits the signup form. Does nothing while either field is empty;
    /// otherwise the form is cleared once the call resolves, whatever its
    /// outcome.
    pub async fn submit_signup(self: &Arc<Self>) -> Option<Result<MessageResponse, ClientError>> {
        let form = self.form().await;
        if form.activity.is_empty() || form.email.is_empty() {
            return None;
        }

        let outcome = self.signup(&form.activity, &form.email).await;
        self.update_form(|form| *form = SignupForm::default()).await;
        Some(outcome)
    }

    pub async fn set_email(&self, email: impl Into<String>) {
        let email = email.into();
        self.update_form(|form| form.email = email).await;
    }

    pub async fn select_activity(&self, activity: impl Into<String>) {
        let activity = activity.into();
        self.update_form(|form| form.activity = activity).await;
    }

    pub async fn dismiss_banner(&self) {
        let mut state = self.inner.lock().await;
        state.banner_generation += 1;
        if let Some(timer) = state.banner_timer.take() {
            timer.abort();
        }
        if state.banner.take().is_some() {
            drop(state);
            let _ = self.events.send(ControllerEvent::BannerChanged(None));
        }
    }

    async fn settle(
        self: &Arc<Self>,
        action: &'static str,
        activity: &str,
        email: &str,
        outcome: Result<MessageResponse, ClientError>,
        fallback: &str,
    ) -> Result<MessageResponse, ClientError> {
        match outcome {
            Ok(response) => {
                info!(action, activity, email, "roster change confirmed");
                self.show_banner(BannerKind::Success, &response.message)
                    .await;
                // Load failures surface through the view and banner.
                let _ = self.refresh().await;
                Ok(response)
            }
            Err(err) => {
                warn!(action, activity, email, error = %err, "roster change failed");
                let text = err.detail().unwrap_or(fallback).to_string();
                self.show_banner(BannerKind::Error, &text).await;
                Err(err)
            }
        }
    }

    async fn set_view(&self, view: ViewState) {
        self.inner.lock().await.view = view.clone();
        let _ = self.events.send(ControllerEvent::ViewChanged(view));
    }

    async fn update_form(&self, edit: impl FnOnce(&mut SignupForm)) {
        let form = {
            let mut state = self.inner.lock().await;
            edit(&mut state.form);
            state.form.clone()
        };
        let _ = self.events.send(ControllerEvent::FormChanged(form));
    }

    async fn show_banner(self: &Arc<Self>, kind: BannerKind, text: &str) {
        let banner = Banner {
            kind,
            text: text.to_string(),
        };

        let mut state = self.inner.lock().await;
        state.banner_generation += 1;
        let generation = state.banner_generation;
        if let Some(timer) = state.banner_timer.take() {
            timer.abort();
        }
        state.banner = Some(banner.clone());
        state.banner_timer = Some(spawn_banner_expiry(
            Arc::downgrade(self),
            generation,
            self.banner_ttl,
        ));
        drop(state);

        let _ = self.events.send(ControllerEvent::BannerChanged(Some(banner)));
    }

    async fn expire_banner(&self, generation: u64) {
        let mut state = self.inner.lock().await;
        if state.banner_generation != generation {
            return;
        }
        state.banner_timer = None;
        if state.banner.take().is_some() {
            drop(state);
            let _ = self.events.send(ControllerEvent::BannerChanged(None));
        }
    }
}

fn spawn_banner_expiry<A: RosterApi + 'static>(
    controller: Weak<RosterController<A>>,
    generation: u64,
    ttl: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        sleep(ttl).await;
        if let Some(controller) = controller.upgrade() {
            controller.expire_banner(generation).await;
        }
    })
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
