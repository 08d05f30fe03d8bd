use std::sync::Arc;

use shared::{
    domain::ActivitySnapshot,
    error::{ApiError, ErrorCode},
    protocol::MessageResponse,
    validate,
};
use storage::{RosterStore, StoreError};
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn RosterStore>,
}

impl ApiContext {
    pub fn new(store: impl RosterStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

pub async fn list_activities(ctx: &ApiContext) -> Result<ActivitySnapshot, ApiError> {
    ctx.store.list().await.map_err(internal)
}

pub async fn signup(
    ctx: &ApiContext,
    activity_name: &str,
    email: Option<&str>,
) -> Result<MessageResponse, ApiError> {
    let activity_name = validate::activity_name(activity_name)?;
    let email = validate::email(email)?;

    match ctx.store.signup(activity_name, email).await {
        Ok(activity) => {
            info!(
                activity = activity_name,
                email,
                spots_left = activity.spots_left(),
                "participant signed up"
            );
            Ok(MessageResponse::signed_up(email, activity_name))
        }
        Err(err) => Err(rejected("signup", activity_name, email, err)),
    }
}

pub async fn unregister(
    ctx: &ApiContext,
    activity_name: &str,
    email: Option<&str>,
) -> Result<MessageResponse, ApiError> {
    let activity_name = validate::activity_name(activity_name)?;
    let email = validate::email(email)?;

    match ctx.store.unregister(activity_name, email).await {
        Ok(activity) => {
            info!(
                activity = activity_name,
                email,
                spots_left = activity.spots_left(),
                "participant unregistered"
            );
            Ok(MessageResponse::unregistered(email, activity_name))
        }
        Err(err) => Err(rejected("unregister", activity_name, email, err)),
    }
}

pub async fn health(ctx: &ApiContext) -> Result<(), ApiError> {
    ctx.store.health_check().await.map_err(internal)
}

fn rejected(operation: &'static str, activity: &str, email: &str, err: StoreError) -> ApiError {
    if let Some(kind) = err.roster() {
        warn!(operation, activity, email, reason = %kind, "roster change rejected");
        return kind.into();
    }
    internal(err)
}

fn internal(err: StoreError) -> ApiError {
    match err {
        StoreError::Roster(kind) => kind.into(),
        StoreError::Backend(err) => {
            error!(error = %format!("{err:#}"), "roster store failure");
            ApiError::new(ErrorCode::Internal, "Roster store is unavailable")
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
