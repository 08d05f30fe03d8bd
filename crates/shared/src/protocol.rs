use serde::{Deserialize, Serialize};

/// Success body of the signup and unregister endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn signed_up(email: &str, activity: &str) -> Self {
        Self {
            message: format!("Signed up {email} for {activity}"),
        }
    }

    pub fn unregistered(email: &str, activity: &str) -> Self {
        Self {
            message: format!("Unregistered {email} from {activity}"),
        }
    }
}

/// Query string carried by the signup and unregister endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailQuery {
    #[serde(default)]
    pub email: Option<String>,
}

pub fn activities_route() -> &'static str {
    "/api/activities"
}

pub fn signup_route() -> &'static str {
    "/api/activities/:name/signup"
}

pub fn unregister_route() -> &'static str {
    "/api/activities/:name/unregister"
}
