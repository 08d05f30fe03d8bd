//! Client side of the activity roster: an HTTP binding of the roster API and
//! the controller that turns user intents into API calls and view state.

pub mod api;
pub mod controller;
pub mod error;

pub use api::{HttpRosterApi, RosterApi};
pub use controller::{
    Banner, BannerKind, ControllerEvent, RosterController, SignupForm, ViewState, BANNER_TTL,
};
pub use error::ClientError;

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod api_tests;
