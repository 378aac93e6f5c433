//! Weather responder link: static nodes, configuration and the HTTP view.

mod api;
mod config;
mod link;

pub use api::{ApiError, build_router};
pub use config::LinkConfig;
pub use link::{
    Link, LinkStatus, SDK_VERSION_PATH, SET_TEXT_PATH, SetTextParams, SetTextResult,
};
