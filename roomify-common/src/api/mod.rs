//! API module for shared HTTP wire types
//!
//! Request and response bodies exchanged between the Roomify worker and
//! its clients. Pure types only; no HTTP framework dependencies.

pub mod types;

pub use types::{
    ErrorResponse, GetProjectResponse, ListProjectsResponse, SaveProjectRequest,
    SaveProjectResponse, UserInfo,
};
