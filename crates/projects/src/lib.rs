//! Credentialed client for the downstream project-management REST API.
//!
//! Owns the expiring OAuth access token and all request plumbing, and
//! exposes resource-oriented operations for projects, tasks, task lists,
//! and time logs. Callers never see the token lifecycle: every request
//! path ensures a credential that is valid past a safety margin, and a
//! failed refresh surfaces as `ProjectsError::Auth` for that call only.

pub mod client;
pub mod token;

pub use client::ProjectsClient;
pub use token::AccessCredential;
