//! Constants (primary environment variables/secrets) used across the application.
pub mod api;
pub mod auth;
pub mod db;
pub mod email;
pub mod redis;
mod secrets;
pub mod stripe;
