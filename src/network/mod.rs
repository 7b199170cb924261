//! REST adapter for the reader backend
//!
//! Fetches chapter page lists and posts progress records with bearer
//! authentication and a single retry after a credential refresh.

mod auth;
mod client;
mod dto;
mod request;

pub use auth::{Credentials, StaticToken};
pub use client::ApiClient;
pub use request::{Method, Request};
