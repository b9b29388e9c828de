//! IoT data marketplace service
//!
//! Storefront backend: session handling on top of a hosted auth service, the
//! listing catalog, wallet checkout and purchase history.

// The OpenAPI document is one large `json!` literal
#![recursion_limit = "256"]

pub mod app_state;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod http;
pub mod infra;
pub mod navigation;
pub mod openapi;
pub mod purchase;
pub mod repository;
pub mod session;
pub mod telemetry;
pub mod wallet;
