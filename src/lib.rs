//! Refund Engine library crate.
//!
//! This crate exposes the season refund calculation engine and the
//! reporting API around it as reusable modules.  External applications
//! may depend on the `refund_engine` crate and call
//! `engine::calculate_refund` directly or embed the API via
//! `api::build_router`.

pub mod models;
pub mod distribution;
pub mod calendar;
pub mod engine;
pub mod report;
pub mod repository;
pub mod auth;
pub mod error;
pub mod config;
pub mod api;
