//! Lead Capture API Library
//!
//! Server side of the marketing site's lead form: validates the submission,
//! verifies the Cloudflare Turnstile token, syncs the contact to Klaviyo on a
//! best-effort basis and stores the submission in Postgres.
//!
//! # Modules
//!
//! - `api`: HTTP surface.
//! - `core`: Submission pipeline, validation and models.
//! - `integrations`: Turnstile and Klaviyo clients.
//! - `app`: Router and middleware.
//! - `circuit_breaker`: Circuit breaker guarding CRM calls.
//! - `config`: Configuration management.
//! - `crm_sync`: Best-effort CRM sync and its outcome type.
//! - `db`: Database connection and schema bootstrap.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `klaviyo`: Klaviyo API client.
//! - `models`: Form, submission and response models.
//! - `phone`: North American phone normalization.
//! - `submission`: Submission pipeline orchestration.
//! - `submission_store`: Submission persistence and id generation.
//! - `turnstile`: Turnstile verification client.
//! - `validation`: Lead form validation.

pub mod api;
pub mod core;
pub mod integrations;

pub mod app;
pub mod circuit_breaker;
pub mod config;
pub mod crm_sync;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod klaviyo;
pub mod models;
pub mod phone;
pub mod submission;
pub mod submission_store;
pub mod turnstile;
pub mod validation;
