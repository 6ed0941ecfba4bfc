//! Address Completion API Library
//!
//! Accepts a free-form Chinese address, resolves it through the AMap (Gaode)
//! geocoding and POI search APIs, and returns a normalized administrative
//! address with a confidence score.
//!
//! # Modules
//!
//! - `api`: Router assembly.
//! - `core`: Core business logic.
//! - `integrations`: External service integrations.
//! - `amap_client`: AMap REST client.
//! - `amap_models`: AMap response envelopes.
//! - `completion`: Lookup pipeline with fallback.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `known_places`: Injected keyword → address map.
//! - `models`: Request, domain and response models.
//! - `normalizer`: Address normalization heuristics.

pub mod api;
pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and the binary
pub mod amap_client;
pub mod amap_models;
pub mod completion;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod known_places;
pub mod models;
pub mod normalizer;
