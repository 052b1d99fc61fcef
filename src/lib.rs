pub mod config;
pub mod domain;
pub mod metrics;
pub mod notifications;
pub mod services;
pub mod store;
