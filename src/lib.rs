pub mod config;
pub mod error;
pub mod grok;
pub mod mockup;
pub mod models;
pub mod orders;
pub mod prompt;
pub mod provider;
pub mod replicate;
pub mod routes;
pub mod wallet;
