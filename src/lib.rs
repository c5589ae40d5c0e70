pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod policy;
pub mod resource;
pub mod validation;
pub mod web;

pub use config::Config;
pub use error::{Error, Result};
