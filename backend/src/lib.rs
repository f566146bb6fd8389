pub mod access;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod lms;
pub mod models;
pub mod reconcile;
pub mod services;
pub mod state;
