//! Library crate for photo-buzz, exposing modules for binaries and integration tests.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod photo;
pub mod routes;
pub mod services;
pub mod state;
