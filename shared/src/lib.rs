pub mod access;
pub mod auth;
pub mod config;
pub mod editor;
pub mod invite;
pub mod models;
pub mod planning;
pub mod render;
pub mod share;
pub mod store;
pub mod subscription;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
