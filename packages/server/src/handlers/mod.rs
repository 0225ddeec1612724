pub mod auth;
pub mod collections;
pub mod photos;
pub mod titles;
pub mod upload;
pub mod users;
