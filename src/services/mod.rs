pub mod auth;
pub mod catalog;
pub mod tenancy;
pub mod users;
