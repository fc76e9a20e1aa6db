pub mod auth;
pub mod books;
pub mod company;
pub mod integrations;
pub mod lists;
pub mod profile;
pub mod stores;
pub mod users;
