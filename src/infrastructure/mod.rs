pub mod auth;
pub mod cache;
pub mod db;
pub mod notifications;
pub mod storage;
pub mod utils;
