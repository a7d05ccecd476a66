pub mod codec;
pub mod config;
pub mod orm;
pub mod url_repo;
pub mod url_service;
