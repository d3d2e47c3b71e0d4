pub mod book;
pub mod error;
pub mod repository;
pub mod validation;
