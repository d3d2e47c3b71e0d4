//! Client side of the book API, shared by the terminal UI.

pub mod api;
pub mod form;
