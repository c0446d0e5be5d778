pub mod config;
pub mod controls;
pub mod event;
pub mod percussion;
