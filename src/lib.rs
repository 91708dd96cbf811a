pub mod app;
pub mod clipboard;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod input;
pub mod logging;
pub mod notification;
pub mod remote;
pub mod state;
pub mod storage;
pub use error::{AppError, AppResult};
