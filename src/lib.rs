use std::sync::{Arc, Mutex};

pub mod api;
pub mod app;
pub mod auth;
pub mod browser;
pub mod config;
pub mod error;
pub mod logging;
pub mod pkce;
pub mod storage;
pub mod ui;

pub use app::{App, AuthState, Environment};
pub use config::Config;
pub use error::{Error, Result};

pub type Shared<T> = Arc<T>;
pub type Locked<T> = Mutex<T>;
