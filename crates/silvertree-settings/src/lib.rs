pub mod client;
pub mod coerce;
pub mod config;
pub mod editor;
pub mod error;
pub mod ids;
pub mod render;
pub mod session;
pub mod text;
pub mod tree;
pub mod ui;
pub mod view;

pub use error::{Error, Result};
