//! Question-analysis assistant: builds multimodal chat requests, talks to the
//! upstream either directly or through the same-origin proxy in [`router`], and
//! renders answers to HTML with [`render`].

pub mod client;
pub mod config;
pub mod error;
pub mod image;
pub mod logger;
pub mod models;
pub mod prompt;
pub mod render;
pub mod router;
pub mod session;

#[cfg(test)]
mod testutil;

pub use client::{ChatClient, Transport};
pub use config::AppConfig;
pub use error::ChatError;
pub use render::Renderer;
pub use session::{Answer, Session};
