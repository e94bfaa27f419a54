pub mod attributes;
pub mod browser;
pub mod dispatch;
pub mod error;
pub mod expr;
pub mod notification;
pub mod paths;
pub mod profile;
pub mod quota;
pub mod render;
pub mod resolver;
pub mod rules;
pub mod triage;

#[cfg(test)]
mod testing;

pub use browser::{Browser, SystemBrowser};
pub use error::{Result, TriageError};
pub use profile::{Action, Profile};
pub use render::Renderer;
pub use triage::{Summary, Triage};
