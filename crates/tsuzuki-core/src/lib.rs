pub mod cache;
pub mod config;
pub mod decision;
pub mod error;
pub mod interpret;
pub mod matcher;
pub mod normalize;
pub mod pipeline;
pub mod resolver;
pub mod token;

#[cfg(test)]
mod testing;

pub use cache::ListEntryCache;
pub use config::{AppConfig, PolicyConfig};
pub use decision::{decide, Action, RejectReason};
pub use error::{InterpretationError, ResolutionError, TsuzukiError};
pub use interpret::{interpret, FilenameGuess};
pub use pipeline::{Outcome, Tracker, Trigger};
pub use resolver::ResolvedIdentity;
pub use token::TokenStore;
