//! Release-style anime filename parser.
//!
//! Splits a name like `[Group] Title - 05 (1080p) [ABCD1234].mkv` into
//! [`Elements`], remembering where in the token stream the title, season and
//! episode were found so callers can judge how trustworthy the title is.

pub mod elements;
pub mod keyword;
pub mod parser;
pub mod tokenizer;

pub use elements::{Elements, Positions};
pub use parser::parse;
