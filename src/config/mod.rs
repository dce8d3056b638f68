pub mod display;
pub mod parser;
pub mod types;
pub mod validate;

pub use types::{AppConfig, RouteConfig, ServerConfig};

use core::fmt;
use std::error::Error;

use crate::lexer::tokens::Loc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub message: String,
    pub loc: Option<Loc>,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            loc: None,
        }
    }

    pub fn at(message: impl Into<String>, loc: Loc) -> Self {
        Self {
            message: message.into(),
            loc: Some(loc),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.loc {
            Some(loc) => write!(f, "config error: {} ({})", self.message, loc),
            None => write!(f, "config error: {}", self.message),
        }
    }
}

impl Error for ConfigError {}
