//! Configuration module for Dragnet
//!
//! Handles loading, parsing, and validating TOML configuration files.
//! Validation runs at load time, so every config problem surfaces before
//! the first network request.

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{
    Config, FieldSpec, OutputConfig, OutputFormat, PaginationRule, ScraperConfig, SelectorKind,
    Target, UserAgentConfig,
};
pub use validation::{validate, validate_fields};
