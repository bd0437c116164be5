//! AI layer: prompt rendering, the model client (live or offline), and reply parsing.

mod client;
mod config;
mod parser;
mod prompt;

pub use client::{Model, ModelClient, ModelError, ModelReply, ModelRequest, OFFLINE_MODEL};
pub use config::ModelConfig;
pub use parser::{ParseDegraded, parse_reply, try_parse_reply};
pub use prompt::build_prompt;
