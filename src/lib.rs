//! Tiller: an autonomous coding-agent loop.
//!
//! A turn sends the transcript to a model, looks for a tool call in the
//! reply, runs the tool against the workspace and feeds the result back,
//! until the model answers in plain text or the iteration budget runs out.
//!
//! # Quick Start
//!
//! ```no_run
//! use tiller::prelude::*;
//!
//! # async fn example() -> tiller::error::Result<()> {
//! let spec: ModelSpec = "ollama:llama3.1".parse()?;
//! let provider = create_provider(&spec, &TillerConfig::from_env())?;
//! let mut session = AgentSession::local(provider, ".", AgentSettings::load());
//! let answer = session.send("Summarize src/main.rs", |update| println!("{update:?}")).await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod agent_loop;
pub mod backend;
pub mod config;
pub mod editor;
pub mod error;
pub mod models;
pub mod parser;
pub mod prelude;
pub mod provider;
pub mod scheduler;
pub mod session;
pub mod sketch;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
