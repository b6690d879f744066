//! # cmdtree
//!
//! **Hierarchical command-line parser** - register a tree of commands, each
//! with typed parameters and a handler, then parse argv into a chain of
//! matched commands whose handlers run root first.
//!
//! ## Features
//!
//! - **Command trees** - `git remote add` style nesting, any depth
//! - **Prefixed and raw parameters** - `--long`, `-s`, combined `-abc`, positional values
//! - **Global parameters** - `app --verbose list` via the empty-named root command
//! - **Raw commands** - hand everything after the command to its handler
//! - **Typed values** - [`Slot`] and [`Choice`] convert tokens into host-owned values
//! - **Declarative trees** - build a tree from a TOML definition with [`config`]
//!
//! ## Quick Start
//!
//! ```rust
//! use cmdtree::{Parser, Slot, bind, handler};
//!
//! let port = Slot::<u16>::new();
//! let mut parser = Parser::new();
//! parser
//!     .add_global_param("verbose", "v", "Verbose output.", false, None)
//!     .unwrap();
//! parser
//!     .add_command("serve", "Start the server.", handler(|ctx| {
//!         assert!(ctx.executed());
//!         Ok(())
//!     }))
//!     .unwrap()
//!     .add_param("port", "p", "Port to bind.", true, bind(port.clone()))
//!     .unwrap();
//!
//! parser.parse(["-v", "serve", "--port", "8080"]).unwrap();
//! assert_eq!(port.get(), Some(8080));
//! assert_eq!(parser.matched_names(), vec!["", "serve"]);
//! ```
//!
//! ## Handler chains
//!
//! Every matched command's handler is visited in match order. Only the
//! last one sees [`Context::executed`] as true. A handler error stops the
//! chain and is returned from `parse` as [`Error::Handler`], unchanged.

// ============================================================================
// Core Modules
// ============================================================================

/// Token classification: command names, long, short and combined parameters.
pub mod argument;

/// Commands and command trees, plus resolution of the matched chain.
pub mod command;

/// Handler context and visitation.
pub mod context;

/// Error taxonomy for registration, parsing and handlers.
pub mod error;

/// Parameter sets and the parameter scanning state machine.
pub mod parameter;

/// Parse session and the owning [`Parser`].
pub mod state;

/// Value conversion: [`Setter`], [`FromToken`], [`Slot`], [`Choice`].
pub mod value;

// ============================================================================
// Supporting Modules
// ============================================================================

/// TOML tree definitions.
pub mod config;

mod help;
mod must;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use argument::{Argument, classify};

pub use command::{Command, CommandBody, Commands};

pub use context::{Context, Handler, handler};

pub use error::{BoxError, Error, ErrorKind, RegisterError, Result};

pub use parameter::{Parameter, Parameters};

pub use state::{Parser, Session, parse_args};

pub use value::{Choice, FromToken, Setter, Slot, bind, parse_duration, setter_fn};
