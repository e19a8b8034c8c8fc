//! `decomment` removes comments from C source trees in place.
//!
//! It provides the core logic for the `decomment` command-line tool but can
//! also be driven by any other front end. The main components are:
//!
//! - `stripper`: the comment scanner, a pure function from source text to
//!   source text that never touches string or character literals.
//! - `rewriter`: applies the scanner to one file, writing back atomically and
//!   only when something changed.
//! - `collector`: finds the `.c`/`.h` files under a directory, in a stable order.
//! - `pipeline`: runs the rewriter over a file list on a worker thread, with
//!   progress events, per-file error isolation and cooperative cancellation.
//! - `config`: loads selection and rewrite settings from YAML files.
//! - `report`: renders a finished batch as text, JSON or CSV.

pub mod cli;
pub mod collector;
pub mod config;
pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod rewriter;
pub mod stripper;

// Re-export main types for easier access by library users.
pub use collector::FileCollector;
pub use config::{Config, ConfigLoader};
pub use errors::{Error, Result};
pub use pipeline::{BatchEvent, BatchHandle, BatchPipeline, BatchResult, BatchState, CancelToken};
pub use rewriter::{DecodePolicy, FileRewriter, RewriteOutcome};
pub use stripper::{strip_comment_bytes, strip_comments};
