//! Command-line interface components
//!
//! Argument parsing and the handlers behind each `ezaz-cache` subcommand.

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, EntryArgs, EntrySelector, GlobalArgs, InvalidateArgs, ParentArgs,
};
pub use commands::{
    handle_clear, handle_config, handle_entries, handle_info, handle_invalidate, handle_show,
    CacheContext,
};
