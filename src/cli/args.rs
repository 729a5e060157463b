//! Command-line argument parsing for the ezaz cache
//!
//! The binary is a diagnostic front end: it inspects, reads and prunes a
//! cache tree that other tooling populates.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::cache::{CacheFlags, FlagOverrides};

/// ezaz-cache - inspect and maintain the ezaz object cache
#[derive(Parser, Debug)]
#[command(
    name = "ezaz-cache",
    version,
    about = "Inspect and maintain the ezaz hierarchical object cache",
    long_about = "Reads, invalidates and clears entries in the on-disk cache tree used by ezaz.
Expiry policies come from the configuration file; the same policies apply here as in the tools that fill the cache."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging, including every cache hit and miss
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Cache directory path
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Never change anything on disk
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Ignore cached entries on disk
    #[arg(long, global = true)]
    pub no_cache_read: bool,

    /// Never write entries to disk
    #[arg(long, global = true)]
    pub no_cache_write: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show cache location, size and configured expiry policies
    Info,

    /// List every cached entry on disk
    Entries,

    /// Read one entry through the cache
    Show(EntryArgs),

    /// Remove entries from the cache
    Invalidate(InvalidateArgs),

    /// Remove the whole cache or one nested subtree
    Clear(ParentArgs),

    /// Print a default configuration file
    Config,
}

/// Ancestors of the cache node to operate on, outermost first
#[derive(Args, Debug, Clone, Default)]
pub struct ParentArgs {
    /// Parent object as TYPE=ID; repeat for deeper nesting
    #[arg(long = "parent", value_name = "TYPE=ID", value_parser = parse_parent)]
    pub parents: Vec<(String, String)>,
}

/// Selects one entry of a resource type
#[derive(Args, Debug, Clone)]
pub struct EntryArgs {
    /// Resource type, e.g. "vm"
    #[arg(value_name = "TYPE")]
    pub resource_type: String,

    /// Object id for a detail entry; without it the list entry is used
    #[arg(long, conflicts_with = "ids")]
    pub id: Option<String>,

    /// Tag distinguishing list variants
    #[arg(long, conflicts_with = "id")]
    pub tag: Option<String>,

    /// Use the id-list entry instead of the full list
    #[arg(long)]
    pub ids: bool,

    #[command(flatten)]
    pub parent: ParentArgs,
}

/// Arguments for the invalidate command
#[derive(Args, Debug, Clone)]
pub struct InvalidateArgs {
    #[command(flatten)]
    pub entry: EntryArgs,

    /// Remove every detail entry of the type
    #[arg(long, conflicts_with_all = ["id", "tag", "ids"])]
    pub all: bool,
}

/// Which entry of a resource type a command addresses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySelector<'a> {
    Detail(&'a str),
    List(Option<&'a str>),
    IdList(Option<&'a str>),
}

impl EntryArgs {
    pub fn selector(&self) -> EntrySelector<'_> {
        match (&self.id, self.ids) {
            (Some(id), _) => EntrySelector::Detail(id),
            (None, true) => EntrySelector::IdList(self.tag.as_deref()),
            (None, false) => EntrySelector::List(self.tag.as_deref()),
        }
    }
}

/// Parse a `TYPE=ID` pair
fn parse_parent(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((resource_type, id)) if !resource_type.is_empty() && !id.is_empty() => {
            Ok((resource_type.to_string(), id.to_string()))
        }
        _ => Err(format!("expected TYPE=ID, got '{}'", value)),
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level from the verbosity flags, if any was given
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl GlobalArgs {
    /// Flags given on the command line; unset flags defer to the config file
    pub fn flag_overrides(&self) -> FlagOverrides {
        let set = |flag: bool| flag.then_some(true);
        FlagOverrides {
            verbose: set(self.verbose || self.very_verbose),
            dry_run: set(self.dry_run),
            no_cache_read: set(self.no_cache_read),
            no_cache_write: set(self.no_cache_write),
        }
    }

    /// Combine command line flags with the configured ones
    pub fn cache_flags(&self, configured: &CacheFlags) -> CacheFlags {
        self.flag_overrides().resolve(configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ezaz-cache").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_log_level() {
        assert_eq!(cli(&["--quiet", "info"]).log_level(), Some(tracing::Level::ERROR));
        assert_eq!(cli(&["-v", "info"]).log_level(), Some(tracing::Level::INFO));
        assert_eq!(
            cli(&["--very-verbose", "info"]).log_level(),
            Some(tracing::Level::DEBUG)
        );
        assert_eq!(cli(&["info"]).log_level(), None);
    }

    #[test]
    fn test_parent_parsing() {
        let parsed = cli(&[
            "clear",
            "--parent",
            "subscription=s1",
            "--parent",
            "group=rg=odd",
        ]);
        let Commands::Clear(args) = parsed.command else {
            panic!("expected clear");
        };
        assert_eq!(
            args.parents,
            vec![
                ("subscription".to_string(), "s1".to_string()),
                ("group".to_string(), "rg=odd".to_string()),
            ]
        );

        assert!(parse_parent("group").is_err());
        assert!(parse_parent("=id").is_err());
        assert!(parse_parent("group=").is_err());
    }

    #[test]
    fn test_entry_selector() {
        let Commands::Show(args) = cli(&["show", "vm", "--id", "a"]).command else {
            panic!("expected show");
        };
        assert_eq!(args.selector(), EntrySelector::Detail("a"));

        let Commands::Show(args) = cli(&["show", "vm", "--ids", "--tag", "t"]).command else {
            panic!("expected show");
        };
        assert_eq!(args.selector(), EntrySelector::IdList(Some("t")));

        let Commands::Show(args) = cli(&["show", "vm"]).command else {
            panic!("expected show");
        };
        assert_eq!(args.selector(), EntrySelector::List(None));
    }

    #[test]
    fn test_invalidate_all_conflicts_with_id() {
        let result = Cli::try_parse_from(["ezaz-cache", "invalidate", "vm", "--all", "--id", "a"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cache_flags_merge() {
        let parsed = cli(&["--dry-run", "info"]);
        let configured = CacheFlags::default().with_no_cache_read(true);
        let flags = parsed.global.cache_flags(&configured);

        assert!(flags.dry_run);
        assert!(flags.no_cache_read);
        assert!(!flags.no_cache_write);
        assert!(!flags.verbose);
    }
}
