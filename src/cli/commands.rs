//! Command handlers for the ezaz-cache CLI
//!
//! Each handler resolves the addressed cache node from the command line and
//! runs one cache operation against it.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::app::cache::stats::format_bytes;
use crate::app::cache::{CacheRoot, ClassCache, EntryKind, ObjectCache};
use crate::cli::args::{EntryArgs, EntrySelector, GlobalArgs, InvalidateArgs, ParentArgs};
use crate::config::AppConfig;
use crate::constants::expiry::DEFAULT_TABLE;
use crate::errors::{CacheError, CacheResult, Result};

/// Loaded configuration plus the cache tree it describes
pub struct CacheContext {
    pub config: AppConfig,
    pub root: CacheRoot,
}

impl CacheContext {
    /// Load configuration and open the cache tree
    ///
    /// `env_root` is the cache directory taken from the environment, if any.
    pub fn load(global: &GlobalArgs, env_root: Option<PathBuf>) -> Result<Self> {
        let config = AppConfig::load(global.config.as_deref())?;
        Self::from_config(config, global, env_root)
    }

    pub fn from_config(
        config: AppConfig,
        global: &GlobalArgs,
        env_root: Option<PathBuf>,
    ) -> Result<Self> {
        let cache_root = config
            .cache
            .resolve_root(global.cache_dir.as_deref(), env_root)?;
        let flags = global.cache_flags(&config.cache.flags());
        debug!("Opening cache at {} with {:?}", cache_root.display(), flags);

        Ok(Self {
            root: CacheRoot::new(cache_root, flags),
            config,
        })
    }

    /// Object cache for the innermost `--parent`, if any was given
    fn parent_object(&self, parent: &ParentArgs) -> Option<ObjectCache> {
        let mut parents = parent.parents.iter();
        let (first_type, first_id) = parents.next()?;
        let mut object = self.root.object_cache(
            self.config.cache.policy_for(first_type),
            first_type.as_str(),
            first_id.as_str(),
        );
        for (resource_type, id) in parents {
            object = object.child_object_cache(
                self.config.cache.policy_for(resource_type),
                resource_type.as_str(),
                id.as_str(),
            );
        }
        Some(object)
    }

    /// Class cache for `resource_type` under the given parents
    fn class_cache(&self, parent: &ParentArgs, resource_type: &str) -> ClassCache {
        let policy = self.config.cache.policy_for(resource_type);
        match self.parent_object(parent) {
            Some(object) => object.child_class_cache(policy, resource_type),
            None => self.root.class_cache(policy, resource_type),
        }
    }
}

/// Handle the info command
pub fn handle_info(ctx: &CacheContext) -> Result<()> {
    let stats = ctx.root.stats();
    let flags = ctx.root.flags();

    println!("💾 Cache Information");
    println!("===================");
    println!("Location: {}", stats.cache_root.display());
    println!("Cached files: {}", stats.cached_files_count);
    println!(
        "  details: {}, lists: {}, id lists: {}",
        stats.count_of(EntryKind::Detail),
        stats.count_of(EntryKind::List),
        stats.count_of(EntryKind::IdList)
    );
    println!("Cache size: {}", stats.format_cache_size());
    println!(
        "Flags: dry_run={} no_cache_read={} no_cache_write={}",
        flags.dry_run, flags.no_cache_read, flags.no_cache_write
    );

    println!();
    println!("Expiry policies:");
    let expiry = &ctx.config.cache.expiry;
    if !expiry.contains_key(DEFAULT_TABLE) {
        println!("  {:<16} {}", DEFAULT_TABLE, ctx.config.cache.policy_for(DEFAULT_TABLE));
    }
    for (resource_type, policy) in expiry {
        println!("  {:<16} {}", resource_type, policy);
    }

    Ok(())
}

/// Handle the entries command
pub fn handle_entries(ctx: &CacheContext) -> Result<()> {
    let stats = ctx.root.stats();
    if stats.entries.is_empty() {
        println!("ℹ️  No cached entries in {}", stats.cache_root.display());
        return Ok(());
    }

    let now = Utc::now();
    println!(
        "{:<8} {:<40} {:<32} {:>10} {:>8}",
        "KIND", "NAME", "NESTING", "SIZE", "AGE"
    );
    for entry in &stats.entries {
        println!(
            "{:<8} {:<40} {:<32} {:>10} {:>8}",
            entry.kind,
            entry.name,
            entry.nesting(),
            format_bytes(entry.size),
            format_age(entry.age_at(now))
        );
    }
    println!();
    println!(
        "{} entries, {}",
        stats.cached_files_count,
        stats.format_cache_size()
    );

    Ok(())
}

/// Handle the show command
pub fn handle_show(ctx: &CacheContext, args: &EntryArgs) -> Result<()> {
    let cache = ctx.class_cache(&args.parent, &args.resource_type);
    info!(
        "Reading {:?} for {} from {}",
        args.selector(),
        args.resource_type,
        cache.cache_dir().display()
    );

    let result = match args.selector() {
        EntrySelector::Detail(id) => cache.read_detail(id),
        EntrySelector::List(tag) => cache.read_list(tag),
        EntrySelector::IdList(tag) => cache.read_id_list(tag).map(|ids| ids.join("\n")),
    };

    match result {
        Ok(content) => {
            println!("{}", content);
            Ok(())
        }
        Err(e) if e.needs_fetch() => {
            println!("{}", fetch_signal_line(&e));
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// One line naming why a read fell through to a live fetch
fn fetch_signal_line(error: &CacheError) -> String {
    format!("{}: {}", error.category(), error)
}

/// Handle the invalidate command
pub fn handle_invalidate(ctx: &CacheContext, args: &InvalidateArgs) -> Result<()> {
    let entry = &args.entry;
    let cache = ctx.class_cache(&entry.parent, &entry.resource_type);

    if args.all {
        let removed = cache.invalidate_all_details()?;
        println!(
            "🗑️  Removed {} {} detail entries",
            removed, entry.resource_type
        );
        return Ok(());
    }

    let result: CacheResult<()> = match entry.selector() {
        EntrySelector::Detail(id) => cache.invalidate_detail(id),
        EntrySelector::List(tag) => cache.invalidate_list(tag),
        EntrySelector::IdList(tag) => cache.invalidate_id_list(tag),
    };
    result?;
    println!("🗑️  Invalidated {:?} for {}", entry.selector(), entry.resource_type);

    Ok(())
}

/// Handle the clear command
pub fn handle_clear(ctx: &CacheContext, args: &ParentArgs) -> Result<()> {
    match ctx.parent_object(args) {
        Some(object) => {
            let dir = object.child_cache_dir();
            object.clear_children()?;
            println!("🧹 Cleared {}", dir.display());
        }
        None => {
            ctx.root.clear()?;
            println!("🧹 Cleared {}", ctx.root.root().display());
        }
    }
    if ctx.root.flags().dry_run {
        println!("💡 Dry run: nothing was removed from disk");
    }

    Ok(())
}

/// Handle the config command
pub fn handle_config() -> Result<()> {
    print!("{}", AppConfig::generate_default_config_content());
    Ok(())
}

/// Compact age such as `45s`, `3m12s` or `2d4h`
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    match secs {
        0..=59 => format!("{}s", secs),
        60..=3599 => format!("{}m{}s", secs / 60, secs % 60),
        3600..=86_399 => format!("{}h{}m", secs / 3600, (secs % 3600) / 60),
        _ => format!("{}d{}h", secs / 86_400, (secs % 86_400) / 3600),
    }
}
