//! PStore - command line access to a cache directory
//!
//! Builds a cache from `PSTORE_*` environment variables and runs one
//! operation against it. Values are read and printed as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pstore::{CacheBuilder, Config, DynamicCache};

#[derive(Debug, Parser)]
#[command(name = "pstore", version, about = "Inspect and edit a pstore cache directory")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Store a JSON value under a key
    Set { key: String, value: String },
    /// Print the value stored under a key
    Get { key: String },
    /// Print whether a key exists
    Has { key: String },
    /// Remove a key
    Del { key: String },
    /// List every key
    Keys,
    /// Print the number of keys
    Len,
}

fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var.
    // Logs go to stderr so stdout stays machine readable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pstore=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    info!(
        "Configuration loaded: directory={}, namespace={}, in_memory={}",
        config.directory.display(),
        config.namespace,
        config.in_memory
    );

    let cache = build_cache(&config);
    run(&cache, cli.command)
}

fn build_cache(config: &Config) -> DynamicCache {
    let builder = CacheBuilder::new(config.namespace.clone()).policy(config.policy());
    if config.in_memory {
        builder.build()
    } else {
        builder.directory(config.directory.clone()).build()
    }
}

fn run(cache: &DynamicCache, command: Command) -> Result<()> {
    match command {
        Command::Set { key, value } => {
            let value: serde_json::Value =
                serde_json::from_str(&value).context("value must be valid JSON")?;
            cache.set(&key, value)?;
            cache.save_to_disk()?;
        }
        Command::Get { key } => {
            let value = cache.get(&key)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Command::Has { key } => {
            println!("{}", cache.has(&key)?);
        }
        Command::Del { key } => {
            cache.delete(&key)?;
        }
        Command::Keys => {
            let mut keys = cache.keys()?;
            keys.sort();
            println!("{}", serde_json::to_string_pretty(&keys)?);
        }
        Command::Len => {
            println!("{}", cache.len()?);
        }
    }
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use pstore::PStoreError;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn config(dir: &Path, persist_on_write: bool) -> Config {
        Config {
            directory: dir.to_path_buf(),
            namespace: "cli".to_string(),
            persist_on_write,
            ..Config::default()
        }
    }

    fn cache_file_exists(dir: &Path, key: &str) -> bool {
        dir.join(pstore::cache::file_name("cli", key)).exists()
    }

    fn set(key: &str, value: &str) -> Command {
        Command::Set {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_run_set_then_read_commands() {
        let dir = TempDir::new().unwrap();
        let cache = build_cache(&config(dir.path(), true));

        run(&cache, set("a", r#"{"n": 1, "tags": ["x"]}"#)).unwrap();

        assert_eq!(cache.get("a").unwrap(), json!({"n": 1, "tags": ["x"]}));
        assert!(cache_file_exists(dir.path(), "a"));
        run(&cache, Command::Get { key: "a".to_string() }).unwrap();
        run(&cache, Command::Has { key: "a".to_string() }).unwrap();
        run(&cache, Command::Keys).unwrap();
        run(&cache, Command::Len).unwrap();
    }

    #[test]
    fn test_run_set_flushes_deferred_cache() {
        let dir = TempDir::new().unwrap();
        let cache = build_cache(&config(dir.path(), false));

        run(&cache, set("a", "42")).unwrap();

        assert!(cache_file_exists(dir.path(), "a"));
        let reopened = build_cache(&config(dir.path(), true));
        assert_eq!(reopened.get("a").unwrap(), json!(42));
    }

    #[test]
    fn test_run_set_rejects_invalid_json() {
        let dir = TempDir::new().unwrap();
        let cache = build_cache(&config(dir.path(), true));

        let err = run(&cache, set("a", "{not json")).unwrap_err();

        assert!(err.to_string().contains("value must be valid JSON"));
        assert!(!cache.contains_in_memory("a"));
        assert!(!cache_file_exists(dir.path(), "a"));
    }

    #[test]
    fn test_run_del_removes_key() {
        let dir = TempDir::new().unwrap();
        let cache = build_cache(&config(dir.path(), true));
        run(&cache, set("a", "\"x\"")).unwrap();

        run(&cache, Command::Del { key: "a".to_string() }).unwrap();

        assert!(!cache_file_exists(dir.path(), "a"));
        assert!(!cache.has("a").unwrap());
    }

    #[test]
    fn test_run_get_missing_key_keeps_error_kind() {
        let dir = TempDir::new().unwrap();
        let cache = build_cache(&config(dir.path(), true));

        let err = run(&cache, Command::Get { key: "missing".to_string() }).unwrap_err();

        let err = err.downcast_ref::<PStoreError>().unwrap();
        assert!(err.is_key_not_found());
    }

    #[test]
    fn test_build_cache_in_memory() {
        let cache = build_cache(&Config {
            in_memory: true,
            ..Config::default()
        });

        assert!(cache.is_in_memory());
        run(&cache, set("a", "true")).unwrap();
        assert_eq!(cache.get("a").unwrap(), json!(true));
    }
}
