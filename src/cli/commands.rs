//! Command implementations for the cloud CLI.
//!
//! - init: write default config files where they are missing
//! - sync: mirror the working directory onto a container
//! - url: resolve and print a container's public URL

use crate::config::{
    self, Cloud, Container, Core, Provider, CLOUDIGNORE_FILE, CLOUD_FILE,
};
use crate::ignore::IgnoreList;
use crate::storage;
use crate::sync::{PartialSync, SyncEngine};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

const DEFAULT_IGNORE: &str =
    "// Put here what to ignore. Syntax like .gitignore\n.cloud\n.cloudignore\n";

/// Write the three default config files, keeping any that already exist
pub fn init() -> Result<()> {
    let corepath = config::cloudcore_path();
    if !corepath.exists() {
        config::write_config(&corepath, &Core::template())
            .with_context(|| format!("cannot write {}", corepath.display()))?;
        println!("{}\t{}", "Initializing file:".green(), corepath.display());
    }
    if !Path::new(CLOUD_FILE).exists() {
        config::write_config(Path::new(CLOUD_FILE), &Cloud::template())
            .with_context(|| format!("cannot write {CLOUD_FILE}"))?;
        println!("{}\t{}", "Initializing file:".green(), CLOUD_FILE);
    }
    if !Path::new(CLOUDIGNORE_FILE).exists() {
        std::fs::write(CLOUDIGNORE_FILE, DEFAULT_IGNORE)
            .with_context(|| format!("cannot write {CLOUDIGNORE_FILE}"))?;
        println!("{}\t{}", "Initializing file:".green(), CLOUDIGNORE_FILE);
    }
    Ok(())
}

/// Resolve the container + credential chain from the layered configs
fn resolve(name: &str) -> Result<(Provider, Container)> {
    let core = Core::load()?;
    println!("{}\t{}", "Found".green(), ".cloudcore");
    let cloud = Cloud::load()?;
    println!("{}\t{}", "Found".green(), ".cloud");

    let container = cloud.select(name)?;
    println!("{}\t{}", "Container:".cyan(), container.name);
    let provider = core.provider_for(container)?;
    println!("{}\t{}", "Provider:".cyan(), provider.provider);
    Ok((provider.clone(), container.clone()))
}

/// Sync the current working directory with the named container
/// (default: first container in .cloud)
pub fn sync(name: Option<String>) -> Result<()> {
    let name = name.unwrap_or_default();
    let (provider, container) = resolve(&name)?;

    let backend = storage::from_config(&provider, &container)?;
    let ignore = IgnoreList::load(Path::new(CLOUDIGNORE_FILE))?;

    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let mut engine = SyncEngine::new(backend, ignore);
    let report = engine.run(&cwd)?;

    if !report.is_clean() {
        let total = report.uploaded + report.failed.len();
        return Err(PartialSync {
            failed: report.failed.len(),
            total,
        }
        .into());
    }
    println!(
        "{} {} file(s) synced",
        "Done:".green().bold(),
        report.uploaded
    );
    Ok(())
}

/// Resolve and print the public (CDN) URL of a container
pub fn url(name: Option<String>) -> Result<()> {
    let name = name.unwrap_or_default();
    let (provider, container) = resolve(&name)?;

    let mut backend = storage::from_config(&provider, &container)?;
    let url = backend.resolve_url()?;
    println!("{}\t{}", "Container url is:".cyan(), url);
    Ok(())
}
