pub mod json_config_store;
pub mod no_futures_store;

pub use json_config_store::JsonConfigRepository;
pub use no_futures_store::JsonNoFuturesRepository;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Atomic write: write to a temp file next to `path`, then rename over it.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write temp file {:?}", temp_path))?;
    fs::rename(&temp_path, path).with_context(|| format!("Failed to rename onto {:?}", path))?;
    Ok(())
}
