//! Render a single document.

use super::load_site;
use crate::ShowFormat;
use anyhow::{Context, Result};
use std::path::Path;

/// Render the document requested as `name` in the given format.
///
/// HTML output follows page semantics: a missing document shows the
/// not-found page or an inline diagnostic. JSON output requires the
/// document to exist.
pub fn show_document(config_path: &Path, name: &str, format: ShowFormat) -> Result<()> {
    let site = load_site(config_path)?;

    match format {
        ShowFormat::Html => {
            print!("{}", site.render_page(name).body());
        }
        ShowFormat::Json => {
            let doc = site
                .resolve(name)
                .with_context(|| format!("Cannot resolve document '{}'", name))?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        ShowFormat::Meta => {
            let doc = site
                .resolve_metadata(name)
                .with_context(|| format!("Cannot resolve document '{}'", name))?;
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
    }

    Ok(())
}
