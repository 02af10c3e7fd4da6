//! CLI command implementations.

pub mod init;
pub mod list;
pub mod search;
pub mod show;

pub use init::init_site;
pub use list::list_documents;
pub use search::search_documents;
pub use show::show_document;

use anyhow::{Context, Result};
use geeklog_core::{Config, Document, Site};
use std::path::Path;

/// Load the configuration and build the site it describes.
pub fn load_site(config_path: &Path) -> Result<Site> {
    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    let content_dir = config.content_dir();
    if !content_dir.is_dir() {
        anyhow::bail!("Content directory {:?} does not exist", content_dir);
    }

    tracing::debug!("Serving documents from {:?}", content_dir);
    Ok(Site::new(config))
}

/// One line per document: name, title and tags.
pub fn print_table(docs: &[Document]) {
    let width = docs.iter().map(|d| d.name.len()).max().unwrap_or(0);
    for doc in docs {
        if doc.display.tags_string.is_empty() {
            println!("{:width$}  {}", doc.name, doc.title);
        } else {
            println!("{:width$}  {} [{}]", doc.name, doc.title, doc.display.tags_string);
        }
    }
}
