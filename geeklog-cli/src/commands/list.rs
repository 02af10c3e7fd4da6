//! List command implementation.

use super::{load_site, print_table};
use anyhow::Result;
use std::path::Path;

pub fn list_documents(config_path: &Path, json: bool) -> Result<()> {
    let site = load_site(config_path)?;
    let docs = site.list_all();

    if json {
        println!("{}", serde_json::to_string_pretty(&docs)?);
    } else {
        print_table(&docs);
    }

    Ok(())
}
