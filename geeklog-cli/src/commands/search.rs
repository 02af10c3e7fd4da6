//! Search command implementation.

use super::{load_site, print_table};
use anyhow::Result;
use geeklog_core::Query;
use serde::Serialize;
use std::path::Path;

/// Compact result row for `--json`
#[derive(Serialize)]
struct SearchHit<'a> {
    name: &'a str,
    title: &'a str,
    tags: Option<&'a [String]>,
    timestamp: Option<i64>,
    mtime: i64,
}

/// Run a query given as `key=value` arguments.
pub fn search_documents(config_path: &Path, params: &[String], json: bool) -> Result<()> {
    let site = load_site(config_path)?;
    let query = Query::from_tokens(params);
    tracing::debug!("Running query {:?}", query.params());

    let docs = site.search(&query);

    if json {
        let hits: Vec<SearchHit> = docs
            .iter()
            .map(|doc| SearchHit {
                name: &doc.name,
                title: &doc.title,
                tags: doc.tags(),
                timestamp: doc.timestamp(),
                mtime: doc.mtime,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else if docs.is_empty() {
        println!("No documents match");
    } else {
        print_table(&docs);
    }

    Ok(())
}
