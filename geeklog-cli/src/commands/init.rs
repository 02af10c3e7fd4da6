//! Init command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# geeklog site configuration
paths:
  content: data

# Tried in order when data/<name> does not exist
suffixes: [".txt", ".html", ".link"]

transform: markup
not_found: "404"
max_link_depth: 8
base_url: /

dates:
  date_time_format: "%c"
  date_format: "%F"

cache:
  backend: sidecar

blog:
  read_more: Read the rest
  permalink: Permalink
  by: by

allow_scripts: false
"#;

/// Initialize a new geeklog site
pub fn init_site(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    write_config(root)?;
    scaffold_content(root)?;

    println!("✓ geeklog initialized in {:?}", root);
    println!("  - Edit geeklog.yml to customize the site");
    println!("  - Write documents in data/ and try `geeklog show index`");
    Ok(())
}

fn write_config(root: &Path) -> Result<()> {
    let config_path = root.join("geeklog.yml");
    if config_path.exists() {
        println!("geeklog.yml already exists at {:?}", config_path);
        return Ok(());
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {:?}", config_path))?;
    println!("Created {:?}", config_path);
    Ok(())
}

fn scaffold_content(root: &Path) -> Result<()> {
    let content = root.join("data");
    fs::create_dir_all(&content).with_context(|| format!("Failed to create {:?}", content))?;

    for (file, body) in [("index.txt", index_document()), ("404.txt", not_found_document())] {
        let path = content.join(file);
        if !path.exists() {
            fs::write(&path, body).with_context(|| format!("Failed to write {:?}", path))?;
            println!("Created {:?}", path);
        }
    }

    Ok(())
}

fn index_document() -> &'static str {
    r#"title: Welcome to geeklog
author: geeklog
tags: intro
timestamp: 2025-01-01
description: Starter page

# Welcome

Each document is a block of `key: value` headers, a blank line and a body.
Link documents with [[index]] or [[index|some text]].

```doclist sort=timestamp reverse
```
"#
}

fn not_found_document() -> &'static str {
    r#"title: Not found

# Not found

Nothing lives here. Back to the [[index]].
"#
}
