//! Enumeration of the documents in the content directory.

use crate::models::Document;
use crate::name::sanitize;
use crate::site::Site;
use std::collections::HashSet;
use walkdir::WalkDir;

/// Canonical name for a directory entry, if the entry is a document.
///
/// Listable files are named exactly `<name>` or `<name><suffix>` for a
/// configured suffix; dotfiles, backups (`hello.txt~`) and names with
/// uppercase or punctuation are skipped.
pub fn listable_name(file_name: &str, suffixes: &[String]) -> Option<String> {
    let name = sanitize(file_name)?;
    let listable = file_name == name
        || suffixes
            .iter()
            .any(|suffix| file_name.strip_prefix(name.as_str()) == Some(suffix.as_str()));
    listable.then_some(name)
}

impl Site {
    /// Metadata of every document in the content directory.
    ///
    /// Entries are visited in file-name order. Files that fail to resolve are
    /// logged and skipped, and a document reached through several names (an
    /// alias and its target) is listed once.
    pub fn list_all(&self) -> Vec<Document> {
        let root = self.config().content_dir();
        let mut names = Vec::new();
        let mut seen_names = HashSet::new();

        for entry in WalkDir::new(&root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!("Skipping unreadable entry in {:?}: {}", root, err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str() else {
                continue;
            };
            if let Some(name) = listable_name(file_name, &self.config().suffixes) {
                if seen_names.insert(name.clone()) {
                    names.push(name);
                }
            }
        }

        let mut seen_files = HashSet::new();
        let mut docs = Vec::with_capacity(names.len());
        for name in names {
            match self.resolve_metadata(&name) {
                Ok(doc) => {
                    if seen_files.insert(doc.filename.clone()) {
                        docs.push(doc);
                    }
                }
                Err(err) => tracing::warn!("Skipping {} in listing: {}", name, err),
            }
        }

        tracing::debug!("Listed {} documents under {:?}", docs.len(), root);
        docs
    }
}
