//! Canonical document names.

use std::path::Path;

/// Accented characters folded to their unaccented ASCII form.
///
/// Both cases fold to the lowercase letter.
const ACCENTS: &[(char, char)] = &[
    ('á', 'a'),
    ('é', 'e'),
    ('í', 'i'),
    ('ó', 'o'),
    ('ú', 'u'),
    ('ñ', 'n'),
    ('ü', 'u'),
    ('Á', 'a'),
    ('É', 'e'),
    ('Í', 'i'),
    ('Ó', 'o'),
    ('Ú', 'u'),
    ('Ñ', 'n'),
    ('Ü', 'u'),
];

/// Replace the accented characters of the substitution table.
pub fn clean_accents(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            ACCENTS
                .iter()
                .find(|(accented, _)| *accented == c)
                .map(|(_, plain)| *plain)
                .unwrap_or(c)
        })
        .collect()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'
}

/// Convert a requested name into a canonical document name
///
/// Rules:
/// - Fold accents in either case (`á` and `Á` → `a`, `ñ` → `n`, ...)
/// - Keep the longest prefix made of `[0-9a-z_-]`
/// - Everything from the first other character on is dropped
/// - An empty result is not a name
///
/// # Examples
///
/// ```
/// use geeklog_core::sanitize;
///
/// assert_eq!(sanitize("canción"), Some("cancion".to_string()));
/// assert_eq!(sanitize("hello.txt"), Some("hello".to_string()));
/// assert_eq!(sanitize("Ñandu"), Some("nandu".to_string()));
/// assert_eq!(sanitize("Hello"), None);
/// ```
pub fn sanitize(raw: &str) -> Option<String> {
    let name: String = clean_accents(raw)
        .chars()
        .take_while(|c| is_name_char(*c))
        .collect();

    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Whether `raw` is already a canonical name.
pub fn is_canonical(raw: &str) -> bool {
    sanitize(raw).as_deref() == Some(raw)
}

/// Derive a document's own name from its backing file.
///
/// The basename loses everything from its first `.` before sanitizing, so
/// `notes/hello.txt` and `notes/hello.link` both name `hello`.
pub fn name_from_filename(path: &Path) -> Option<String> {
    let base = path.file_name()?.to_str()?;
    let stem = base.split('.').next().unwrap_or(base);
    sanitize(stem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::PathBuf;

    #[test]
    fn test_plain_names_are_kept() {
        assert_eq!(sanitize("hello"), Some("hello".into()));
        assert_eq!(sanitize("2024_notes-v2"), Some("2024_notes-v2".into()));
    }

    #[test]
    fn test_prefix_is_kept() {
        assert_eq!(sanitize("hello world"), Some("hello".into()));
        assert_eq!(sanitize("hello.txt"), Some("hello".into()));
        assert_eq!(sanitize("abc/../etc/passwd"), Some("abc".into()));
        assert_eq!(sanitize("blogPost"), Some("blog".into()));
    }

    #[test]
    fn test_accents() {
        assert_eq!(sanitize("canción"), Some("cancion".into()));
        assert_eq!(sanitize("pingüino"), Some("pinguino".into()));
        assert_eq!(sanitize("año"), Some("ano".into()));
        assert_eq!(clean_accents("árbol ñandú"), "arbol nandu");
    }

    #[test]
    fn test_uppercase_accents_fold_to_lowercase() {
        assert_eq!(sanitize("Árbol"), Some("arbol".into()));
        assert_eq!(sanitize("Ñandu"), Some("nandu".into()));
        assert_eq!(sanitize("Üeber"), Some("ueber".into()));
        assert_eq!(clean_accents("ÁÉÍÓÚÑÜ"), "aeiounu");
        // Plain ASCII capitals still end the name
        assert_eq!(sanitize("ÓscarWilde"), Some("oscar".into()));
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(sanitize(""), None);
        assert_eq!(sanitize(".hidden"), None);
        assert_eq!(sanitize("Hello"), None);
        assert_eq!(sanitize("../etc"), None);
        assert_eq!(sanitize("Zorro"), None);
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "", "hello", "Hello", "canción de cuna", "a.b.c", "x y", "ñ", "-_-", "Ünïcode", "😀",
            "z9/..", "über",
        ];
        for input in inputs {
            let once = sanitize(input);
            let twice = once.as_deref().and_then(sanitize);
            match once {
                Some(ref name) => assert_eq!(twice.as_ref(), Some(name), "input {input:?}"),
                None => assert_eq!(twice, None, "input {input:?}"),
            }
        }
    }

    #[test]
    fn test_identity_on_canonical_names() {
        for name in ["a", "0", "_", "-", "abc-def_123", "zz--__"] {
            assert_eq!(sanitize(name).as_deref(), Some(name));
            assert!(is_canonical(name));
        }
        assert!(!is_canonical("hello.txt"));
    }

    proptest! {
        #[test]
        fn prop_sanitize_is_idempotent(raw in any::<String>()) {
            let once = sanitize(&raw);
            let twice = once.as_deref().and_then(sanitize);
            prop_assert_eq!(twice, once);
        }

        #[test]
        fn prop_canonical_names_are_fixed_points(name in "[0-9a-z_-]{1,32}") {
            prop_assert_eq!(sanitize(&name), Some(name.clone()));
            prop_assert!(is_canonical(&name));
        }

        #[test]
        fn prop_accented_names_fold(prefix in "[a-z]{0,8}", accent in "[áéíóúñüÁÉÍÓÚÑÜ]", suffix in "[a-z]{0,8}") {
            let raw = format!("{prefix}{accent}{suffix}");
            let name = sanitize(&raw);
            prop_assert!(name.as_deref().is_some_and(|n| n.chars().count() == raw.chars().count()));
        }
    }

    #[test]
    fn test_name_from_filename() {
        assert_eq!(
            name_from_filename(&PathBuf::from("/data/hello.txt")),
            Some("hello".into())
        );
        assert_eq!(
            name_from_filename(&PathBuf::from("/data/archive.tar.gz")),
            Some("archive".into())
        );
        assert_eq!(name_from_filename(&PathBuf::from("/data/.cache")), None);
    }
}
