//! Safe save-file naming
//!
//! Downloads are saved as `"{artist} - {title}.{ext}"` with characters that
//! are illegal on common file systems removed.

const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Strip illegal characters and collapse whitespace. Idempotent on input
/// that is already safe.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the on-disk file name for a download. `extension` is the
/// candidate's extension without a leading dot.
pub fn safe_filename(artist: &str, title: &str, extension: &str) -> String {
    let base = sanitize(&format!("{artist} - {title}"));
    if extension.is_empty() {
        base
    } else {
        format!("{base}.{extension}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_every_illegal_character() {
        assert_eq!(sanitize(r#"a<b>c:d"e/f\g|h?i*j"#), "abcdefghij");
    }

    #[test]
    fn test_collapses_and_trims_whitespace() {
        assert_eq!(sanitize("  AC / DC   -  Back   In Black "), "AC DC - Back In Black");
    }

    #[test]
    fn test_idempotent_on_safe_input() {
        let safe = "Artist - Some Title";
        assert_eq!(sanitize(safe), safe);
        assert_eq!(sanitize(&sanitize(safe)), sanitize(safe));
    }

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("A", "B", "mp3"), "A - B.mp3");
        assert_eq!(
            safe_filename("Sigur Rós", "Svefn-g-englar", "flac"),
            "Sigur Rós - Svefn-g-englar.flac"
        );
    }
}
