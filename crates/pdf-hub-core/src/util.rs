//! Utility functions shared across the crate.

use std::path::PathBuf;

/// Get the user's config directory following XDG conventions.
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
pub fn config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
}

/// Strip any directory part and the `.pdf` extension from an uploaded name.
///
/// Browsers may send full client paths; only the last component is kept.
pub fn file_stem(filename: &str) -> &str {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let stem = base
        .len()
        .checked_sub(4)
        .filter(|&idx| base.is_char_boundary(idx) && base[idx..].eq_ignore_ascii_case(".pdf"))
        .map_or(base, |idx| &base[..idx]);

    if stem.trim().is_empty() { "documento" } else { stem }
}

/// Download name for a size-reduced document, derived from the input name.
pub fn reduced_filename(original: &str) -> String {
    format!("{}_reduzido.pdf", file_stem(original))
}

/// Format a MiB value for display (two decimals).
pub fn format_mb(mb: f64) -> String {
    format!("{mb:.2} MB")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("report.pdf"), "report");
        assert_eq!(file_stem("REPORT.PDF"), "REPORT");
        assert_eq!(file_stem("C:\\Users\\me\\scan.pdf"), "scan");
        assert_eq!(file_stem("/tmp/notes"), "notes");
        assert_eq!(file_stem(".pdf"), "documento");
        assert_eq!(file_stem(""), "documento");
    }

    #[test]
    fn test_reduced_filename() {
        assert_eq!(reduced_filename("contrato.pdf"), "contrato_reduzido.pdf");
    }

    #[test]
    fn test_format_mb() {
        assert_eq!(format_mb(199.999), "200.00 MB");
        assert_eq!(format_mb(0.5), "0.50 MB");
    }
}
