//! Output file naming

use unicode_normalization::UnicodeNormalization;

/// Suffix appended to every composed document's file name
pub const FILE_SUFFIX: &str = "_HGS.pdf";

/// Fallback stem when a name has no usable characters
pub const FALLBACK_STEM: &str = "Client";

/// Reduce `s` to an ASCII slug.
///
/// Decomposes with NFKD, replaces every non-ASCII character (combining marks
/// included) with `_`, collapses runs of `_` and whitespace into one `_`, and
/// trims underscores from both ends. ASCII characters are kept as they are.
/// Returns `fallback` if nothing is left.
pub fn ascii_slug(s: &str, fallback: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut in_separator_run = false;

    for c in s.nfkd() {
        let c = if c.is_ascii() { c } else { '_' };
        if c == '_' || c.is_ascii_whitespace() || c == '\x0B' {
            if !in_separator_run {
                slug.push('_');
            }
            in_separator_run = true;
        } else {
            slug.push(c);
            in_separator_run = false;
        }
    }

    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug.to_string()
    }
}

/// `<slug>_HGS.pdf` for a client name.
///
/// Path separators become `_` so the result is always a single path component.
pub fn document_file_name(name: &str) -> String {
    let name = name.replace(['/', '\\'], "_");
    format!("{}{}", ascii_slug(&name, FALLBACK_STEM), FILE_SUFFIX)
}
