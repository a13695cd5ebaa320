//! Filename sanitization for the download directory.

/// Sanitizes a candidate filename so it stays inside the download directory.
///
/// - Replaces NUL, `/`, `\`, `:` and control characters with `_`
/// - Trims leading/trailing spaces, dots and underscores
/// - Collapses consecutive underscores
/// - Limits length to 255 bytes
pub fn sanitize_filename(name: &str) -> String {
    const NAME_MAX: usize = 255;

    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;

    for c in name.chars() {
        let replacement = if c == '/' || c == '\\' || c == ':' || c.is_control() {
            '_'
        } else {
            c
        };

        if replacement == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(replacement);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c: char| c == ' ' || c == '.' || c == '_');

    let mut take = trimmed.len().min(NAME_MAX);
    while take > 0 && !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    trimmed[..take].to_string()
}
