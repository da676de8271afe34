use crate::config::Sanitize;
use unicode_normalization::UnicodeNormalization;

/// Strips comments and blank lines so only code is sent for analysis.
///
/// The comment marker is matched naively: a marker inside a string literal
/// also truncates the line.
pub fn sanitize_code(cfg: &Sanitize, code: &str) -> String {
    let mut text = if cfg.normalize_newlines {
        code.replace("\r\n", "\n")
    } else {
        code.to_string()
    };

    if cfg.normalize_unicode {
        text = text.nfkc().collect::<String>();
    }

    text.split('\n')
        .map(|line| strip_comment(line, &cfg.comment_marker).trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_comment<'a>(line: &'a str, marker: &str) -> &'a str {
    if marker.is_empty() {
        return line;
    }
    match line.find(marker) {
        Some(idx) => &line[..idx],
        None => line,
    }
}
