//! Small text helpers shared by storage and the command line front end.

/// Characters that are not allowed in file names on at least one supported platform.
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Longest file name most file systems accept, in bytes.
const MAX_FILENAME_LEN: usize = 255;

/// Suffix appended to a file name while it is being written.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Makes `name` safe to use as a single path component.
///
/// Forbidden characters are replaced with `_`. Long names lose the end of their stem, on a
/// character boundary, so that the extension survives and the name plus [`PARTIAL_SUFFIX`] still
/// fits in 255 bytes.
///
/// ```
/// use docufetch::format::sanitize_filename;
///
/// assert_eq!(sanitize_filename("a/b:c?.pdf"), "a_b_c_.pdf");
/// ```
pub fn sanitize_filename(name: &str) -> String {
  let cleaned: String =
    name.chars().map(|c| if FORBIDDEN.contains(&c) || c.is_control() { '_' } else { c }).collect();
  let budget = MAX_FILENAME_LEN - PARTIAL_SUFFIX.len();
  if cleaned.len() <= budget {
    return cleaned;
  }
  match cleaned.rsplit_once('.') {
    Some((stem, extension))
      if (1..=5).contains(&extension.len())
        && extension.chars().all(|c| c.is_ascii_alphanumeric()) =>
      format!("{}.{extension}", truncate_at_boundary(stem, budget - extension.len() - 1)),
    _ => truncate_at_boundary(&cleaned, budget).to_string(),
  }
}

/// Renders a byte count with a binary unit, e.g. `1.5 MB`.
///
/// ```
/// use docufetch::format::format_file_size;
///
/// assert_eq!(format_file_size(512), "512 B");
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// ```
pub fn format_file_size(bytes: u64) -> String {
  const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
  if bytes < 1024 {
    return format!("{bytes} B");
  }
  let mut size = bytes as f64;
  let mut unit = 0;
  while size >= 1024.0 && unit < UNITS.len() - 1 {
    size /= 1024.0;
    unit += 1;
  }
  format!("{size:.1} {}", UNITS[unit])
}

/// Shortens `text` to at most `max_chars` characters, marking the cut with `...`.
///
/// ```
/// use docufetch::format::truncate_text;
///
/// assert_eq!(truncate_text("short", 10), "short");
/// assert_eq!(truncate_text("a longer sentence", 8), "a longer...");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> String {
  match text.char_indices().nth(max_chars) {
    Some((cut, _)) => format!("{}...", &text[..cut]),
    None => text.to_string(),
  }
}

/// Collapses runs of whitespace (including newlines) into single spaces.
pub(crate) fn squash_whitespace(text: &str) -> String {
  text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cuts `text` to at most `max_bytes` without splitting a character.
fn truncate_at_boundary(text: &str, max_bytes: usize) -> &str {
  if text.len() <= max_bytes {
    return text;
  }
  let mut end = max_bytes;
  while !text.is_char_boundary(end) {
    end -= 1;
  }
  &text[..end]
}
