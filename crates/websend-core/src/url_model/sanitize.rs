//! Filename sanitization for downloaded files.

/// Longest name accepted by common filesystems (bytes).
const NAME_MAX: usize = 255;

/// Makes `name` safe to join onto the download directory.
///
/// Path separators, NUL, control characters and characters Windows refuses
/// (`<>:"|?*`) become `_`. Leading and trailing dots and whitespace are
/// trimmed, so `.` and `..` come back empty. The result is cut to 255 bytes
/// on a char boundary. An empty return means "no usable name".
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim_matches(|c: char| c == '.' || c.is_whitespace());

    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_replaced() {
        assert_eq!(sanitize_filename("../etc/passwd"), "_etc_passwd");
        assert_eq!(sanitize_filename("a\\b.wav"), "a_b.wav");
    }

    #[test]
    fn dot_names_become_empty() {
        assert_eq!(sanitize_filename("."), "");
        assert_eq!(sanitize_filename(".."), "");
        assert_eq!(sanitize_filename("  "), "");
    }

    #[test]
    fn inner_spaces_kept() {
        assert_eq!(sanitize_filename(" my clip.wav "), "my clip.wav");
    }

    #[test]
    fn control_and_reserved_chars() {
        assert_eq!(sanitize_filename("a\u{0}b?c.txt"), "a_b_c.txt");
    }

    #[test]
    fn long_names_truncated_on_boundary() {
        let long = "é".repeat(200);
        let out = sanitize_filename(&long);
        assert!(out.len() <= NAME_MAX);
        assert!(out.chars().all(|c| c == 'é'));
    }
}
