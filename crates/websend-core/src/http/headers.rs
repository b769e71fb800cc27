//! Response header helpers.

/// Finds the `Content-Disposition` value among raw header lines.
///
/// Lines are as delivered by libcurl (status lines included, CRLF possibly
/// still attached). After a redirect only the last response's headers count,
/// so a status line resets the search.
pub fn content_disposition(lines: &[String]) -> Option<String> {
    let mut found = None;
    for line in lines {
        let line = line.trim();
        if line.starts_with("HTTP/") {
            found = None;
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-disposition") {
                found = Some(value.trim().to_string());
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn finds_disposition_case_insensitively() {
        let l = lines(&[
            "HTTP/1.1 200 OK\r\n",
            "content-disposition: attachment; filename=\"a.wav\"\r\n",
            "Content-Length: 3\r\n",
        ]);
        assert_eq!(
            content_disposition(&l).as_deref(),
            Some("attachment; filename=\"a.wav\"")
        );
    }

    #[test]
    fn redirect_resets_hint() {
        let l = lines(&[
            "HTTP/1.1 302 Found",
            "Content-Disposition: attachment; filename=\"stale.bin\"",
            "Location: /real",
            "",
            "HTTP/1.1 200 OK",
            "Content-Length: 3",
        ]);
        assert_eq!(content_disposition(&l), None);
    }

    #[test]
    fn absent() {
        assert_eq!(content_disposition(&lines(&["HTTP/1.1 200 OK"])), None);
    }
}
