/// Splits raw narrative text into paragraphs separated by blank lines.
///
/// Lines are trimmed; the surviving lines of one paragraph are joined with `\n`.
pub fn segment_paragraphs(raw: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                segments.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        segments.push(current.join("\n"));
    }

    segments
}

/// Splits `Name: text` (ASCII or full-width colon) at the first colon.
pub fn split_speaker_prefix(segment: &str) -> Option<(&str, &str)> {
    let (idx, colon) = segment
        .char_indices()
        .find(|(_, c)| *c == ':' || *c == '：')?;
    let name = segment[..idx].trim();
    if name.is_empty() {
        return None;
    }
    let rest = segment[idx + colon.len_utf8()..].trim();
    Some((name, rest))
}

#[cfg(test)]
#[path = "tests/text_tests.rs"]
mod tests;
