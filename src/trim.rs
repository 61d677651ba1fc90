//! locating the non-whitespace span of a source line

/// Byte indices of the first and the last non-whitespace character of `line`.
///
/// Both indices point at the start of the character, so `&line[first..=last]`
/// is only valid for single-byte characters; use [`trimmed`] to get the span.
/// Returns `None` for an empty or all-whitespace line.
pub fn first_last_non_space(line: &str) -> Option<(usize, usize)> {
    let first = line.char_indices().find(|(_, c)| !c.is_whitespace())?.0;
    let last = line
        .char_indices()
        .rev()
        .find(|(_, c)| !c.is_whitespace())?
        .0;
    Some((first, last))
}

/// the non-whitespace span of `line`
pub fn trimmed(line: &str) -> Option<&str> {
    let (first, last) = first_last_non_space(line)?;
    let end = last + line[last..].chars().next().map_or(0, char::len_utf8);
    Some(&line[first..end])
}

/// Section name declared by a boundary line, `[name]` after trimming.
///
/// The name is everything strictly between the brackets, untrimmed.
pub fn section_marker(line: &str) -> Option<&str> {
    let span = trimmed(line)?;
    if span.len() >= 2 && span.starts_with('[') && span.ends_with(']') {
        Some(&span[1..span.len() - 1])
    } else {
        None
    }
}
