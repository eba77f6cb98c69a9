//! Greedy, measurement-driven word wrapping.

/// Wrap `text` into lines no wider than `max_width`, as reported by `measure`.
///
/// - Empty or whitespace-only text yields no lines.
/// - A single word, or text that already fits, is returned as one line. A
///   word wider than `max_width` is never split.
/// - Otherwise words are accumulated greedily: a candidate line is measured
///   before each word is added, and the current line is committed when the
///   candidate would overflow.
///
/// Words are separated on single spaces, so joining the returned lines with
/// `" "` reproduces `text` exactly. Runs of spaces stay attached to the line
/// they follow and never open a line of their own.
///
/// Measurement errors abort the wrap and are returned to the caller.
pub fn wrap_text<E>(
    text: &str,
    max_width: f32,
    mut measure: impl FnMut(&str) -> Result<f32, E>,
) -> Result<Vec<String>, E> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let words: Vec<&str> = text.split(' ').collect();
    if words.len() == 1 || measure(text)? <= max_width {
        return Ok(vec![text.to_string()]);
    }

    let mut lines = Vec::new();
    let mut words = words.into_iter();
    let mut current = words.next().unwrap_or_default().to_string();

    for word in words {
        if word.is_empty() || current.trim().is_empty() {
            current.push(' ');
            current.push_str(word);
            continue;
        }

        let candidate = format!("{} {}", current, word);
        if measure(&candidate)? > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    lines.push(current);

    Ok(lines)
}

/// Vertical offset of line `index` in a block of `count` lines, relative to
/// the block's anchor. Offsets are symmetric so the block is centered.
#[inline]
pub fn line_offset(index: usize, count: usize, line_height: f32) -> f32 {
    index as f32 * line_height - (count.saturating_sub(1)) as f32 * line_height / 2.0
}
