//! Deterministic script segmentation and prompt helpers.

use crate::SceneScript;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static WHITESPACE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\s+").expect("static regex"));

/// How a fixed script is cut into scenes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SegmentationRule {
    /// Every non-empty line is one scene
    #[default]
    Lines,
    /// Lines are further split at sentence terminators
    Sentences,
}

/// Split a fixed script into scenes.
///
/// Empty lines and whitespace-only fragments are dropped; runs of internal
/// whitespace collapse to a single space. The output order is the input order.
///
/// # Examples
///
/// ```
/// use reelweave_core::{segment_script, SegmentationRule};
///
/// let script = "Books are quiet teachers.\n\n  They never   hurry you.  \n";
/// let lines = segment_script(script, SegmentationRule::Lines);
/// assert_eq!(lines.len(), 2);
/// assert_eq!(lines.segments[1].narration, "They never hurry you.");
///
/// let sentences = segment_script("One. Two! Three?", SegmentationRule::Sentences);
/// assert_eq!(sentences.len(), 3);
/// ```
pub fn segment_script(script: &str, rule: SegmentationRule) -> SceneScript {
    let narrations: Vec<String> = match rule {
        SegmentationRule::Lines => script
            .lines()
            .map(normalize)
            .filter(|line| !line.is_empty())
            .collect(),
        SegmentationRule::Sentences => script
            .lines()
            .flat_map(split_sentences)
            .map(|sentence| normalize(&sentence))
            .filter(|sentence| !sentence.is_empty())
            .collect(),
    };

    tracing::debug!(
        rule = %rule,
        chars = script.chars().count(),
        segments = narrations.len(),
        "Segmented fixed script"
    );

    SceneScript::from_narrations(narrations)
}

/// Derive a short title from free text.
///
/// Uses the first non-empty line, whitespace-normalized, truncated to
/// `max_chars` characters.
///
/// # Examples
///
/// ```
/// use reelweave_core::derive_title;
///
/// assert_eq!(derive_title("habit of reading", 15), "habit of readin");
/// assert_eq!(derive_title("\n  short \n more", 15), "short");
/// ```
pub fn derive_title(text: &str, max_chars: usize) -> String {
    text.lines()
        .map(normalize)
        .find(|line| !line.is_empty())
        .map(|line| line.chars().take(max_chars).collect::<String>().trim_end().to_string())
        .unwrap_or_default()
}

/// Prepend a style prefix to an image prompt.
///
/// # Examples
///
/// ```
/// use reelweave_core::build_image_prompt;
///
/// assert_eq!(
///     build_image_prompt("a cat reading", Some("watercolor, soft light")),
///     "watercolor, soft light, a cat reading"
/// );
/// assert_eq!(build_image_prompt("a cat reading", Some("  ")), "a cat reading");
/// assert_eq!(build_image_prompt("a cat reading", None), "a cat reading");
/// ```
pub fn build_image_prompt(prompt: &str, style_prefix: Option<&str>) -> String {
    let prompt = prompt.trim();
    match style_prefix.map(str::trim).filter(|prefix| !prefix.is_empty()) {
        Some(prefix) => format!("{}, {}", prefix.trim_end_matches(','), prompt),
        None => prompt.to_string(),
    }
}

fn normalize(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

fn is_cjk_terminator(c: char) -> bool {
    matches!(c, '。' | '！' | '？' | '…')
}

fn is_latin_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | '”' | '’' | '」' | '』' | '）')
}

fn split_sentences(line: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);

        let cjk = is_cjk_terminator(c);
        if !cjk && !is_latin_terminator(c) {
            continue;
        }

        // Absorb trailing terminators and closing quotes into this sentence.
        while let Some(&next) = chars.peek() {
            if is_cjk_terminator(next) || is_latin_terminator(next) || is_closing(next) {
                current.push(next);
                chars.next();
            } else {
                break;
            }
        }

        // Latin terminators only end a sentence before whitespace ("3.14" stays whole).
        if cjk || chars.peek().is_none_or(|next| next.is_whitespace()) {
            sentences.push(std::mem::take(&mut current));
        }
    }

    if !current.trim().is_empty() {
        sentences.push(current);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimals_do_not_split_sentences() {
        let script = segment_script("Pi is 3.14 roughly. Neat.", SegmentationRule::Sentences);
        let narrations: Vec<_> = script.segments.iter().map(|s| s.narration.as_str()).collect();
        assert_eq!(narrations, vec!["Pi is 3.14 roughly.", "Neat."]);
    }

    #[test]
    fn cjk_terminators_split_without_spaces() {
        let script = segment_script("读书使人充实。思考使人深刻！", SegmentationRule::Sentences);
        assert_eq!(script.len(), 2);
        assert_eq!(script.segments[0].narration, "读书使人充实。");
    }

    #[test]
    fn quotes_stay_with_their_sentence() {
        let script = segment_script(r#"She said "read more." Then left."#, SegmentationRule::Sentences);
        assert_eq!(script.segments[0].narration, r#"She said "read more.""#);
        assert_eq!(script.segments[1].narration, "Then left.");
    }

    #[test]
    fn lines_rule_keeps_sentences_together() {
        let script = segment_script("One. Two.\nThree.", SegmentationRule::Lines);
        assert_eq!(script.len(), 2);
    }

    #[test]
    fn blank_script_yields_no_segments() {
        assert!(segment_script(" \n\t\n", SegmentationRule::Lines).is_empty());
        assert!(segment_script("", SegmentationRule::Sentences).is_empty());
    }

    #[test]
    fn title_of_blank_text_is_empty() {
        assert_eq!(derive_title("   ", 10), "");
    }
}
