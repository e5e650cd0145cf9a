use crate::config::StatusConfig;
use crate::conversation::Presence;

/// Why a turn was not allowed to change presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Veto {
    Question,
    SecondPerson,
    Hypothetical,
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .map(|needle| needle.to_lowercase())
        .any(|needle| !needle.is_empty() && contains_marker(haystack, &needle))
}

/// Substring match, except that an ASCII word edge of `needle` must sit on
/// a word boundary in `haystack`. "you" matches "you're" but not "young".
fn contains_marker(haystack: &str, needle: &str) -> bool {
    let is_word = |ch: char| ch.is_ascii_alphanumeric();
    let open_start = needle.chars().next().is_some_and(is_word);
    let open_end = needle.chars().next_back().is_some_and(is_word);

    haystack.match_indices(needle).any(|(start, found)| {
        let before_ok = !open_start || !haystack[..start].chars().next_back().is_some_and(is_word);
        let after_ok =
            !open_end || !haystack[start + found.len()..].chars().next().is_some_and(is_word);
        before_ok && after_ok
    })
}

fn veto(text: &str, config: &StatusConfig) -> Option<Veto> {
    if contains_any(text, &config.interrogatives) {
        Some(Veto::Question)
    } else if contains_any(text, &config.second_person_markers) {
        Some(Veto::SecondPerson)
    } else if contains_any(text, &config.hypothetical_markers) {
        Some(Veto::Hypothetical)
    } else {
        None
    }
}

/// Presence implied by a completed turn, or `None` to leave it unchanged.
///
/// A question, a remark about the player, or anything hypothetical never
/// flips presence. Offline wins over busy.
pub fn classify(text: &str, config: &StatusConfig) -> Option<Presence> {
    if !config.enabled {
        return None;
    }
    let text = text.to_lowercase();

    if let Some(reason) = veto(&text, config) {
        tracing::trace!(?reason, "presence classification vetoed");
        return None;
    }

    if contains_any(&text, &config.offline_keywords) {
        Some(Presence::Offline)
    } else if contains_any(&text, &config.busy_keywords) {
        Some(Presence::Busy)
    } else {
        None
    }
}
