use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::conversation::Roster;
use crate::directive::DirectiveKind;

static SPEAKER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[?([^\[\]:：\n]{1,32}?)\]?[:：](.*)$").expect("speaker line pattern is valid")
});

/// One attributed chunk of a group turn, before tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerLine {
    pub speaker_id: String,
    pub content: String,
}

/// Splits a multi-speaker group turn into per-speaker lines.
pub struct SpeakerResolver<'a> {
    roster: &'a Roster,
    names: Option<Regex>,
}

impl<'a> SpeakerResolver<'a> {
    pub fn new(roster: &'a Roster) -> Self {
        let mut names: Vec<&str> = roster.iter().flat_map(|p| p.names()).collect();
        names.sort_by_key(|name| std::cmp::Reverse(name.chars().count()));
        names.dedup();

        let names = if names.is_empty() {
            None
        } else {
            let alternation = names
                .iter()
                .map(|name| regex::escape(name))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&format!(r"\[?(?:{alternation})\]?[:：]")).ok()
        };

        Self { roster, names }
    }

    /// Force a line break before every `NAME:` that does not already start
    /// a line. Repairs several speakers emitted on one line.
    pub fn normalize(&self, raw: &str) -> String {
        let Some(names) = &self.names else {
            return raw.to_string();
        };

        let mut out = String::with_capacity(raw.len() + 8);
        let mut last = 0;
        for found in names.find_iter(raw) {
            let start = found.start();
            let before = &raw[..start];
            let needs_break = before.chars().next_back().is_some_and(|prev| {
                prev != '\n'
                    && !prev.is_ascii_alphanumeric()
                    && !matches!(prev, ':' | '：' | '|' | '[')
            }) && !inside_open_bracket(before);
            if needs_break {
                out.push_str(&raw[last..start]);
                out.push('\n');
                last = start;
            }
        }
        out.push_str(&raw[last..]);
        out
    }

    /// Attribute each line to a roster member.
    ///
    /// Lines that name nobody, an unknown name, or the player are merged
    /// into the previous speaker's content, or discarded when nothing
    /// precedes them.
    pub fn resolve(&self, raw: &str) -> Vec<SpeakerLine> {
        let normalized = self.normalize(raw);
        let mut lines: Vec<SpeakerLine> = Vec::new();

        for line in normalized.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match self.match_speaker(line) {
                Some((speaker_id, content)) => lines.push(SpeakerLine {
                    speaker_id,
                    content: content.to_string(),
                }),
                None => {
                    if let Some(previous) = lines.last_mut() {
                        if !previous.content.is_empty() {
                            previous.content.push('\n');
                        }
                        previous.content.push_str(line);
                    } else {
                        tracing::debug!(line, "unattributed group line discarded");
                    }
                }
            }
        }

        lines.retain(|line| !line.content.is_empty());
        lines
    }

    fn match_speaker<'l>(&self, line: &'l str) -> Option<(String, &'l str)> {
        let captures = SPEAKER_LINE.captures(line)?;
        let name = captures.get(1)?.as_str().trim();
        let content = captures.get(2).map_or("", |m| m.as_str().trim());

        if DirectiveKind::from_str(name).is_ok() {
            return None;
        }

        match self.roster.resolve(name) {
            Some(participant) if participant.is_player() => {
                tracing::warn!(name, "model wrote a line as the player; merged");
                None
            }
            Some(participant) => Some((participant.id.clone(), content)),
            None => {
                tracing::debug!(name, "speaker not in roster; merged");
                None
            }
        }
    }
}

/// Whether the current line of `before` ends inside an unclosed `[`.
/// Names quoted within a directive body are content, not speakers.
fn inside_open_bracket(before: &str) -> bool {
    let line = before.rsplit('\n').next().unwrap_or(before);
    let mut depth = 0usize;
    for ch in line.chars() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth > 0
}
