//! Reply parsing: split a model reply into fenced command blocks and prose.
//!
//! The scanner walks the reply once with two states, outside and inside a
//! triple-backtick fence. Each closed fence yields one command string; the text
//! between fences becomes the explanation. An opener without a closer is not a
//! block, its text stays in the explanation untouched.
//!
//! ```
//! use cmdbridge::bridge::reply::parse_reply;
//!
//! let reply = parse_reply("Use this:\n```\n/give @s diamond_sword 10\n```\nGives you a sword.");
//! assert_eq!(reply.commands, vec!["/give @s diamond_sword 10"]);
//! assert_eq!(reply.explanation, "Use this:\n\nGives you a sword.");
//! ```

const FENCE: &str = "```";
const MAX_TAG_LEN: usize = 24;

/// Result of parsing one reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReply {
    /// Fenced block bodies in order of appearance. May contain empty strings for
    /// blank fences.
    pub commands: Vec<String>,
    /// Reply text with every closed fence removed, trimmed.
    pub explanation: String,
}

impl ParsedReply {
    /// Commands worth showing to a player (blank fences dropped).
    pub fn visible_commands(&self) -> impl Iterator<Item = &str> {
        self.commands
            .iter()
            .map(String::as_str)
            .filter(|c| !c.is_empty())
    }

    /// Non-blank explanation lines, each trimmed.
    pub fn explanation_lines(&self) -> impl Iterator<Item = &str> {
        self.explanation
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Outside,
    /// Inside a fence whose opener starts at the given byte offset.
    Inside(usize),
}

/// Parse a raw reply. Total over every input; never panics.
pub fn parse_reply(raw: &str) -> ParsedReply {
    let mut commands = Vec::new();
    let mut explanation = String::with_capacity(raw.len());
    let mut state = ScanState::Outside;
    // Start of text not yet copied into the explanation
    let mut kept_from = 0;
    let mut cursor = 0;

    while let Some(rel) = raw[cursor..].find(FENCE) {
        let at = cursor + rel;
        match state {
            ScanState::Outside => {
                explanation.push_str(&raw[kept_from..at]);
                state = ScanState::Inside(at);
            }
            ScanState::Inside(open) => {
                commands.push(command_body(&raw[open + FENCE.len()..at]));
                kept_from = at + FENCE.len();
                state = ScanState::Outside;
            }
        }
        cursor = at + FENCE.len();
    }

    // Unterminated opener: everything from it onward is prose
    let tail_from = match state {
        ScanState::Outside => kept_from,
        ScanState::Inside(open) => open,
    };
    explanation.push_str(&raw[tail_from..]);

    ParsedReply {
        commands,
        explanation: explanation.trim().to_string(),
    }
}

/// Tags stripped from the first line of a block wherever that line sits.
const KNOWN_TAGS: [&str; 2] = ["minecraft", "mcfunction"];

/// Trim a fence body and drop a leading language tag line (`minecraft`, `mcfunction`, ...).
fn command_body(body: &str) -> String {
    let trimmed = body.trim();
    if let Some(nl) = trimmed.find('\n') {
        let first = trimmed[..nl].trim_end_matches('\r');
        let strip = if KNOWN_TAGS.contains(&first) {
            true
        } else {
            // Other identifiers only count as tags on the opener line
            tag_on_opener_line(body) && is_language_tag(first)
        };
        if strip {
            return trimmed[nl + 1..].to_string();
        }
    }
    trimmed.to_string()
}

fn tag_on_opener_line(body: &str) -> bool {
    let opener_line = body.split('\n').next().unwrap_or("");
    !opener_line.trim().is_empty()
}

fn is_language_tag(line: &str) -> bool {
    !line.is_empty() && line.len() <= MAX_TAG_LEN && line.chars().all(|c| c.is_ascii_alphabetic())
}
