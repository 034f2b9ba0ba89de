//! Chat trigger recognition: decides which chat lines belong to the bridge.
//!
//! Two prefixes are recognized, a primary (`!cmd`) and a localized alias
//! (`!커맨드`). A prefix followed by whitespace and some text is a query; a bare
//! prefix asks for help. The quick-list keywords (`!quick`, `!퀵`) show canned
//! example queries. Anything else is ordinary chat and must pass through untouched,
//! including lookalikes such as `!cmdfoo`.
use log::trace;

use crate::config::BridgeConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerCommand {
    /// Prefix followed by a request; carries the request with prefix and surrounding whitespace removed.
    Query(String),
    /// Bare prefix.
    Help,
    /// Quick-list keyword.
    QuickList,
    /// Not addressed to the bridge.
    Ignore,
}

impl TriggerCommand {
    /// Whether the host should stop the message from reaching public chat.
    pub fn suppresses_chat(&self) -> bool {
        !matches!(self, TriggerCommand::Ignore)
    }
}

/// Minimal chat trigger parser
#[derive(Debug, Clone)]
pub struct TriggerParser {
    prefixes: Vec<String>,
    quick_keywords: Vec<String>,
}

impl TriggerParser {
    pub fn new() -> Self {
        Self::from_config(&BridgeConfig::default())
    }

    pub fn from_config(cfg: &BridgeConfig) -> Self {
        // An empty prefix would swallow every chat line
        let prefixes = [&cfg.primary_prefix, &cfg.alias_prefix]
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        let quick_keywords = cfg
            .quick_keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            prefixes,
            quick_keywords,
        }
    }

    /// Primary prefix as shown in help text.
    pub fn primary(&self) -> &str {
        self.prefixes.first().map(String::as_str).unwrap_or("")
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn parse(&self, raw: &str) -> TriggerCommand {
        let text = raw.trim_start();

        if self
            .quick_keywords
            .iter()
            .any(|k| text.trim_end().eq_ignore_ascii_case(k))
        {
            trace!("Parsed QUICK from '{}'", raw);
            return TriggerCommand::QuickList;
        }

        for prefix in &self.prefixes {
            let Some(rest) = strip_prefix_ignore_case(text, prefix) else {
                continue;
            };
            if rest.trim().is_empty() {
                trace!("Parsed HELP from '{}'", raw);
                return TriggerCommand::Help;
            }
            // `!cmdfoo` is somebody else's command
            if rest.chars().next().map(char::is_whitespace).unwrap_or(false) {
                let query = rest.trim();
                trace!("Parsed QUERY '{}' from '{}'", query, raw);
                return TriggerCommand::Query(query.to_string());
            }
        }
        TriggerCommand::Ignore
    }
}

impl Default for TriggerParser {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&text[prefix.len()..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_prefix_respects_char_boundaries() {
        // "!커" cut in the middle of a multibyte char must not panic
        assert_eq!(strip_prefix_ignore_case("!커맨드", "!ab"), None);
        assert_eq!(strip_prefix_ignore_case("!CMD x", "!cmd"), Some(" x"));
    }

    #[test]
    fn empty_prefixes_are_dropped() {
        let cfg = BridgeConfig {
            alias_prefix: "  ".to_string(),
            ..BridgeConfig::default()
        };
        let parser = TriggerParser::from_config(&cfg);
        assert_eq!(parser.prefixes(), &["!cmd".to_string()]);
        assert_eq!(parser.parse("hello there"), TriggerCommand::Ignore);
    }
}
