//! Player-facing text: reply layout, help, quick list, greeting.
//!
//! Everything returned here is a list of plain chat lines. Colour decoration with
//! Minecraft `§` codes is cosmetic and switched by [`Palette`].

use std::fmt::Display;

use crate::bridge::reply::ParsedReply;

pub const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━";
pub const TITLE: &str = "[Command AI]";

/// Example queries shown by the quick list, grouped by category.
pub const QUICK_COMMANDS: &[(&str, &[(&str, &str)])] = &[
    (
        "Weather",
        &[
            ("clear weather", "Clear the skies"),
            ("make it rain", "Start rain"),
            ("thunder", "Start a thunderstorm"),
        ],
    ),
    (
        "Time",
        &[
            ("daytime", "Set time to day"),
            ("night", "Set time to night"),
            ("noon", "Set time to noon"),
        ],
    ),
    (
        "Items",
        &[
            ("diamond sword", "Get a diamond sword"),
            ("diamond armor", "Full diamond armor set"),
        ],
    ),
];

const HELP_EXAMPLES: &[&str] = &[
    "give me 10 diamond swords",
    "fill stone with air in a 5 block radius",
    "summon a creeper",
    "make the weather clear",
    "place a torch where I stand",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    color: bool,
}

impl Palette {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("§{code}{text}§r")
        } else {
            text.to_string()
        }
    }

    pub fn rule(&self) -> String {
        self.paint("e", RULE)
    }

    fn banner(&self, code: &str, title: &str) -> Vec<String> {
        vec![self.rule(), self.paint(code, title), self.rule()]
    }
}

/// Lines of a rendered reply, split by how they go out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedReply {
    /// Header and commands, sent straight away.
    pub immediate: Vec<String>,
    /// Explanation and closing rule, handed to paced delivery.
    pub paced: Vec<String>,
}

pub fn render_reply(palette: &Palette, reply: &ParsedReply) -> RenderedReply {
    let mut immediate = palette.banner("a", &format!("{TITLE} Response"));

    let mut any = false;
    for (index, command) in reply.visible_commands().enumerate() {
        if !any {
            immediate.push(palette.paint("b", "▶ Generated commands:"));
            any = true;
        }
        let mut lines = command.lines();
        let first = lines.next().unwrap_or("");
        immediate.push(format!(
            "{} {}",
            palette.paint("7", &format!("{}.", index + 1)),
            palette.paint("e", first)
        ));
        for cont in lines {
            immediate.push(format!("   {}", palette.paint("e", cont)));
        }
        if index == 0 {
            immediate.push(palette.paint("8", "(type it in chat or paste it into a command block)"));
        }
    }
    if any {
        immediate.push(String::new());
    }

    let mut paced: Vec<String> = reply
        .explanation_lines()
        .map(|line| palette.paint("f", line))
        .collect();
    paced.push(palette.rule());

    RenderedReply { immediate, paced }
}

pub fn loading_lines(palette: &Palette) -> Vec<String> {
    vec![
        palette.rule(),
        format!("{} Generating command...", palette.paint("6", TITLE)),
        palette.rule(),
    ]
}

/// Single line reporting a failed request.
pub fn error_line(palette: &Palette, err: &dyn Display) -> String {
    format!(
        "{} Could not get an AI response: {}",
        palette.paint("c", "[Error]"),
        err
    )
}

/// Single line explaining why a query was not sent.
pub fn rejected_line(palette: &Palette, err: &dyn Display) -> String {
    format!("{} {}", palette.paint("c", "[Error]"), err)
}

pub fn help_lines(palette: &Palette, prefixes: &[String]) -> Vec<String> {
    let mut out = palette.banner("6§l", "Command AI Helper");
    out.push(String::new());
    out.push(palette.paint("b", "Usage:"));
    for prefix in prefixes {
        out.push(palette.paint("7", &format!("{prefix} <what you want to do>")));
    }
    out.push(String::new());
    out.push(palette.paint("b", "Examples:"));
    let primary = prefixes.first().map(String::as_str).unwrap_or("");
    for example in HELP_EXAMPLES {
        out.push(palette.paint("7", &format!("{primary} {example}")));
    }
    out.push(String::new());
    out.push(palette.rule());
    out
}

pub fn quick_lines(palette: &Palette, primary: &str) -> Vec<String> {
    let mut out = palette.banner("6", "Quick command categories");
    for (category, entries) in QUICK_COMMANDS {
        out.push(palette.paint("a", &format!("▶ {category}")));
        for (query, desc) in entries.iter() {
            out.push(format!(
                "  {} - {}",
                palette.paint("7", &format!("{primary} {query}")),
                desc
            ));
        }
    }
    out.push(palette.rule());
    out
}

pub fn welcome_lines(palette: &Palette, prefixes: &[String]) -> Vec<String> {
    let triggers = prefixes.join(" or ");
    vec![
        palette.rule(),
        palette.paint("6", "Command AI enabled"),
        palette.paint("7", &format!("Type {triggers} to start")),
        palette.rule(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::reply::parse_reply;

    #[test]
    fn plain_reply_layout() {
        let reply = parse_reply("Use this:\n```\n/give @s diamond_sword 10\n```\nGives you a sword.");
        let out = render_reply(&Palette::plain(), &reply);
        assert_eq!(
            out.immediate,
            vec![
                RULE.to_string(),
                "[Command AI] Response".to_string(),
                RULE.to_string(),
                "▶ Generated commands:".to_string(),
                "1. /give @s diamond_sword 10".to_string(),
                "(type it in chat or paste it into a command block)".to_string(),
                String::new(),
            ]
        );
        assert_eq!(
            out.paced,
            vec!["Use this:", "Gives you a sword.", RULE]
        );
    }

    #[test]
    fn multi_line_command_and_blank_fence() {
        let reply = parse_reply("```\n```\n```\n/time set day\n/weather clear\n```\n```/say hi```");
        let out = render_reply(&Palette::plain(), &reply);
        assert!(out.immediate.contains(&"1. /time set day".to_string()));
        assert!(out.immediate.contains(&"   /weather clear".to_string()));
        assert!(out.immediate.contains(&"2. /say hi".to_string()));
        // Hint only once, after the first command
        let hints = out.immediate.iter().filter(|l| l.starts_with("(type it")).count();
        assert_eq!(hints, 1);
    }

    #[test]
    fn no_commands_no_command_header() {
        let out = render_reply(&Palette::plain(), &parse_reply("Sorry, I can't do that."));
        assert_eq!(out.immediate.len(), 3);
        assert_eq!(out.paced, vec!["Sorry, I can't do that.", RULE]);
    }

    #[test]
    fn colour_codes_wrap_text() {
        let palette = Palette::new(true);
        assert_eq!(palette.rule(), format!("§e{RULE}§r"));
        let line = error_line(&palette, &"boom");
        assert_eq!(line, "§c[Error]§r Could not get an AI response: boom");
    }

    #[test]
    fn help_lists_every_prefix() {
        let prefixes = vec!["!cmd".to_string(), "!커맨드".to_string()];
        let out = help_lines(&Palette::plain(), &prefixes);
        assert!(out.contains(&"!cmd <what you want to do>".to_string()));
        assert!(out.contains(&"!커맨드 <what you want to do>".to_string()));
        assert!(out.contains(&"!cmd summon a creeper".to_string()));
    }

    #[test]
    fn quick_list_uses_primary_prefix() {
        let out = quick_lines(&Palette::plain(), "!cmd");
        assert!(out.contains(&"▶ Weather".to_string()));
        assert!(out.contains(&"  !cmd make it rain - Start rain".to_string()));
    }

    #[test]
    fn rejected_query_line_is_plain_reason() {
        let err = crate::validation::QueryError::Empty;
        let line = rejected_line(&Palette::plain(), &err);
        assert!(line.starts_with("[Error] "));
        assert!(!line.contains("AI response"));
    }
}
