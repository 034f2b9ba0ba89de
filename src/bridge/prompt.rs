//! Request prompt: the fixed role instructions plus the player's request.

/// Built-in role prompt for Bedrock Edition command generation.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a Minecraft Bedrock Edition command expert.
Listen to the player's request and produce accurate Minecraft commands.

Rules:
1. Commands such as /execute, /give, /summon, /fill and /setblock must follow Bedrock Edition syntax exactly
2. Know the differences between Java Edition and Bedrock Edition and always use Bedrock syntax
3. Give the commands first, then a short explanation
4. Split complex requests into several commands and explain each
5. Wrap every command in a code block (three backticks)
6. Answer kindly and in the same language as the request

Example:
Player: \"Give me 10 diamond swords\"
Answer:
```
/give @s diamond_sword 10
```
This command gives you 10 diamond swords.";

/// One request to the remote service. Built per chat query and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    instructions: String,
    query: String,
}

impl Prompt {
    pub fn new(instructions: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
            query: query.into(),
        }
    }

    /// Prompt using [`DEFAULT_INSTRUCTIONS`].
    pub fn with_default_instructions(query: impl Into<String>) -> Self {
        Self::new(DEFAULT_INSTRUCTIONS, query)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Full text sent upstream.
    pub fn text(&self) -> String {
        format!("{}\n\nUser request: {}", self.instructions, self.query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_joins_instructions_and_query() {
        let p = Prompt::new("Be brief.", "make it day");
        assert_eq!(p.text(), "Be brief.\n\nUser request: make it day");
        assert_eq!(p.query(), "make it day");
    }

    #[test]
    fn default_instructions_ask_for_fences() {
        let p = Prompt::with_default_instructions("x");
        assert!(p.text().contains("three backticks"));
        assert!(p.text().ends_with("User request: x"));
    }
}
