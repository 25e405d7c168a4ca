//! Pure argument tokenizer.
//!
//! Converts the tokens following the program and script path into a
//! [`ParseResult`]:
//!
//! 1. The first token names the command; unknown names do not match.
//! 2. Tokens up to the first `--`-prefixed one are command arguments.
//! 3. Each `--`-prefixed token opens an option whose arguments run until the
//!    next `--`-prefixed token.
//!
//! The option region always starts with an option token, so every token
//! after the command name lands somewhere.
//!
//! # Example
//!
//! ```
//! use cli_john::tokenize;
//!
//! let parsed = tokenize(&["deploy", "staging", "--region", "us", "east"], |c| c == "deploy");
//! assert!(parsed.matched);
//! assert_eq!(parsed.command_args, ["staging"]);
//! assert_eq!(parsed.options[0].name, "--region");
//! assert_eq!(parsed.options[0].arguments, ["us", "east"]);
//! ```

use serde::{Deserialize, Serialize};

/// Prefix marking an option token.
pub const OPTION_PREFIX: &str = "--";

/// One option occurrence and the tokens captured after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ParsedOption {
    /// Full option token, prefix included (e.g. `--force`).
    pub name: String,
    /// Tokens up to the next option.
    pub arguments: Vec<String>,
}

/// Structured result of a parse.
///
/// `options` keeps input order, not registration order, and repeats an
/// option each time it appears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ParseResult {
    /// Matched command name (empty when unmatched).
    pub command_name: String,
    /// Positional tokens before the first option.
    pub command_args: Vec<String>,
    /// Options in input order.
    pub options: Vec<ParsedOption>,
    /// Whether the first token named a registered command.
    pub matched: bool,
}

impl ParseResult {
    /// The result for empty input or an unknown command.
    pub fn unmatched() -> Self {
        Self::default()
    }

    /// Returns the first occurrence of an option by full name.
    pub fn option(&self, name: &str) -> Option<&ParsedOption> {
        self.options.iter().find(|o| o.name == name)
    }

    /// Returns `true` if the option appeared at least once.
    pub fn has_option(&self, name: &str) -> bool {
        self.option(name).is_some()
    }

    /// Re-serializes the structure as a token list.
    ///
    /// Tokenizing the output again yields the same command, arguments and
    /// options.
    pub fn to_tokens(&self) -> Vec<String> {
        if !self.matched {
            return Vec::new();
        }
        let mut tokens = Vec::with_capacity(
            1 + self.command_args.len()
                + self
                    .options
                    .iter()
                    .map(|o| 1 + o.arguments.len())
                    .sum::<usize>(),
        );
        tokens.push(self.command_name.clone());
        tokens.extend(self.command_args.iter().cloned());
        for option in &self.options {
            tokens.push(option.name.clone());
            tokens.extend(option.arguments.iter().cloned());
        }
        tokens
    }
}

fn is_option(token: &str) -> bool {
    token.starts_with(OPTION_PREFIX)
}

/// Tokenizes `tokens` against the commands accepted by `is_known`.
///
/// Never fails: empty input and unknown commands both produce
/// [`ParseResult::unmatched`].
pub fn tokenize<S, F>(tokens: &[S], is_known: F) -> ParseResult
where
    S: AsRef<str>,
    F: Fn(&str) -> bool,
{
    let Some((first, rest)) = tokens.split_first() else {
        return ParseResult::unmatched();
    };
    let command_name = first.as_ref();
    if !is_known(command_name) {
        return ParseResult::unmatched();
    }

    let split = rest
        .iter()
        .position(|t| is_option(t.as_ref()))
        .unwrap_or(rest.len());
    let (positional, option_region) = rest.split_at(split);

    let mut options: Vec<ParsedOption> = Vec::new();
    for token in option_region.iter().map(AsRef::as_ref) {
        if is_option(token) {
            options.push(ParsedOption {
                name: token.to_string(),
                arguments: Vec::new(),
            });
        } else if let Some(current) = options.last_mut() {
            current.arguments.push(token.to_string());
        }
    }

    ParseResult {
        command_name: command_name.to_string(),
        command_args: positional.iter().map(|t| t.as_ref().to_string()).collect(),
        options,
        matched: true,
    }
}
