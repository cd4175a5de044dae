use std::fmt;

use storefront_core::{ProductId, ThemeMode};

/// A single line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List(Option<String>),
    Show(ProductId),
    Buy(ProductId),
    Sell(ProductId),
    Owned,
    Balance,
    Draw,
    Reset,
    Theme(ThemeArg),
    Refresh,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeArg {
    Show,
    Set(ThemeMode),
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Unknown(String),
    MissingId(&'static str),
    InvalidId(String),
    InvalidTheme(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("empty command"),
            Self::Unknown(name) => write!(f, "unknown command `{name}`; try `help`"),
            Self::MissingId(name) => write!(f, "`{name}` needs a product id"),
            Self::InvalidId(raw) => write!(f, "`{raw}` is not a product id"),
            Self::InvalidTheme(raw) => write!(f, "`{raw}` is not light, dark or toggle"),
        }
    }
}

pub const HELP: &str = "\
commands:
  list [term]                 products, optionally filtered by title
  show <id>                   product details
  buy <id> | sell <id>        trade a product for coins
  owned                       products you own
  balance                     coin balance
  draw                        open the reward egg
  reset                       forget purchases and restore 500 coins
  theme [light|dark|toggle]   show or change the display preference
  refresh                     reload the catalog
  quit";

impl Command {
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        match name.to_ascii_lowercase().as_str() {
            "" => Err(ParseError::Empty),
            "list" | "ls" | "search" => Ok(Self::List(
                Some(rest.to_string()).filter(|term| !term.is_empty()),
            )),
            "show" => parse_id("show", rest).map(Self::Show),
            "buy" => parse_id("buy", rest).map(Self::Buy),
            "sell" => parse_id("sell", rest).map(Self::Sell),
            "owned" | "mine" => Ok(Self::Owned),
            "balance" | "coins" => Ok(Self::Balance),
            "draw" | "egg" => Ok(Self::Draw),
            "reset" => Ok(Self::Reset),
            "theme" => parse_theme(rest).map(Self::Theme),
            "refresh" => Ok(Self::Refresh),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

fn parse_id(name: &'static str, raw: &str) -> Result<ProductId, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::MissingId(name));
    }
    raw.parse()
        .map_err(|_| ParseError::InvalidId(raw.to_string()))
}

fn parse_theme(raw: &str) -> Result<ThemeArg, ParseError> {
    match raw.to_ascii_lowercase().as_str() {
        "" => Ok(ThemeArg::Show),
        "toggle" => Ok(ThemeArg::Toggle),
        other => ThemeMode::parse(other)
            .map(ThemeArg::Set)
            .ok_or_else(|| ParseError::InvalidTheme(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_with_ids() {
        assert_eq!(Command::parse("buy 3"), Ok(Command::Buy(3)));
        assert_eq!(Command::parse("  SELL   12 "), Ok(Command::Sell(12)));
        assert_eq!(Command::parse("show 1"), Ok(Command::Show(1)));
        assert_eq!(Command::parse("buy"), Err(ParseError::MissingId("buy")));
        assert_eq!(
            Command::parse("buy lamp"),
            Err(ParseError::InvalidId("lamp".to_string()))
        );
    }

    #[test]
    fn list_keeps_multi_word_terms() {
        assert_eq!(Command::parse("list"), Ok(Command::List(None)));
        assert_eq!(
            Command::parse("list slim fit"),
            Ok(Command::List(Some("slim fit".to_string())))
        );
    }

    #[test]
    fn theme_arguments() {
        assert_eq!(Command::parse("theme"), Ok(Command::Theme(ThemeArg::Show)));
        assert_eq!(
            Command::parse("theme Dark"),
            Ok(Command::Theme(ThemeArg::Set(ThemeMode::Dark)))
        );
        assert_eq!(
            Command::parse("theme toggle"),
            Ok(Command::Theme(ThemeArg::Toggle))
        );
        assert!(matches!(
            Command::parse("theme sepia"),
            Err(ParseError::InvalidTheme(_))
        ));
    }

    #[test]
    fn unknown_and_empty_input() {
        assert_eq!(Command::parse("   "), Err(ParseError::Empty));
        assert_eq!(
            Command::parse("fly away"),
            Err(ParseError::Unknown("fly".to_string()))
        );
        assert_eq!(Command::parse("q"), Ok(Command::Quit));
    }
}
