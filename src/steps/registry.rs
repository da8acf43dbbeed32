//! Ordered registry mapping step phrases to handlers.
//!
//! A phrase is literal text with `{placeholder}` slots. Matching is exact on
//! the literal parts; each slot captures a non-empty run of text, with one
//! pair of surrounding quotes removed. Definitions are tried in registration
//! order and the first match wins.
//!
//! Phrases are compiled once, when the registry is built.

use std::fmt;

use regex::Regex;
use tracing::debug;

use super::ScenarioContext;
use crate::error::{PhraseError, StepError};

/// The Gherkin keyword a phrase is documented under.
///
/// Matching ignores keywords, so `And` and `But` steps resolve like any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKeyword {
    /// Precondition.
    Given,
    /// Action.
    When,
    /// Postcondition.
    Then,
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
        })
    }
}

/// Values captured from a step's text, by placeholder name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepArgs {
    values: Vec<(String, String)>,
}

impl StepArgs {
    /// The value bound to placeholder `name`.
    ///
    /// # Errors
    ///
    /// Returns `StepError::MissingArgument` if the phrase has no such slot.
    pub fn get(&self, name: &str) -> Result<&str, StepError> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| StepError::MissingArgument {
                name: name.to_owned(),
            })
    }

    /// Number of captured values.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was captured.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Signature shared by every step handler.
pub type StepHandler = fn(&mut ScenarioContext, &StepArgs) -> Result<(), StepError>;

/// A step phrase compiled to an anchored regular expression.
///
/// Each `{name}` slot becomes a lazy named capture group, so earlier slots
/// bind the shortest text that still lets the rest of the phrase match.
/// Braces that do not enclose an identifier are literal text.
#[derive(Debug, Clone)]
pub struct StepPattern {
    regex: Regex,
}

impl StepPattern {
    /// Compile `phrase`.
    ///
    /// # Errors
    ///
    /// Returns `PhraseError` if the phrase repeats a slot name or the
    /// resulting expression cannot be compiled.
    pub fn parse(phrase: &str) -> Result<Self, PhraseError> {
        let invalid = |error: regex::Error| PhraseError {
            phrase: phrase.to_owned(),
            message: error.to_string(),
        };
        let slot = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").map_err(invalid)?;

        let mut source = String::from("^");
        let mut literal_start = 0;
        for captures in slot.captures_iter(phrase) {
            let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let literal = phrase.get(literal_start..whole.start()).unwrap_or_default();
            source.push_str(&regex::escape(literal));
            source.push_str(&format!("(?P<{}>.+?)", name.as_str()));
            literal_start = whole.end();
        }
        source.push_str(&regex::escape(phrase.get(literal_start..).unwrap_or_default()));
        source.push('$');

        let regex = Regex::new(&source).map_err(invalid)?;
        Ok(Self { regex })
    }

    /// Match `text` against the pattern, returning the captured values.
    #[must_use]
    pub fn captures(&self, text: &str) -> Option<StepArgs> {
        let captures = self.regex.captures(text.trim())?;
        let values = self
            .regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                captures
                    .name(name)
                    .map(|value| (name.to_owned(), unquote(value.as_str())))
            })
            .collect();
        Some(StepArgs { values })
    }
}

fn unquote(value: &str) -> String {
    let trimmed = value.trim();
    ['"', '\'']
        .iter()
        .find_map(|quote| {
            trimmed
                .strip_prefix(*quote)
                .and_then(|inner| inner.strip_suffix(*quote))
        })
        .unwrap_or(trimmed)
        .to_owned()
}

/// One registered step.
#[derive(Debug, Clone)]
pub struct StepDefinition {
    keyword: StepKeyword,
    phrase: String,
    pattern: StepPattern,
    handler: StepHandler,
}

impl StepDefinition {
    /// The keyword the phrase is documented under.
    #[must_use]
    pub const fn keyword(&self) -> StepKeyword {
        self.keyword
    }

    /// The phrase as registered, with placeholders.
    #[must_use]
    pub const fn phrase(&self) -> &str {
        self.phrase.as_str()
    }
}

/// Ordered collection of step definitions.
#[derive(Debug, Clone, Default)]
pub struct StepRegistry {
    definitions: Vec<StepDefinition>,
}

/// Collects phrases in match order and compiles them into a [`StepRegistry`].
#[derive(Debug, Clone, Default)]
pub struct StepRegistryBuilder {
    entries: Vec<(StepKeyword, String, StepHandler)>,
}

impl StepRegistryBuilder {
    /// Append a phrase; earlier phrases take precedence.
    #[must_use]
    pub fn with(mut self, keyword: StepKeyword, phrase: &str, handler: StepHandler) -> Self {
        self.entries.push((keyword, phrase.to_owned(), handler));
        self
    }

    /// Compile every phrase.
    ///
    /// # Errors
    ///
    /// Returns the first `PhraseError` encountered.
    pub fn build(self) -> Result<StepRegistry, PhraseError> {
        let definitions = self
            .entries
            .into_iter()
            .map(|(keyword, phrase, handler)| {
                let pattern = StepPattern::parse(&phrase)?;
                Ok(StepDefinition {
                    keyword,
                    phrase,
                    pattern,
                    handler,
                })
            })
            .collect::<Result<_, PhraseError>>()?;
        Ok(StepRegistry { definitions })
    }
}

impl StepRegistry {
    /// Start collecting phrases.
    #[must_use]
    pub fn builder() -> StepRegistryBuilder {
        StepRegistryBuilder::default()
    }

    /// All definitions in match order.
    #[must_use]
    pub const fn definitions(&self) -> &[StepDefinition] {
        self.definitions.as_slice()
    }

    /// The first definition matching `text`, with its captures.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<(&StepDefinition, StepArgs)> {
        self.definitions
            .iter()
            .find_map(|definition| definition.pattern.captures(text).map(|args| (definition, args)))
    }

    /// Run the step matching `text` against `context`.
    ///
    /// # Errors
    ///
    /// Returns `StepError::UndefinedStep` if nothing matches, or the handler's
    /// own failure.
    pub fn execute(&self, context: &mut ScenarioContext, text: &str) -> Result<(), StepError> {
        let (definition, args) = self.find(text).ok_or_else(|| StepError::UndefinedStep {
            text: text.to_owned(),
        })?;
        debug!(step = text, phrase = %definition.phrase, "running step");
        (definition.handler)(context, &args)
    }
}
