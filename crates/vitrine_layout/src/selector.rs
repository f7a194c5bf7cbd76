//! Element selectors
//!
//! A deliberately small subset of CSS: compound selectors made of an optional
//! tag, an optional `#id` and any number of `.class` parts, grouped with
//! commas. No combinators, no attributes, no pseudo-classes.

use smallvec::SmallVec;
use thiserror::Error;

/// Selector parse failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unsupported character {found:?} in selector {selector:?}")]
    Unsupported { selector: String, found: char },

    #[error("missing name after {0:?}")]
    MissingName(char),
}

/// One compound selector, e.g. `div.card.featured` or `#loader`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: SmallVec<[String; 2]>,
}

impl Selector {
    /// Parse a single compound selector
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SelectorError::Empty);
        }

        let mut selector = Selector::default();
        let mut chars = input.chars().peekable();

        let tag = take_name(&mut chars);
        if !tag.is_empty() {
            selector.tag = Some(tag.to_ascii_lowercase());
        }

        while let Some(marker) = chars.next() {
            let name = take_name(&mut chars);
            match marker {
                '#' | '.' if name.is_empty() => return Err(SelectorError::MissingName(marker)),
                '#' => selector.id = Some(name),
                '.' => selector.classes.push(name),
                found => {
                    return Err(SelectorError::Unsupported {
                        selector: input.to_string(),
                        found,
                    })
                }
            }
        }

        Ok(selector)
    }

    /// Check an element's tag, id and class list against this selector
    pub fn matches<'a>(
        &self,
        tag: &str,
        id: Option<&str>,
        classes: impl Iterator<Item = &'a str> + Clone,
    ) -> bool {
        if let Some(expected) = &self.tag {
            if !expected.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(expected) = &self.id {
            if id != Some(expected.as_str()) {
                return false;
            }
        }
        self.classes
            .iter()
            .all(|class| classes.clone().any(|c| c == class.as_str()))
    }
}

fn take_name(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    name
}

/// Comma-separated group of selectors; matches if any member matches
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorList(pub SmallVec<[Selector; 1]>);

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let selectors = input
            .split(',')
            .map(Selector::parse)
            .collect::<Result<SmallVec<_>, _>>()?;
        Ok(SelectorList(selectors))
    }

    pub fn matches<'a>(
        &self,
        tag: &str,
        id: Option<&str>,
        classes: impl Iterator<Item = &'a str> + Clone,
    ) -> bool {
        self.0
            .iter()
            .any(|selector| selector.matches(tag, id, classes.clone()))
    }
}
