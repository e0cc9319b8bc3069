//! A small selector language: compound simple selectors and comma lists.
//!
//! Supported forms are `tag`, `#id`, `.class` and any compound of them such
//! as `li.menu-item.active`, plus comma-separated alternatives. Combinators
//! and attribute selectors are rejected.

use std::str::FromStr;

use crate::error::{DomError, Result};

/// What a selector needs to know about a node.
pub trait Element {
    fn tag(&self) -> &str;
    fn element_id(&self) -> Option<&str>;
    fn has_class(&self, class: &str) -> bool;
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Compound>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = |reason: &str| DomError::InvalidSelector {
            selector: input.to_string(),
            reason: reason.to_string(),
        };

        let mut alternatives = Vec::new();
        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(invalid("empty selector"));
            }
            alternatives.push(Compound::parse(part).map_err(invalid)?);
        }
        Ok(Self { alternatives })
    }

    /// Whether `element` matches any alternative.
    pub fn matches<E: Element + ?Sized>(&self, element: &E) -> bool {
        self.alternatives.iter().any(|c| c.matches(element))
    }
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Compound {
    fn parse(input: &str) -> std::result::Result<Self, &'static str> {
        let mut compound = Compound::default();
        let mut rest = input;

        let tag_len = rest.find(['#', '.']).unwrap_or(rest.len());
        if tag_len > 0 {
            let tag = &rest[..tag_len];
            if tag != "*" {
                check_ident(tag)?;
                compound.tag = Some(tag.to_ascii_lowercase());
            }
            rest = &rest[tag_len..];
        }

        while let Some(marker) = rest.chars().next() {
            let body = &rest[1..];
            let len = body.find(['#', '.']).unwrap_or(body.len());
            let name = &body[..len];
            check_ident(name)?;
            match marker {
                '#' if compound.id.is_some() => return Err("more than one id"),
                '#' => compound.id = Some(name.to_string()),
                _ => compound.classes.push(name.to_string()),
            }
            rest = &body[len..];
        }

        Ok(compound)
    }

    fn matches<E: Element + ?Sized>(&self, element: &E) -> bool {
        if let Some(tag) = &self.tag {
            if !element.tag().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.element_id() != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| element.has_class(c))
    }
}

fn check_ident(name: &str) -> std::result::Result<(), &'static str> {
    if name.is_empty() {
        return Err("empty name");
    }
    if name.chars().any(char::is_whitespace) {
        return Err("combinators are not supported");
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("unsupported character");
    }
    Ok(())
}
