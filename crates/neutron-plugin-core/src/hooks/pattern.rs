// # Hook Patterns
//
// A relation expression is literal text interleaved with brace groups:
//
// - `{role:interface}` selects every endpoint the charm declares with that
//   role and interface, and is replaced by the endpoint's relation name
// - `{a,b,c}` is replaced by each of the alternatives in turn
//
// `{provides:neutron-plugin}-relation-{joined,changed}` therefore expands
// to `neutron-plugin-relation-joined` and `neutron-plugin-relation-changed`
// for a charm providing the `neutron-plugin` interface on a relation named
// `neutron-plugin`.

use std::fmt;

use crate::config::{Endpoint, Role};
use crate::error::{Error, Result};

/// One parsed piece of a relation expression
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Endpoint { role: Role, interface: String },
    Alternatives(Vec<String>),
}

/// A concrete hook name produced by expanding a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedHook {
    /// Hook name (e.g., "neutron-plugin-relation-joined")
    pub hook_name: String,
    /// Relation name bound by the endpoint selector, if the pattern has one
    pub relation_name: Option<String>,
}

/// Parsed relation expression
///
/// The original text is kept verbatim so registration tables can be
/// compared against the exact strings the dispatcher expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookPattern {
    source: String,
    segments: Vec<Segment>,
}

impl HookPattern {
    /// Parse a relation expression
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPattern` for empty patterns, unbalanced braces,
    /// unknown roles and empty alternatives.
    pub fn parse(source: &str) -> Result<Self> {
        if source.is_empty() {
            return Err(Error::invalid_pattern("pattern cannot be empty"));
        }

        let mut segments = Vec::new();
        let mut rest = source;

        while !rest.is_empty() {
            match rest.find(['{', '}']) {
                None => {
                    segments.push(Segment::Literal(rest.to_string()));
                    break;
                }
                Some(idx) if rest.as_bytes()[idx] == b'}' => {
                    return Err(Error::invalid_pattern(format!(
                        "unmatched '}}' in {}",
                        source
                    )));
                }
                Some(idx) => {
                    if idx > 0 {
                        segments.push(Segment::Literal(rest[..idx].to_string()));
                    }
                    let group = &rest[idx + 1..];
                    let close = group.find('}').ok_or_else(|| {
                        Error::invalid_pattern(format!("unmatched '{{' in {}", source))
                    })?;
                    let body = &group[..close];
                    if body.contains('{') {
                        return Err(Error::invalid_pattern(format!(
                            "nested braces in {}",
                            source
                        )));
                    }
                    segments.push(Self::parse_group(body, source)?);
                    rest = &group[close + 1..];
                }
            }
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    fn parse_group(body: &str, source: &str) -> Result<Segment> {
        if let Some((role, interface)) = body.split_once(':') {
            let role = Role::parse(role).ok_or_else(|| {
                Error::invalid_pattern(format!("unknown role '{}' in {}", role, source))
            })?;
            if interface.is_empty() {
                return Err(Error::invalid_pattern(format!(
                    "empty interface in {}",
                    source
                )));
            }
            return Ok(Segment::Endpoint {
                role,
                interface: interface.to_string(),
            });
        }

        let alternatives: Vec<String> = body.split(',').map(str::to_string).collect();
        if alternatives.iter().any(String::is_empty) {
            return Err(Error::invalid_pattern(format!(
                "empty alternative in {}",
                source
            )));
        }
        Ok(Segment::Alternatives(alternatives))
    }

    /// The pattern text exactly as written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Expand the pattern into every hook name it covers
    ///
    /// Endpoint selectors that match no declared endpoint make the whole
    /// pattern expand to nothing.
    pub fn expand(&self, endpoints: &[Endpoint]) -> Vec<ExpandedHook> {
        let mut partials = vec![ExpandedHook {
            hook_name: String::new(),
            relation_name: None,
        }];

        for segment in &self.segments {
            let choices: Vec<(String, Option<&str>)> = match segment {
                Segment::Literal(text) => vec![(text.clone(), None)],
                Segment::Alternatives(alts) => alts.iter().map(|a| (a.clone(), None)).collect(),
                Segment::Endpoint { role, interface } => endpoints
                    .iter()
                    .filter(|e| e.role == *role && e.interface == *interface)
                    .map(|e| (e.name.clone(), Some(e.name.as_str())))
                    .collect(),
            };

            partials = partials
                .iter()
                .flat_map(|partial| {
                    choices.iter().map(move |(text, relation)| ExpandedHook {
                        hook_name: format!("{}{}", partial.hook_name, text),
                        relation_name: (*relation)
                            .map(str::to_string)
                            .or_else(|| partial.relation_name.clone()),
                    })
                })
                .collect();
        }

        partials
    }

    /// Find the expansion matching a hook name
    pub fn matches(&self, hook_name: &str, endpoints: &[Endpoint]) -> Option<ExpandedHook> {
        self.expand(endpoints)
            .into_iter()
            .find(|expanded| expanded.hook_name == hook_name)
    }
}

impl fmt::Display for HookPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for HookPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> Vec<Endpoint> {
        vec![
            Endpoint::provides("neutron-plugin", "neutron-plugin"),
            Endpoint::requires("amqp", "rabbitmq"),
        ]
    }

    #[test]
    fn test_expand_joined_changed() {
        let pattern = HookPattern::parse("{provides:neutron-plugin}-relation-{joined,changed}")
            .unwrap();
        let hooks: Vec<String> = pattern
            .expand(&endpoints())
            .into_iter()
            .map(|h| h.hook_name)
            .collect();

        assert_eq!(
            hooks,
            vec![
                "neutron-plugin-relation-joined",
                "neutron-plugin-relation-changed"
            ]
        );
    }

    #[test]
    fn test_expand_binds_relation_name() {
        let endpoints = vec![Endpoint::provides("plugin-a", "neutron-plugin")];
        let pattern = HookPattern::parse("{provides:neutron-plugin}-relation-broken").unwrap();

        let expanded = pattern.matches("plugin-a-relation-broken", &endpoints).unwrap();
        assert_eq!(expanded.relation_name.as_deref(), Some("plugin-a"));
    }

    #[test]
    fn test_role_must_match() {
        let endpoints = vec![Endpoint::requires("neutron-plugin", "neutron-plugin")];
        let pattern = HookPattern::parse("{provides:neutron-plugin}-relation-{joined}").unwrap();
        assert!(pattern.expand(&endpoints).is_empty());
    }

    #[test]
    fn test_literal_only_pattern() {
        let pattern = HookPattern::parse("install").unwrap();
        let expanded = pattern.matches("install", &[]).unwrap();
        assert_eq!(expanded.relation_name, None);
    }

    #[test]
    fn test_invalid_patterns() {
        for bad in [
            "",
            "{provides:neutron-plugin",
            "relation-}",
            "{bogus:neutron-plugin}-relation-joined",
            "{provides:}-relation-joined",
            "x-{joined,}",
            "{a{b}}",
        ] {
            assert!(
                matches!(HookPattern::parse(bad), Err(Error::InvalidPattern(_))),
                "expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_display_is_verbatim() {
        let text = "{provides:neutron-plugin}-relation-{broken,departed}";
        assert_eq!(HookPattern::parse(text).unwrap().to_string(), text);
    }
}
