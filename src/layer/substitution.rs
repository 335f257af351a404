//! `${key}` substitution against the merged configuration.
//!
//! ## Syntax
//!
//! - `${key}` - replaced by the resolved value of `key`. Falls back to the
//!   environment variable named `key`; error if neither exists.
//! - `${?key}` - same, but expands to an empty string when nothing is found.
//!
//! References are resolved through nested keys on an explicit work stack.
//! A cycle is reported as soon as a key already on the stack is revisited.

use std::collections::{HashMap, HashSet};

use crate::error::{ConfigError, Result};
use crate::source::PropertyMap;

/// Lookup of values that are not defined in any layer.
pub trait EnvSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A fixed environment, handy for tests and embedding.
impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// A single `${...}` occurrence inside a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Reference { key: &'a str, optional: bool },
}

fn parse_segments<'a>(owner: &str, text: &'a str) -> Result<Vec<Segment<'a>>> {
    let mut segments = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("${") {
        if start > 0 {
            segments.push(Segment::Literal(&rest[..start]));
        }
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| ConfigError::InvalidValue {
            key: owner.to_string(),
            message: format!("unterminated substitution in {text:?}"),
        })?;

        let inner = after[..end].trim();
        let (key, optional) = match inner.strip_prefix('?') {
            Some(key) => (key.trim(), true),
            None => (inner, false),
        };
        if key.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: owner.to_string(),
                message: format!("empty substitution in {text:?}"),
            });
        }
        segments.push(Segment::Reference { key, optional });
        rest = &after[end + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    Ok(segments)
}

/// One key whose raw value is partway through expansion.
struct Frame<'a> {
    key: &'a str,
    segments: Vec<Segment<'a>>,
    next: usize,
    out: String,
}

impl<'a> Frame<'a> {
    fn new(key: &'a str, raw: &'a str) -> Result<Self> {
        Ok(Self {
            key,
            segments: parse_segments(key, raw)?,
            next: 0,
            out: String::with_capacity(raw.len()),
        })
    }
}

/// Resolves substitutions against one merged property map.
///
/// Results are memoized, so each key is expanded at most once.
pub struct Substitutor<'a> {
    merged: &'a PropertyMap,
    env: &'a dyn EnvSource,
    resolved: HashMap<String, String>,
}

impl<'a> Substitutor<'a> {
    pub fn new(merged: &'a PropertyMap, env: &'a dyn EnvSource) -> Self {
        Self {
            merged,
            env,
            resolved: HashMap::new(),
        }
    }

    /// Fully resolved value of `key`, or `None` if the merged map lacks it.
    ///
    /// Reference chains are followed on a heap-allocated work stack, so an
    /// arbitrarily long chain or cycle never grows the thread's stack.
    pub fn resolve_key(&mut self, key: &str) -> Result<Option<String>> {
        if let Some(value) = self.resolved.get(key) {
            return Ok(Some(value.clone()));
        }
        let merged = self.merged;
        let Some((key, raw)) = merged.get_key_value(key) else {
            return Ok(None);
        };

        let mut stack = vec![Frame::new(key, raw)?];
        let mut active: HashSet<&'a str> = HashSet::from([key.as_str()]);

        while let Some(frame) = stack.last_mut() {
            if frame.next == frame.segments.len() {
                let Some(done) = stack.pop() else { break };
                active.remove(done.key);
                self.resolved.insert(done.key.to_string(), done.out.clone());
                match stack.last_mut() {
                    Some(parent) => {
                        parent.out.push_str(&done.out);
                        parent.next += 1;
                    }
                    None => return Ok(Some(done.out)),
                }
                continue;
            }

            let segment = frame.segments[frame.next];
            match segment {
                Segment::Literal(literal) => {
                    frame.out.push_str(literal);
                    frame.next += 1;
                }
                Segment::Reference { key: reference, optional } => {
                    if let Some(value) = self.resolved.get(reference) {
                        frame.out.push_str(value);
                        frame.next += 1;
                    } else if let Some((reference, raw)) = merged.get_key_value(reference) {
                        if active.contains(reference.as_str()) {
                            let start = stack
                                .iter()
                                .position(|f| f.key == reference.as_str())
                                .unwrap_or(0);
                            let mut chain: Vec<String> =
                                stack[start..].iter().map(|f| f.key.to_string()).collect();
                            chain.push(reference.clone());
                            return Err(ConfigError::CyclicReference { chain });
                        }
                        active.insert(reference.as_str());
                        stack.push(Frame::new(reference, raw)?);
                    } else {
                        match self.env.get(reference) {
                            Some(value) => frame.out.push_str(&value),
                            None if optional => {}
                            None => {
                                return Err(ConfigError::UnresolvedReference {
                                    key: frame.key.to_string(),
                                    reference: reference.to_string(),
                                })
                            }
                        }
                        frame.next += 1;
                    }
                }
            }
        }

        Ok(None)
    }

    /// Expand every reference in `text`, which is the raw value of `owner`.
    pub fn expand(&mut self, owner: &str, text: &str) -> Result<String> {
        if !text.contains("${") {
            return Ok(text.to_string());
        }

        let mut out = String::with_capacity(text.len());
        for segment in parse_segments(owner, text)? {
            match segment {
                Segment::Literal(literal) => out.push_str(literal),
                Segment::Reference { key, optional } => {
                    let value = match self.resolve_key(key)? {
                        Some(value) => Some(value),
                        None => self.env.get(key),
                    };
                    match value {
                        Some(value) => out.push_str(&value),
                        None if optional => {}
                        None => {
                            return Err(ConfigError::UnresolvedReference {
                                key: owner.to_string(),
                                reference: key.to_string(),
                            })
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    /// Resolve every key of the merged map.
    pub fn resolve_all(&mut self) -> Result<PropertyMap> {
        let merged = self.merged;
        let mut out = PropertyMap::new();
        for key in merged.keys() {
            if let Some(value) = self.resolve_key(key)? {
                out.insert(key.clone(), value);
            }
        }
        Ok(out)
    }
}
