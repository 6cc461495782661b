//! Path templates such as `/book/{book_id}`.
//!
//! A template is a sequence of literal and variable segments. A variable
//! binds exactly one component of the request path; components are split on
//! `/` before percent-decoding, so an encoded slash stays inside its value.

use std::borrow::Cow;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern must start with '/'")]
    MissingLeadingSlash,

    #[error("empty segment at position {0}")]
    EmptySegment(usize),

    #[error("unbalanced braces in segment `{0}`")]
    UnbalancedBraces(String),

    #[error("invalid variable name `{0}`")]
    InvalidVariable(String),

    #[error("variable `{0}` appears more than once")]
    DuplicateVariable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

/// Variable bindings extracted from a matched path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    /// Value bound to `name`, if the template declares it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn is_valid_variable(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Split a request path into raw components. `/` has no components.
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    match path.strip_prefix('/') {
        Some("") | None => Vec::new(),
        Some(rest) => rest.split('/').collect(),
    }
}

impl PathTemplate {
    /// Compile `raw`.
    ///
    /// # Errors
    /// Returns [`PatternError`] when the template is malformed.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let rest = raw
            .strip_prefix('/')
            .ok_or(PatternError::MissingLeadingSlash)?;

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for (position, part) in rest.split('/').enumerate() {
                segments.push(Self::parse_segment(position, part)?);
            }
        }

        let mut seen: Vec<&str> = Vec::new();
        for segment in &segments {
            if let Segment::Variable(name) = segment {
                if seen.contains(&name.as_str()) {
                    return Err(PatternError::DuplicateVariable(name.clone()));
                }
                seen.push(name);
            }
        }

        Ok(Self {
            raw: raw.to_owned(),
            segments,
        })
    }

    fn parse_segment(position: usize, part: &str) -> Result<Segment, PatternError> {
        if part.is_empty() {
            return Err(PatternError::EmptySegment(position));
        }

        match part.strip_prefix('{') {
            Some(inner) => {
                let name = inner
                    .strip_suffix('}')
                    .ok_or_else(|| PatternError::UnbalancedBraces(part.to_owned()))?;
                if name.contains(['{', '}']) {
                    return Err(PatternError::UnbalancedBraces(part.to_owned()));
                }
                if !is_valid_variable(name) {
                    return Err(PatternError::InvalidVariable(name.to_owned()));
                }
                Ok(Segment::Variable(name.to_owned()))
            }
            None if part.contains(['{', '}']) => {
                Err(PatternError::UnbalancedBraces(part.to_owned()))
            }
            None => Ok(Segment::Literal(part.to_owned())),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Declared variable names, in template order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Variable(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Match already split path components against the template.
    pub(crate) fn match_components(&self, components: &[&str]) -> Option<PathParams> {
        if components.len() != self.segments.len() {
            return None;
        }

        let mut params = Vec::new();
        for (segment, component) in self.segments.iter().zip(components) {
            match segment {
                Segment::Literal(literal) => {
                    if decode(component) != literal.as_str() {
                        return None;
                    }
                }
                Segment::Variable(name) => {
                    params.push((name.clone(), decode(component).into_owned()));
                }
            }
        }
        Some(PathParams(params))
    }

    /// Match a request path, returning the variable bindings.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        self.match_components(&split_path(path))
    }

    /// True when both templates accept exactly the same paths.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Variable(_), Segment::Variable(_)) => true,
                    _ => false,
                })
    }

    /// Literal positions, left to right. Larger sorts as more specific.
    pub(crate) fn specificity(&self) -> Vec<bool> {
        self.segments
            .iter()
            .map(|segment| matches!(segment, Segment::Literal(_)))
            .collect()
    }
}

fn decode(component: &str) -> Cow<'_, str> {
    urlencoding::decode(component).unwrap_or(Cow::Borrowed(component))
}
