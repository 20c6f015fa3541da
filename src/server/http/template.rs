//! Route templates such as `/api/sum/:val1/:val2`.
//!
//! A template's identity as a lookup key is its *skeleton*: the segment count
//! plus every fixed segment and its position. Variable names do not take part,
//! so `/api/:id` and `/api/:name` are the same key.

use {
    std::{
        fmt,
        hash::{Hash, Hasher},
    },
    super::req::Req,
};

const VARIABLE_PREFIX: char = ':';

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Fixed(String),
    Variable(String),
}

impl Segment {
    fn parse(token: &str) -> Self {
        match token.strip_prefix(VARIABLE_PREFIX) {
            Some(name) => Segment::Variable(name.to_string()),
            None => Segment::Fixed(token.to_string()),
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Segment::Variable(_))
    }

    pub fn text(&self) -> &str {
        match self {
            Segment::Fixed(s) | Segment::Variable(s) => s,
        }
    }
}

#[derive(Clone, Debug)]
pub struct UrlTemplate {
    template: String,
    segments: Vec<Segment>,
}

/// Splits a path on `/`, dropping the empty tokens left by leading, trailing
/// or repeated separators.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|t| !t.is_empty())
}

impl UrlTemplate {
    pub fn parse(template: &str) -> Self {
        Self {
            template: template.to_string(),
            segments: split_path(template).map(Segment::parse).collect(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn has_variables(&self) -> bool {
        self.segments.iter().any(Segment::is_variable)
    }

    fn fixed_segments(&self) -> impl Iterator<Item = (usize, &str)> {
        self.segments.iter().enumerate().filter_map(|(i, s)| match s {
            Segment::Fixed(text) => Some((i, text.as_str())),
            Segment::Variable(_) => None,
        })
    }

    /// Key equality: same segment count and the same fixed text at the same
    /// positions. Variable names are ignored.
    pub fn same_skeleton(&self, other: &UrlTemplate) -> bool {
        self.len() == other.len() && self.fixed_segments().eq(other.fixed_segments())
    }

    /// Whether a concrete path fits this template. Fixed segments compare
    /// case-sensitively; variable segments accept anything.
    pub fn matches(&self, path: &str) -> bool {
        let tokens: Vec<&str> = split_path(path).collect();
        self.matches_tokens(&tokens)
    }

    pub(crate) fn matches_tokens(&self, tokens: &[&str]) -> bool {
        if tokens.len() != self.segments.len() {
            return false;
        }
        self.segments.iter().zip(tokens).all(|(segment, token)| match segment {
            Segment::Fixed(text) => text == token,
            Segment::Variable(_) => true,
        })
    }

    /// Copies the path text under each variable segment into the request's
    /// path variables. The path is assumed to match.
    pub fn bind_variables(&self, path: &str, req: &mut Req) {
        if !self.has_variables() {
            return;
        }
        for (segment, token) in self.segments.iter().zip(split_path(path)) {
            if let Segment::Variable(name) = segment {
                req.add_path_var(name, token);
            }
        }
    }
}

impl PartialEq for UrlTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.same_skeleton(other)
    }
}

impl Eq for UrlTemplate {}

impl Hash for UrlTemplate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for fixed in self.fixed_segments() {
            fixed.hash(state);
        }
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.template)
    }
}
