//! Path templates: literal segments and single-segment `{name}` placeholders

use super::params::PathParams;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("path template must start with '/': {0}")]
    MissingLeadingSlash(String),

    #[error("malformed placeholder '{segment}' in {template}")]
    MalformedPlaceholder { template: String, segment: String },

    #[error("placeholder '{name}' appears twice in {template}")]
    DuplicatePlaceholder { template: String, name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// Parsed path template such as `/api/sketches/{memberName}/{sketchSlug}`.
///
/// Leading and trailing slashes are ignored on both sides, so `/a/b/` and
/// `/a/b` are the same template and match the same paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

pub(crate) fn split_segments(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

impl PathTemplate {
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        if !raw.starts_with('/') {
            return Err(TemplateError::MissingLeadingSlash(raw.to_string()));
        }

        let mut segments = Vec::new();
        for segment in split_segments(raw) {
            let opens = segment.contains('{');
            let closes = segment.contains('}');
            if !opens && !closes {
                segments.push(Segment::Literal(segment.to_string()));
                continue;
            }

            let name = segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .filter(|name| !name.is_empty() && !name.contains(['{', '}']))
                .ok_or_else(|| TemplateError::MalformedPlaceholder {
                    template: raw.to_string(),
                    segment: segment.to_string(),
                })?;

            if segments
                .iter()
                .any(|s| matches!(s, Segment::Param(existing) if existing == name))
            {
                return Err(TemplateError::DuplicatePlaceholder {
                    template: raw.to_string(),
                    name: name.to_string(),
                });
            }
            segments.push(Segment::Param(name.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a request path. Segment counts must be equal, literals must be
    /// identical, placeholders bind whatever single segment is present.
    ///
    /// Segments are percent-decoded before comparison, so `ana%20maria`
    /// binds `ana maria`. A segment that does not decode to UTF-8 matches
    /// nothing.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let parts = split_segments(path);
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::default();
        for (segment, part) in self.segments.iter().zip(parts) {
            let part = urlencoding::decode(part).ok()?;
            match segment {
                Segment::Literal(literal) if *literal == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => params.insert(name.clone(), part.into_owned()),
            }
        }
        Some(params)
    }
}
