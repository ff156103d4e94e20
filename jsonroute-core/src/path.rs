//! Property paths: where in a body a validation failure was detected.

use std::fmt;

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Ordered sequence of keys and indices, rendered as `body:address[0]:city`.
///
/// Extending a path returns a new value, so sibling branches never share one.
#[derive(Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct PropertyPath {
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    /// Path with a single root segment, e.g. `body`.
    pub fn root(name: &str) -> Self {
        Self {
            segments: vec![PathSegment::Key(name.to_owned())],
        }
    }

    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.to_owned()));
        Self { segments }
    }

    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(index));
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// JSON pointer relative to the root segment (`body:login[0]` -> `/login/0`).
    pub fn to_pointer(&self) -> String {
        let mut out = String::new();
        for segment in self.segments.iter().skip(1) {
            out.push('/');
            match segment {
                PathSegment::Key(k) => out.push_str(&k.replace('~', "~0").replace('/', "~1")),
                PathSegment::Index(i) => out.push_str(&i.to_string()),
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        out
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(k) if i == 0 => f.write_str(k)?,
                PathSegment::Key(k) => write!(f, ":{}", k)?,
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}
