//! Control paths
//!
//! A path is the sequence of keys and indices leading from a root control to
//! one of its descendants. Paths are relative: the same path can be resolved
//! against any tree, which is what rebinding relies on.

use std::fmt;

/// One step of a control path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// Field name inside a group
    Key(String),
    /// Element position inside an array
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Path from a root control to a descendant
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlPath {
    segments: Vec<PathSegment>,
}

impl ControlPath {
    /// The empty path, addressing the root itself
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a path from segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a dotted path such as `address.zip` or `phones[1].number`.
    ///
    /// Numeric dotted segments (`phones.1`) are read as indices too.
    pub fn parse(raw: &str) -> Self {
        let mut segments = Vec::new();

        for part in raw.split('.').filter(|p| !p.is_empty()) {
            let (name, rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };

            if !name.is_empty() {
                match name.parse::<usize>() {
                    Ok(index) => segments.push(PathSegment::Index(index)),
                    Err(_) => segments.push(PathSegment::Key(name.to_string())),
                }
            }

            for index in rest
                .split(|c| c == '[' || c == ']')
                .filter(|s| !s.is_empty())
            {
                match index.parse::<usize>() {
                    Ok(i) => segments.push(PathSegment::Index(i)),
                    Err(_) => segments.push(PathSegment::Key(index.to_string())),
                }
            }
        }

        Self { segments }
    }

    /// Extend this path by one segment, returning the child path
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for ControlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "$root");
        }

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{}", key)?,
                PathSegment::Key(key) => write!(f, ".{}", key)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}
