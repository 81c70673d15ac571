use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// A value that can be walked by path segments.
pub trait Nested {
    /// The child stored under `segment`, if any.
    fn child(&self, segment: &str) -> Option<&Self>;
}

impl Nested for Value {
    /// Objects are indexed by key and arrays by decimal index.
    fn child(&self, segment: &str) -> Option<&Self> {
        match self {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index)),
            _ => None,
        }
    }
}

/// Declaration of one projected field: a flat key and the path it reads.
///
/// The last path segment names the source field; the segments before it name
/// the node of the [`ProjectionTree`](crate::ProjectionTree) that hosts the
/// field's observable.
///
/// # Examples
///
/// ```
/// use tether::Projection;
///
/// let low = Projection::parse("lowH", "meta.image.quality.low.h");
/// assert_eq!(low.host_path(), ["meta", "image", "quality", "low"]);
/// assert_eq!(low.field_name(), Some("h"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Projection {
    key: String,
    path: Vec<String>,
}

impl Projection {
    /// Project `path` under `key`.
    pub fn new<I, S>(key: impl Into<String>, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    /// Project a dotted path (`"meta.image.h"`) under `key`.
    pub fn parse(key: impl Into<String>, dotted: &str) -> Self {
        Self::new(key, dotted.split('.').filter(|segment| !segment.is_empty()))
    }

    /// Project the top-level field `key` under its own name.
    pub fn field(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            path: vec![key.clone()],
            key,
        }
    }

    /// The flat key the projection is published under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Full source path, field name included.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Path of the node hosting the field.
    pub fn host_path(&self) -> &[String] {
        match self.path.split_last() {
            Some((_, host)) => host,
            None => &[],
        }
    }

    /// Name of the source field.
    pub fn field_name(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    /// The path in dotted form.
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }

    /// Find the projected value inside `source`.
    pub fn resolve<'a, V: Nested>(&self, source: &'a V) -> StoreResult<&'a V> {
        if self.path.is_empty() {
            return Err(StoreError::EmptyPath {
                key: self.key.clone(),
            });
        }
        self.path.iter().try_fold(source, |current, segment| {
            current
                .child(segment)
                .ok_or_else(|| StoreError::path_not_found(&self.key, self.dotted()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_objects_and_arrays() {
        let source = json!({ "items": [{ "name": "a" }, { "name": "b" }] });
        let projection = Projection::parse("second", "items.1.name");
        assert_eq!(projection.resolve(&source), Ok(&json!("b")));
    }

    #[test]
    fn missing_path_names_key_and_path() {
        let source = json!({ "meta": {} });
        let err = Projection::parse("h", "meta.image.h")
            .resolve(&source)
            .unwrap_err();
        assert_eq!(err, StoreError::path_not_found("h", "meta.image.h"));
    }

    #[test]
    fn empty_path_is_rejected() {
        let source = json!({});
        let err = Projection::parse("nothing", "").resolve(&source).unwrap_err();
        assert_eq!(
            err,
            StoreError::EmptyPath {
                key: "nothing".into()
            }
        );
    }

    #[test]
    fn top_level_field_is_hosted_at_root() {
        let projection = Projection::field("text");
        assert!(projection.host_path().is_empty());
        assert_eq!(projection.field_name(), Some("text"));
    }
}
