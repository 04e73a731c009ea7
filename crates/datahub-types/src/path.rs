//! Remote addressing for files inside a product.
//!
//! A [`ProductPath`] names a product (id + display name) and, optionally, a
//! `/`-separated location inside it. It is what the remote collaborator
//! receives when asked for a byte range.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::ProductId;

/// Separator used for relative paths inside a product.
pub const SEPARATOR: char = '/';

/// Address of a resource inside a remote product.
///
/// Two paths are equal only when id, name and relative path all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductPath {
    id: ProductId,
    name: String,
    path: Option<String>,
}

impl ProductPath {
    /// Address the root of a product.
    pub fn new(id: impl Into<ProductId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: None,
        }
    }

    /// Address a location inside a product.
    ///
    /// An empty `path` is normalized to the product root.
    pub fn with_path(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        let path = path.into();
        Self {
            id: id.into(),
            name: name.into(),
            path: (!path.is_empty()).then_some(path),
        }
    }

    /// Extend this address by one path segment.
    pub fn join(&self, segment: &str) -> Self {
        if segment.is_empty() {
            return self.clone();
        }
        let path = match &self.path {
            Some(prefix) => format!("{prefix}{SEPARATOR}{segment}"),
            None => segment.to_string(),
        };
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            path: Some(path),
        }
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relative path inside the product, `None` at the product root.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Path segments inside the product (empty at the root).
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path
            .as_deref()
            .into_iter()
            .flat_map(|p| p.split(SEPARATOR))
    }
}

impl fmt::Display for ProductPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.name)?;
        if let Some(path) = &self.path {
            write!(f, "{SEPARATOR}{path}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_covers_all_fields() {
        let base = ProductPath::new("uuid", "filename");
        assert_eq!(base, ProductPath::new("uuid", "filename"));
        assert_ne!(base, ProductPath::new("uuid", "other"));
        assert_ne!(base, ProductPath::new("other", "filename"));
        assert_ne!(base, ProductPath::with_path("uuid", "filename", "sub"));
    }

    #[test]
    fn test_empty_path_is_root() {
        assert_eq!(
            ProductPath::with_path("uuid", "filename", ""),
            ProductPath::new("uuid", "filename")
        );
    }

    #[test]
    fn test_join_accumulates() {
        let base = ProductPath::new("uuid", "filename");
        let nested = base.join("sub_dir1").join("sub_dir2");
        assert_eq!(
            nested,
            ProductPath::with_path("uuid", "filename", "sub_dir1/sub_dir2")
        );
        assert_eq!(nested.segments().collect::<Vec<_>>(), ["sub_dir1", "sub_dir2"]);
        assert_eq!(base.join(""), base);
        assert_eq!(base.segments().count(), 0);
    }

    #[test]
    fn test_display() {
        let path = ProductPath::with_path("uuid", "product.SAFE", "measurement/x.tiff");
        assert_eq!(path.to_string(), "uuid:product.SAFE/measurement/x.tiff");
        assert_eq!(ProductPath::new("uuid", "p").to_string(), "uuid:p");
    }
}
