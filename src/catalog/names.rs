//! Validated name newtypes for catalog entities.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::Error;

/// A validated, non-empty category name.
///
/// Categories are matched case-insensitively; "dairy" and "Dairy" refer to
/// the same category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create a category name from free text. The input is trimmed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyCategoryName] if `name` is
    /// empty or whitespace-only.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    ///
    /// This function has `_unchecked` in the name but is not `unsafe`, because if the non-empty invariant is violated it will cause incorrect behaviour but not affect memory safety.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated, non-empty vendor name.
///
/// Vendors are matched case-insensitively, same as categories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct VendorName(String);

impl VendorName {
    /// Create a vendor name from free text. The input is trimmed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyVendorName] if `name` is
    /// empty or whitespace-only.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyVendorName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a vendor name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for VendorName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for VendorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated, non-empty product name.
///
/// Product identity is the case-insensitive (name, brand) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct ProductName(String);

impl ProductName {
    /// Create a product name from free text. The input is trimmed.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyProductName] if `name` is
    /// empty or whitespace-only.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyProductName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a product name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for ProductName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ProductName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalize a free-text brand: trim it, and treat an empty or missing brand
/// as absent so that "no brand" compares equal across callers.
pub fn normalize_brand(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|brand| !brand.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use crate::{
        Error,
        catalog::{CategoryName, ProductName, VendorName, normalize_brand},
    };

    #[test]
    fn new_fails_on_empty_string() {
        assert_eq!(CategoryName::new(""), Err(Error::EmptyCategoryName));
        assert_eq!(VendorName::new(""), Err(Error::EmptyVendorName));
        assert_eq!(ProductName::new(""), Err(Error::EmptyProductName));
    }

    #[test]
    fn new_fails_on_just_whitespace() {
        assert_eq!(CategoryName::new("\n\t \r"), Err(Error::EmptyCategoryName));
    }

    #[test]
    fn new_trims_surrounding_whitespace() {
        let name = CategoryName::new("  Dairy  ").unwrap();

        assert_eq!(name.as_ref(), "Dairy");
    }

    #[test]
    fn normalize_brand_treats_blank_as_absent() {
        assert_eq!(normalize_brand(None), None);
        assert_eq!(normalize_brand(Some("")), None);
        assert_eq!(normalize_brand(Some("   ")), None);
        assert_eq!(normalize_brand(Some(" Amul ")), Some("Amul".to_string()));
    }
}
