//! The fixed evidence category table.
//!
//! Wire tokens (`category1`..`category4`) are what clients put in multipart
//! field names. Labels are what ends up in object paths and evidence rows and
//! are consumed downstream verbatim, spaces and casing included.

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// One of the four evidence classification buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Weight,
    WeightUom,
    PackagingType,
    MaterialType,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Weight,
        Category::WeightUom,
        Category::PackagingType,
        Category::MaterialType,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Category::Weight => "Weight",
            Category::WeightUom => "weightUOM",
            Category::PackagingType => "Packaging Type",
            Category::MaterialType => "Material Type",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

const STANDARD_ENTRIES: [(&str, Category); 4] = [
    ("category1", Category::Weight),
    ("category2", Category::WeightUom),
    ("category3", Category::PackagingType),
    ("category4", Category::MaterialType),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("file field suffix must not be empty")]
    EmptySuffix,
    #[error("wire token must not be empty")]
    EmptyToken,
    #[error("wire token '{0}' is mapped more than once")]
    DuplicateToken(String),
    #[error("category '{0}' is mapped more than once")]
    DuplicateCategory(Category),
    #[error("category '{0}' has no wire token")]
    MissingCategory(Category),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryEntry {
    pub wire_token: String,
    pub category: Category,
}

/// How a multipart field name is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind<'a> {
    /// A plain component attribute.
    Attribute,
    /// A file field for a known category.
    Files(Category),
    /// A file field whose token is not in the schema.
    UnknownFiles(&'a str),
}

/// Validated mapping from wire tokens to categories.
///
/// Built once at startup and shared read-only through application state.
#[derive(Debug, Clone)]
pub struct CategorySchema {
    entries: Vec<CategoryEntry>,
    file_field_suffix: String,
}

impl CategorySchema {
    /// The standard `category1..category4` table.
    pub fn standard(file_field_suffix: &str) -> Result<Self, SchemaError> {
        Self::new(
            STANDARD_ENTRIES
                .iter()
                .map(|(token, category)| CategoryEntry {
                    wire_token: token.to_string(),
                    category: *category,
                })
                .collect(),
            file_field_suffix,
        )
    }

    /// Build a schema. Every category must be mapped by exactly one token.
    pub fn new(entries: Vec<CategoryEntry>, file_field_suffix: &str) -> Result<Self, SchemaError> {
        if file_field_suffix.is_empty() {
            return Err(SchemaError::EmptySuffix);
        }
        for (i, entry) in entries.iter().enumerate() {
            if entry.wire_token.is_empty() {
                return Err(SchemaError::EmptyToken);
            }
            let earlier = &entries[..i];
            if earlier.iter().any(|e| e.wire_token == entry.wire_token) {
                return Err(SchemaError::DuplicateToken(entry.wire_token.clone()));
            }
            if earlier.iter().any(|e| e.category == entry.category) {
                return Err(SchemaError::DuplicateCategory(entry.category));
            }
        }
        if let Some(missing) = Category::ALL
            .into_iter()
            .find(|c| !entries.iter().any(|e| e.category == *c))
        {
            return Err(SchemaError::MissingCategory(missing));
        }

        Ok(Self {
            entries,
            file_field_suffix: file_field_suffix.to_string(),
        })
    }

    /// Categories in schema order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.entries.iter().map(|e| e.category)
    }

    pub fn resolve_token(&self, token: &str) -> Option<Category> {
        self.entries
            .iter()
            .find(|e| e.wire_token == token)
            .map(|e| e.category)
    }

    /// Each category with the multipart field name clients post its files under.
    pub fn file_fields(&self) -> impl Iterator<Item = (Category, String)> + '_ {
        self.entries
            .iter()
            .map(|e| (e.category, format!("{}{}", e.wire_token, self.file_field_suffix)))
    }

    pub fn classify_field<'a>(&self, field_name: &'a str) -> FieldKind<'a> {
        match field_name.strip_suffix(self.file_field_suffix.as_str()) {
            Some(token) => match self.resolve_token(token) {
                Some(category) => FieldKind::Files(category),
                None => FieldKind::UnknownFiles(token),
            },
            None => FieldKind::Attribute,
        }
    }
}
