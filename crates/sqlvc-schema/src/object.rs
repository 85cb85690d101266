//! Schema object model
//!
//! Every versioned entity is one `SchemaObject` record carrying a kind tag.
//! The kind only influences where the object lands on disk and whether its
//! DDL has to be synthesized; comparison never looks at it beyond the key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of database objects under version control
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// User table, DDL synthesized from catalog metadata
    Table,
    /// View
    View,
    /// Stored procedure
    Procedure,
    /// Scalar, inline or multi-statement table-valued function
    Function,
    /// DML trigger
    Trigger,
}

impl ObjectKind {
    /// All kinds, in snapshot directory order
    pub const ALL: [ObjectKind; 5] = [
        ObjectKind::Table,
        ObjectKind::View,
        ObjectKind::Procedure,
        ObjectKind::Function,
        ObjectKind::Trigger,
    ];

    /// Singular lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::View => "view",
            Self::Procedure => "procedure",
            Self::Function => "function",
            Self::Trigger => "trigger",
        }
    }

    /// Directory segment used in the on-disk snapshot and in identity keys
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Table => "tables",
            Self::View => "views",
            Self::Procedure => "procedures",
            Self::Function => "functions",
            Self::Trigger => "triggers",
        }
    }

    /// Parse a snapshot directory segment
    pub fn from_dir_name(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.dir_name() == s)
    }

    /// Translate a catalog kind tag into a kind
    ///
    /// Accepts `sys.objects.type` codes (`U`, `V`, `P`, `FN`, `IF`, `TF`, `TR`),
    /// `sys.objects.type_desc` descriptors (`USER_TABLE`, `SQL_STORED_PROCEDURE`, ...)
    /// and the canonical singular or plural names.
    pub fn from_catalog(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_uppercase().as_str() {
            "U" | "USER_TABLE" | "TABLE" | "TABLES" | "BASE TABLE" => Some(Self::Table),
            "V" | "VIEW" | "VIEWS" => Some(Self::View),
            "P" | "SQL_STORED_PROCEDURE" | "PROCEDURE" | "PROCEDURES" | "STORED_PROCEDURE" => {
                Some(Self::Procedure)
            }
            "FN" | "IF" | "TF" | "SQL_SCALAR_FUNCTION" | "SQL_INLINE_TABLE_VALUED_FUNCTION"
            | "SQL_TABLE_VALUED_FUNCTION" | "FUNCTION" | "FUNCTIONS" => Some(Self::Function),
            "TR" | "SQL_TRIGGER" | "TRIGGER" | "TRIGGERS" => Some(Self::Trigger),
            _ => None,
        }
    }

    /// Human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Table => "Table",
            Self::View => "View",
            Self::Procedure => "Procedure",
            Self::Function => "Function",
            Self::Trigger => "Trigger",
        }
    }

    /// Whether the catalog stores no source text for this kind
    pub fn needs_synthesis(&self) -> bool {
        matches!(self, Self::Table)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Identity of a schema object within one snapshot
///
/// Keys compare structurally, so a dot inside a schema or object name can
/// never make two different objects collide.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    pub schema: String,
    pub name: String,
    pub kind: ObjectKind,
}

impl ObjectKey {
    pub fn new(schema: impl Into<String>, name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            kind,
        }
    }

    /// Parse the `schema.name.kind` rendering produced by `Display`
    ///
    /// The schema ends at the first dot and the kind starts after the last
    /// one; anything in between is the name.
    pub fn parse(s: &str) -> Option<Self> {
        let (schema, rest) = s.split_once('.')?;
        let (name, kind) = rest.rsplit_once('.')?;
        if schema.is_empty() || name.is_empty() {
            return None;
        }
        let kind = ObjectKind::from_dir_name(kind).or_else(|| ObjectKind::from_catalog(kind))?;
        Some(Self::new(schema, name, kind))
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.schema, self.name, self.kind)
    }
}

/// A database object under version control
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaObject {
    /// Owning schema
    pub schema: String,
    /// Object name within the schema
    pub name: String,
    /// Object kind
    pub kind: ObjectKind,
    /// Canonical DDL text (stored module text or synthesized table DDL)
    pub definition: String,
}

impl SchemaObject {
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        kind: ObjectKind,
        definition: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            kind,
            definition: definition.into(),
        }
    }

    /// Identity key of this object
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.schema.clone(), self.name.clone(), self.kind)
    }

    /// Whether the definition is still missing (e.g. a table whose
    /// metadata vanished between catalog queries)
    pub fn has_definition(&self) -> bool {
        !self.definition.is_empty()
    }
}
