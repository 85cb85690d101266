//! Catalog row normalization

use crate::catalog::ObjectRow;
use crate::object::{ObjectKind, SchemaObject};

/// Map raw catalog rows to schema objects
///
/// Kind tags are translated to `ObjectKind`; rows carrying an unknown tag or
/// a blank schema/name are skipped. Schema and object names are trimmed,
/// definition text is kept byte-for-byte. Tables always start with an empty
/// definition, which synthesis fills in later.
pub fn normalize(rows: &[ObjectRow]) -> Vec<SchemaObject> {
    rows.iter().filter_map(normalize_row).collect()
}

fn normalize_row(row: &ObjectRow) -> Option<SchemaObject> {
    let Some(kind) = ObjectKind::from_catalog(&row.kind_tag) else {
        tracing::warn!(
            schema = %row.schema,
            name = %row.name,
            kind_tag = %row.kind_tag,
            "skipping object with unsupported kind"
        );
        return None;
    };

    let schema = row.schema.trim();
    let name = row.name.trim();
    if schema.is_empty() || name.is_empty() {
        tracing::warn!(kind = %kind, "skipping object with blank schema or name");
        return None;
    }

    let definition = if kind.needs_synthesis() {
        String::new()
    } else {
        row.definition.clone().unwrap_or_default()
    };

    Some(SchemaObject::new(schema, name, kind, definition))
}
