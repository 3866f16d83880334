//! Live-schema introspection: read the enum types currently defined in
//! the database.

use indexmap::IndexMap;
use renum_schema::DeclaredEnumValues;

use crate::Result;
use crate::traced::{Connection, ConnectionExt};

/// One catalog query, filtered by schema and type-kind = enum. Labels are
/// ordered by `enumsortorder`, the ordinal order that drives comparison
/// semantics.
const DEFINED_ENUMS_SQL: &str = "\
SELECT
    t.typname,
    ARRAY(SELECT e.enumlabel
          FROM pg_catalog.pg_enum e
          WHERE e.enumtypid = t.oid
          ORDER BY e.enumsortorder)
FROM pg_catalog.pg_type t
JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace
WHERE
    t.typtype = 'e'
    AND n.nspname = $1";

/// Return the enum types defined in the given database schema, with
/// values in their declared ordinal order.
///
/// Read-only; connection and query errors propagate unmodified (the diff
/// runs inside a migration-authoring step the user re-runs on failure, so
/// nothing is retried here).
pub async fn get_defined_enums<C: Connection>(
    conn: &C,
    schema: &str,
) -> Result<IndexMap<String, Vec<String>>> {
    let rows = conn.traced().query(DEFINED_ENUMS_SQL, &[&schema]).await?;

    let mut definitions = IndexMap::with_capacity(rows.len());
    for row in rows {
        let name: String = row.get(0);
        let values: Vec<String> = row.get(1);
        definitions.insert(name, values);
    }

    tracing::debug!(schema, enums = definitions.len(), "introspected defined enums");
    Ok(definitions)
}

/// Like [`get_defined_enums`], wrapped in the [`DeclaredEnumValues`]
/// aggregate the reconciliation engine consumes. The live side records no
/// column usages; those come from the declared schema.
pub async fn get_defined_enum_values<C: Connection>(
    conn: &C,
    schema: &str,
) -> Result<DeclaredEnumValues> {
    let enum_definitions = get_defined_enums(conn, schema).await?;
    Ok(DeclaredEnumValues {
        enum_definitions,
        table_definitions: Vec::new(),
    })
}
