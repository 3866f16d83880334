//! Declared-schema reader: derive the enum state a schema *should* have
//! from the in-memory object graph.

use renum_schema::{DeclaredEnumValues, EnumSource, EnumUsage, Schema};

use crate::Result;

/// Scan every column of every declared table and collect the enums (and
/// their usages) that reside in `schema`.
///
/// A column is attributed to an enum only if its type is, or wraps, an
/// enumerated type, and the type's resident schema (explicit, or
/// `default_schema` when unset) matches the schema under inspection, so
/// cross-schema references are not misattributed. Wrapped enums
/// contribute their bind-processed values, since declared labels and
/// on-the-wire labels may differ.
///
/// Duplicate definitions of one enum name with conflicting value tuples
/// are a contract violation and fail fast.
pub fn get_declared_enums(
    graph: &Schema,
    schema: &str,
    default_schema: &str,
) -> Result<DeclaredEnumValues> {
    let mut declared = DeclaredEnumValues::new();

    for table in graph.iter_tables() {
        for column in &table.columns {
            // Classified once per column; plain builtins carry no schema
            // attribute and are skipped outright.
            let (enum_name, values) = match column.ty.enum_source() {
                EnumSource::NotEnum => continue,
                EnumSource::Direct(e) => (e.name.clone(), e.values.clone()),
                EnumSource::Wrapped(d) => (d.inner.name.clone(), d.database_values()),
            };

            let resident = column.ty.schema().unwrap_or(default_schema);
            if resident != schema {
                continue;
            }

            declared.insert_definition(enum_name.clone(), values)?;
            declared.push_usage(EnumUsage::new(&table.name, &column.name, enum_name));
        }
    }

    tracing::debug!(
        schema,
        enums = declared.enum_definitions.len(),
        usages = declared.table_definitions.len(),
        "collected declared enums"
    );
    Ok(declared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use renum_schema::{Column, ColumnType, DecoratedEnum, EnumType, PgType, Table};

    fn users_table(status_ty: ColumnType) -> Table {
        Table::new(
            "users",
            vec![
                Column::new("id", ColumnType::Plain(PgType::BigInt)),
                Column::new("status", status_ty),
            ],
        )
    }

    #[test]
    fn test_direct_enum_collected_with_usage() {
        let mut graph = Schema::new();
        graph.add_table(users_table(ColumnType::Enum(EnumType::new(
            "user_status",
            ["active", "passive"],
        ))));

        let declared = get_declared_enums(&graph, "public", "public").unwrap();
        assert_eq!(
            declared.enum_definitions["user_status"],
            vec!["active", "passive"]
        );
        assert_eq!(
            declared.table_definitions,
            vec![EnumUsage::new("users", "status", "user_status")]
        );
    }

    #[test]
    fn test_wrapped_enum_uses_bind_processed_values() {
        // Declared labels differ from what goes over the wire; comparing
        // raw declared values against live values would falsely detect
        // drift.
        let decorated = DecoratedEnum::new(
            EnumType::new("user_status", ["Active", "Passive"]),
            |v: &str| v.to_lowercase(),
        );
        let mut graph = Schema::new();
        graph.add_table(users_table(ColumnType::Decorated(decorated)));

        let declared = get_declared_enums(&graph, "public", "public").unwrap();
        assert_eq!(
            declared.enum_definitions["user_status"],
            vec!["active", "passive"]
        );
    }

    #[test]
    fn test_cross_schema_reference_excluded() {
        let mut graph = Schema::new();
        graph.add_table(users_table(ColumnType::Enum(
            EnumType::new("user_status", ["active"]).with_schema("audit"),
        )));

        let declared = get_declared_enums(&graph, "public", "public").unwrap();
        assert!(declared.is_empty());

        // Inspecting the other schema finds it.
        let declared = get_declared_enums(&graph, "audit", "public").unwrap();
        assert_eq!(declared.enum_definitions.len(), 1);
    }

    #[test]
    fn test_default_schema_fallback() {
        // No explicit schema on the type: it resides in the default.
        let mut graph = Schema::new();
        graph.add_table(users_table(ColumnType::Enum(EnumType::new(
            "user_status",
            ["active"],
        ))));

        let declared = get_declared_enums(&graph, "app", "app").unwrap();
        assert_eq!(declared.enum_definitions.len(), 1);

        let declared = get_declared_enums(&graph, "app", "public").unwrap();
        assert!(declared.is_empty());
    }

    #[test]
    fn test_shared_enum_many_usages_one_definition() {
        let status = EnumType::new("user_status", ["active", "passive"]);
        let mut graph = Schema::new();
        graph.add_table(users_table(ColumnType::Enum(status.clone())));
        graph.add_table(Table::new(
            "admins",
            vec![Column::new("status", ColumnType::Enum(status))],
        ));

        let declared = get_declared_enums(&graph, "public", "public").unwrap();
        assert_eq!(declared.enum_definitions.len(), 1);
        assert_eq!(declared.table_definitions.len(), 2);
    }

    #[test]
    fn test_conflicting_definitions_fail_fast() {
        let mut graph = Schema::new();
        graph.add_table(users_table(ColumnType::Enum(EnumType::new(
            "user_status",
            ["active", "passive"],
        ))));
        graph.add_table(Table::new(
            "admins",
            vec![Column::new(
                "status",
                ColumnType::Enum(EnumType::new("user_status", ["active", "banned"])),
            )],
        ));

        let err = get_declared_enums(&graph, "public", "public").unwrap_err();
        assert!(matches!(err, crate::Error::ConflictingDefinition(_)));
    }
}
