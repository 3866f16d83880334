use super::*;

#[test]
fn test_enum_source_classification() {
    let plain = ColumnType::Plain(PgType::Text);
    assert!(matches!(plain.enum_source(), EnumSource::NotEnum));

    let direct = ColumnType::Enum(EnumType::new("user_status", ["active", "passive"]));
    match direct.enum_source() {
        EnumSource::Direct(e) => assert_eq!(e.name, "user_status"),
        other => panic!("expected Direct, got {:?}", other),
    }

    let wrapped = ColumnType::Decorated(DecoratedEnum::new(
        EnumType::new("user_status", ["active", "passive"]),
        |v: &str| v.to_uppercase(),
    ));
    assert!(matches!(wrapped.enum_source(), EnumSource::Wrapped(_)));
}

#[test]
fn test_plain_type_has_no_schema() {
    assert_eq!(ColumnType::Plain(PgType::BigInt).schema(), None);
}

#[test]
fn test_enum_schema_attribute() {
    let ty = ColumnType::Enum(EnumType::new("mood", ["ok"]).with_schema("audit"));
    assert_eq!(ty.schema(), Some("audit"));

    let defaulted = ColumnType::Enum(EnumType::new("mood", ["ok"]));
    assert_eq!(defaulted.schema(), None);
}

#[test]
fn test_decorated_enum_database_values() {
    let decorated = DecoratedEnum::new(
        EnumType::new("priority", ["Low", "High"]),
        |v: &str| format!("p_{}", v.to_lowercase()),
    );
    assert_eq!(decorated.database_values(), vec!["p_low", "p_high"]);
}

#[test]
fn test_insert_definition_idempotent() {
    let mut values = DeclaredEnumValues::new();
    values
        .insert_definition("user_status", vec!["active".into(), "passive".into()])
        .unwrap();
    // Same enum referenced from a second column: same definition again.
    values
        .insert_definition("user_status", vec!["active".into(), "passive".into()])
        .unwrap();
    assert_eq!(values.enum_definitions.len(), 1);
}

#[test]
fn test_insert_definition_conflict_fails_fast() {
    let mut values = DeclaredEnumValues::new();
    values
        .insert_definition("user_status", vec!["active".into(), "passive".into()])
        .unwrap();
    let err = values
        .insert_definition("user_status", vec!["active".into()])
        .unwrap_err();
    assert_eq!(err.name, "user_status");
    assert_eq!(err.existing, vec!["active", "passive"]);
    assert_eq!(err.conflicting, vec!["active"]);
}

#[test]
fn test_usages_of() {
    let mut values = DeclaredEnumValues::new();
    values.push_usage(EnumUsage::new("users", "status", "user_status"));
    values.push_usage(EnumUsage::new("orders", "state", "order_state"));
    values.push_usage(EnumUsage::new("admins", "status", "user_status"));

    let hits: Vec<_> = values.usages_of("user_status").collect();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].table_name, "users");
    assert_eq!(hits[1].table_name, "admins");
}

#[test]
fn test_schema_add_and_iter() {
    let mut schema = Schema::new();
    schema.add_table(Table::new(
        "users",
        vec![
            Column::new("id", ColumnType::Plain(PgType::BigInt)),
            Column::new(
                "status",
                ColumnType::Enum(EnumType::new("user_status", ["active", "passive"])),
            ),
        ],
    ));

    let names: Vec<_> = schema.iter_tables().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["users"]);
    assert_eq!(schema.tables["users"].columns.len(), 2);
}
