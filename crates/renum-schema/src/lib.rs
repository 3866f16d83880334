//! Declared-schema object model for renum.
//!
//! This crate contains the types shared between the declared-schema reader
//! and the reconciliation engine: the table/column object graph, the
//! enum classification of column types, and the normalized
//! [`DeclaredEnumValues`] aggregate both schema sources produce.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Postgres column types for non-enum columns.
///
/// These exist so a declared table can carry its full column list; the
/// enum machinery only ever looks at [`ColumnType::Enum`] and
/// [`ColumnType::Decorated`] columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PgType {
    /// SMALLINT (2 bytes)
    SmallInt,
    /// INTEGER (4 bytes)
    Integer,
    /// BIGINT (8 bytes)
    BigInt,
    /// BOOLEAN
    Boolean,
    /// TEXT
    Text,
    /// TIMESTAMPTZ
    Timestamptz,
    /// DATE
    Date,
    /// UUID
    Uuid,
    /// JSONB
    Jsonb,
}

impl fmt::Display for PgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PgType::SmallInt => write!(f, "SMALLINT"),
            PgType::Integer => write!(f, "INTEGER"),
            PgType::BigInt => write!(f, "BIGINT"),
            PgType::Boolean => write!(f, "BOOLEAN"),
            PgType::Text => write!(f, "TEXT"),
            PgType::Timestamptz => write!(f, "TIMESTAMPTZ"),
            PgType::Date => write!(f, "DATE"),
            PgType::Uuid => write!(f, "UUID"),
            PgType::Jsonb => write!(f, "JSONB"),
        }
    }
}

/// A declared enumerated type: a named, ordered set of value labels.
///
/// Value order is semantically significant: Postgres stores enum labels
/// in ordinal order and comparison operators follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    /// Type name, unique within its schema.
    pub name: String,
    /// Resident schema; `None` means "use the connection's default schema".
    pub schema: Option<String>,
    /// Ordered value labels as declared in code.
    pub values: Vec<String>,
}

impl EnumType {
    /// Create an enum type with no explicit schema.
    pub fn new(
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            schema: None,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Pin this enum type to an explicit schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// Bind-processing pipeline of a decorator type.
///
/// Maps a value label as declared in code to the label that actually goes
/// over the wire. Declared and database labels may differ (e.g. a value
/// object that serializes to a different string), so wrapped enums must be
/// compared by their processed values, not their declared ones.
pub trait BindTransform: Send + Sync {
    /// Transform one declared value label into its database label.
    fn process_bind(&self, value: &str) -> String;
}

impl<F> BindTransform for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn process_bind(&self, value: &str) -> String {
        self(value)
    }
}

/// A decorator/adapter type wrapping an enum behind a bind pipeline.
#[derive(Clone)]
pub struct DecoratedEnum {
    /// The wrapped enum type.
    pub inner: EnumType,
    /// The bind-processing pipeline applied to every declared value.
    pub transform: Arc<dyn BindTransform>,
}

impl DecoratedEnum {
    /// Wrap an enum type with a bind transform.
    pub fn new(inner: EnumType, transform: impl BindTransform + 'static) -> Self {
        Self {
            inner,
            transform: Arc::new(transform),
        }
    }

    /// The on-the-wire value labels, in declared order.
    pub fn database_values(&self) -> Vec<String> {
        self.inner
            .values
            .iter()
            .map(|v| self.transform.process_bind(v))
            .collect()
    }
}

impl fmt::Debug for DecoratedEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratedEnum")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

/// The type of a declared column.
#[derive(Debug, Clone)]
pub enum ColumnType {
    /// A non-enum builtin type. Carries no schema attribute and is never
    /// considered by the enum reader.
    Plain(PgType),
    /// A direct enum type.
    Enum(EnumType),
    /// An enum type wrapped by a decorator layer.
    Decorated(DecoratedEnum),
}

/// Classification of a column type with respect to enums.
///
/// Computed once per column at classification time, replacing ad-hoc
/// attribute probing with an explicit capability check.
#[derive(Debug)]
pub enum EnumSource<'a> {
    /// The column type is an enum.
    Direct(&'a EnumType),
    /// The column type wraps an enum via a decorator.
    Wrapped(&'a DecoratedEnum),
    /// The column type has nothing to do with enums.
    NotEnum,
}

impl ColumnType {
    /// Classify this type with respect to enums.
    pub fn enum_source(&self) -> EnumSource<'_> {
        match self {
            ColumnType::Plain(_) => EnumSource::NotEnum,
            ColumnType::Enum(e) => EnumSource::Direct(e),
            ColumnType::Decorated(d) => EnumSource::Wrapped(d),
        }
    }

    /// The resident schema of the underlying enum, if this is an
    /// enum-bearing type. Plain types have no schema attribute.
    pub fn schema(&self) -> Option<&str> {
        match self {
            ColumnType::Plain(_) => None,
            ColumnType::Enum(e) => e.schema.as_deref(),
            ColumnType::Decorated(d) => d.inner.schema.as_deref(),
        }
    }
}

/// A declared column.
#[derive(Debug, Clone)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column type.
    pub ty: ColumnType,
}

impl Column {
    /// Create a column.
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A declared table.
#[derive(Debug, Clone)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Columns, in declaration order.
    pub columns: Vec<Column>,
}

impl Table {
    /// Create a table from its columns.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }
}

/// The declared schema object graph.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Tables in the schema, indexed by name.
    pub tables: IndexMap<String, Table>,
}

impl Schema {
    /// Create a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table to the schema.
    pub fn add_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Iterate over all tables.
    pub fn iter_tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }
}

/// A (table, column, enum) usage record: this column's type references
/// that enum. An enum with zero usages is a candidate for removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumUsage {
    /// Table the column belongs to.
    pub table_name: String,
    /// Column whose type references the enum.
    pub column_name: String,
    /// The referenced enum type.
    pub enum_name: String,
}

impl EnumUsage {
    /// Create a usage record.
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        enum_name: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            enum_name: enum_name.into(),
        }
    }
}

/// Two definitions of the same enum name disagree on the value tuple.
///
/// Duplicate definitions within one side of the diff are a programming
/// contract violation; readers fail fast instead of silently picking one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionConflict {
    /// The contested enum name.
    pub name: String,
    /// The values recorded first.
    pub existing: Vec<String>,
    /// The values that conflicted with them.
    pub conflicting: Vec<String>,
}

impl fmt::Display for DefinitionConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "conflicting definitions for enum '{}': {:?} vs {:?}",
            self.name, self.existing, self.conflicting
        )
    }
}

impl std::error::Error for DefinitionConflict {}

/// Normalized enum state of one schema, as produced by either the live
/// (introspected) or the declared (code-defined) reader.
///
/// Compared structurally; never mutated after a reader builds it.
#[derive(Debug, Clone, Default)]
pub struct DeclaredEnumValues {
    /// Enum name → ordered value labels.
    pub enum_definitions: IndexMap<String, Vec<String>>,
    /// Columns whose type references one of the enums. Live introspection
    /// leaves this empty; only the declared side records usages.
    pub table_definitions: Vec<EnumUsage>,
}

impl DeclaredEnumValues {
    /// Create an empty value set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of (name, values) pairs. Panics on conflicting
    /// duplicates; intended for literals in tests and fixtures.
    pub fn from_definitions(
        defs: impl IntoIterator<Item = (impl Into<String>, Vec<impl Into<String>>)>,
    ) -> Self {
        let mut out = Self::new();
        for (name, values) in defs {
            let values: Vec<String> = values.into_iter().map(Into::into).collect();
            out.insert_definition(name.into(), values)
                .expect("conflicting duplicate definition in fixture");
        }
        out
    }

    /// Record one enum definition.
    ///
    /// Re-inserting an identical definition is a no-op (many columns may
    /// reference the same enum); a duplicate name with a different value
    /// tuple is a contract violation.
    pub fn insert_definition(
        &mut self,
        name: impl Into<String>,
        values: Vec<String>,
    ) -> Result<(), DefinitionConflict> {
        let name = name.into();
        match self.enum_definitions.get(&name) {
            Some(existing) if *existing == values => Ok(()),
            Some(existing) => Err(DefinitionConflict {
                name,
                existing: existing.clone(),
                conflicting: values,
            }),
            None => {
                self.enum_definitions.insert(name, values);
                Ok(())
            }
        }
    }

    /// Record a column usage.
    pub fn push_usage(&mut self, usage: EnumUsage) {
        self.table_definitions.push(usage);
    }

    /// True if no enums were found on this side.
    pub fn is_empty(&self) -> bool {
        self.enum_definitions.is_empty()
    }

    /// The usages referencing a given enum.
    pub fn usages_of(&self, enum_name: &str) -> impl Iterator<Item = &EnumUsage> {
        self.table_definitions
            .iter()
            .filter(move |u| u.enum_name == enum_name)
    }
}

#[cfg(test)]
mod tests;
