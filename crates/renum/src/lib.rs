//! Postgres enum reconciliation for declarative schema migrations.
//!
//! Postgres enum types live outside the tables that use them, so table
//! autogeneration alone never notices when an enum's declared values
//! drift from the database. This crate closes that gap:
//!
//! - Introspect the enum types a schema currently defines
//!   ([`get_defined_enum_values`])
//! - Collect the enum state the declared object graph implies
//!   ([`get_declared_enums`])
//! - Diff the two into an ordered, invertible operation sequence
//!   ([`reconcile`])
//!
//! ```ignore
//! let conn = pool.get().await?;
//! let live = renum::get_defined_enum_values(&conn, "public").await?;
//! let declared = renum::get_declared_enums(&graph, "public", "public")?;
//!
//! let diff = renum::reconcile(&live, &declared, "public", DiffMode::default());
//! for step in diff.sequence(column_ops) {
//!     // render each step as SQL, or record it in a migration script
//! }
//! ```
//!
//! The engine itself is pure: it reads nothing, writes nothing, and
//! keeps no state between invocations. Rendering operations as SQL is
//! the caller's concern.

mod declared;
mod diff;
mod error;
mod introspect;
mod traced;

pub use declared::get_declared_enums;
pub use diff::{
    DiffMode, EnumDiff, Mismatch, Operation, Step, ValuePosition, apply_operations, reconcile,
};
pub use error::Error;
pub use introspect::{get_defined_enum_values, get_defined_enums};
pub use traced::{Connection, ConnectionExt, TracedConn, TracedPool};

// Re-export the schema model so most callers only depend on this crate.
pub use renum_schema::{
    BindTransform, Column, ColumnType, DeclaredEnumValues, DecoratedEnum, DefinitionConflict,
    EnumSource, EnumType, EnumUsage, PgType, Schema, Table,
};

pub type Result<T> = std::result::Result<T, Error>;
