//! Enum reconciliation - compare declared enum state against the live
//! database state.
//!
//! This module compares two [`DeclaredEnumValues`] snapshots for the same
//! schema and produces the ordered operation sequence that transforms the
//! live state into the declared one.
//!
//! ## Ordering
//!
//! A column cannot use an enum type that does not exist yet, and an enum
//! cannot be dropped while a column still references it. The engine does
//! not order column operations itself - those come from the surrounding
//! migration pipeline - but [`EnumDiff::sequence`] positions its own
//! operations correctly around them: creates and value-level alters
//! before the column batch, drops after it.
//!
//! ## Value removal and reordering
//!
//! Postgres can add an enum value in place (`ADD VALUE ... BEFORE/AFTER`)
//! but has no primitive to drop a single value or reorder labels. Any
//! value diff that removes or reorders values therefore falls back to a
//! structural recreation: an adjacent `DropEnum` + `CreateEnum` pair for
//! that enum. [`DiffMode::AddOnly`] opts out of the destructive fallback
//! and only ever adds values.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use renum_schema::DeclaredEnumValues;

use crate::{Error, Result};

/// Where an added (or, on the downgrade path, dropped) value sits
/// relative to its neighbor in the target ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValuePosition {
    /// Append after the current last value.
    Last,
    /// Insert directly after the given value.
    After(String),
    /// Insert directly before the given value.
    Before(String),
}

impl fmt::Display for ValuePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuePosition::Last => write!(f, "last"),
            ValuePosition::After(v) => write!(f, "after '{}'", v),
            ValuePosition::Before(v) => write!(f, "before '{}'", v),
        }
    }
}

/// A single abstract enum migration operation.
///
/// Operations are produced, never mutated; each carries enough data to
/// apply the change and to synthesize its exact inverse for the downgrade
/// path. The variant fields are the contract an external renderer depends
/// on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Create an enum with the given ordered values.
    CreateEnum {
        name: String,
        schema: String,
        values: Vec<String>,
    },
    /// Drop an enum. Carries the value tuple so the inverse can recreate
    /// it exactly.
    DropEnum {
        name: String,
        schema: String,
        values: Vec<String>,
    },
    /// Add one value, positioned relative to its neighbor in the target
    /// ordering.
    AlterEnumAddValue {
        name: String,
        schema: String,
        value: String,
        position: ValuePosition,
    },
    /// Remove one value. Postgres has no in-place primitive for this; a
    /// renderer resolves it via the recreation fallback. Emitted only as
    /// the inverse of [`Operation::AlterEnumAddValue`].
    AlterEnumDropValue {
        name: String,
        schema: String,
        value: String,
        position: ValuePosition,
    },
    /// Rename one value in place. Never synthesized by the diff (rename
    /// detection is out of scope); part of the vocabulary for manually
    /// authored steps and their downgrades.
    AlterEnumRenameValue {
        name: String,
        schema: String,
        from: String,
        to: String,
    },
}

impl Operation {
    /// The name of the enum this operation touches.
    pub fn enum_name(&self) -> &str {
        match self {
            Operation::CreateEnum { name, .. }
            | Operation::DropEnum { name, .. }
            | Operation::AlterEnumAddValue { name, .. }
            | Operation::AlterEnumDropValue { name, .. }
            | Operation::AlterEnumRenameValue { name, .. } => name,
        }
    }

    /// Synthesize the exact inverse of this operation.
    pub fn invert(&self) -> Operation {
        match self.clone() {
            Operation::CreateEnum {
                name,
                schema,
                values,
            } => Operation::DropEnum {
                name,
                schema,
                values,
            },
            Operation::DropEnum {
                name,
                schema,
                values,
            } => Operation::CreateEnum {
                name,
                schema,
                values,
            },
            Operation::AlterEnumAddValue {
                name,
                schema,
                value,
                position,
            } => Operation::AlterEnumDropValue {
                name,
                schema,
                value,
                position,
            },
            Operation::AlterEnumDropValue {
                name,
                schema,
                value,
                position,
            } => Operation::AlterEnumAddValue {
                name,
                schema,
                value,
                position,
            },
            Operation::AlterEnumRenameValue {
                name,
                schema,
                from,
                to,
            } => Operation::AlterEnumRenameValue {
                name,
                schema,
                from: to,
                to: from,
            },
        }
    }
}

// Display is the human-readable diff summary; SQL rendering belongs to an
// external renderer.
impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateEnum {
                name,
                schema,
                values,
            } => {
                write!(f, "+ enum {}.{} ({})", schema, name, values.join(", "))
            }
            Operation::DropEnum {
                name,
                schema,
                values,
            } => {
                write!(f, "- enum {}.{} ({})", schema, name, values.join(", "))
            }
            Operation::AlterEnumAddValue {
                name,
                schema,
                value,
                position,
            } => {
                write!(f, "~ enum {}.{}: + '{}' {}", schema, name, value, position)
            }
            Operation::AlterEnumDropValue {
                name,
                schema,
                value,
                position,
            } => {
                write!(f, "~ enum {}.{}: - '{}' {}", schema, name, value, position)
            }
            Operation::AlterEnumRenameValue {
                name,
                schema,
                from,
                to,
            } => {
                write!(f, "~ enum {}.{}: '{}' -> '{}'", schema, name, from, to)
            }
        }
    }
}

/// A structural mismatch surfaced for manual review. Never fatal, never
/// silently discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// A declared column's type references an enum that has no declared
    /// definition in the inspected schema.
    UndeclaredEnumUsage {
        table_name: String,
        column_name: String,
        enum_name: String,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::UndeclaredEnumUsage {
                table_name,
                column_name,
                enum_name,
            } => write!(
                f,
                "column {}.{} references undeclared enum '{}'",
                table_name, column_name, enum_name
            ),
        }
    }
}

/// How the engine reconciles value removals and reorders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffMode {
    /// Conservative, destructive-but-correct default: removals and
    /// reorders recreate the enum.
    #[default]
    Recreate,
    /// Opt-in non-destructive mode: only ever add values; removals and
    /// reorders are skipped (and logged).
    AddOnly,
}

/// A step in the spliced migration sequence: one of the engine's own enum
/// operations, or an opaque column operation supplied by the surrounding
/// pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<C> {
    Enum(Operation),
    Column(C),
}

/// The reconciliation result.
///
/// Operations are grouped by phase so callers can splice the external
/// column-operation batch between them; [`EnumDiff::operations`] flattens
/// the groups in apply order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumDiff {
    /// `CreateEnum` for enums present only in the declared state. Ordered
    /// before any column operation that references them.
    pub creates: Vec<Operation>,
    /// Value-level changes for enums present on both sides, including
    /// recreation pairs (an adjacent drop + create for one enum).
    pub alters: Vec<Operation>,
    /// `DropEnum` for enums present only in the live state. Ordered after
    /// any column operation that stops referencing them.
    pub drops: Vec<Operation>,
    /// Structural mismatches for manual review.
    pub mismatches: Vec<Mismatch>,
}

impl EnumDiff {
    /// Returns true if there are no operations (mismatches do not count
    /// as changes).
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.alters.is_empty() && self.drops.is_empty()
    }

    /// All operations in apply order: creates, then value-level alters,
    /// then drops.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.creates
            .iter()
            .chain(self.alters.iter())
            .chain(self.drops.iter())
    }

    /// The downgrade sequence: the forward sequence reversed, each
    /// operation inverted.
    pub fn invert(&self) -> Vec<Operation> {
        let ops: Vec<&Operation> = self.operations().collect();
        ops.into_iter().rev().map(Operation::invert).collect()
    }

    /// Splice the external column-operation batch into the plan: enum
    /// creates and alters first, then the column operations, then enum
    /// drops.
    pub fn sequence<C>(&self, column_ops: Vec<C>) -> Vec<Step<C>> {
        let mut steps =
            Vec::with_capacity(self.creates.len() + self.alters.len() + self.drops.len() + column_ops.len());
        steps.extend(self.creates.iter().cloned().map(Step::Enum));
        steps.extend(self.alters.iter().cloned().map(Step::Enum));
        steps.extend(column_ops.into_iter().map(Step::Column));
        steps.extend(self.drops.iter().cloned().map(Step::Enum));
        steps
    }
}

impl fmt::Display for EnumDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() && self.mismatches.is_empty() {
            writeln!(f, "no enum changes")?;
            return Ok(());
        }
        for op in self.operations() {
            writeln!(f, "{}", op)?;
        }
        for mismatch in &self.mismatches {
            writeln!(f, "! {}", mismatch)?;
        }
        Ok(())
    }
}

/// Compare the live enum state against the declared one and produce the
/// operations that reconcile them.
///
/// Pure and stateless: both snapshots are already materialized, nothing
/// is read or written here, and nothing persists between invocations.
pub fn reconcile(
    live: &DeclaredEnumValues,
    declared: &DeclaredEnumValues,
    schema: &str,
    mode: DiffMode,
) -> EnumDiff {
    let mut diff = EnumDiff::default();

    // Enums present only in the declared state.
    for (name, values) in &declared.enum_definitions {
        if !live.enum_definitions.contains_key(name) {
            diff.creates.push(Operation::CreateEnum {
                name: name.clone(),
                schema: schema.to_string(),
                values: values.clone(),
            });
        }
    }

    // Enums present only in the live state. With zero remaining declared
    // usages they are dropped outright.
    for (name, values) in &live.enum_definitions {
        if !declared.enum_definitions.contains_key(name) {
            diff.drops.push(Operation::DropEnum {
                name: name.clone(),
                schema: schema.to_string(),
                values: values.clone(),
            });
        }
    }

    // Enums present on both sides: value-level diff.
    for (name, declared_values) in &declared.enum_definitions {
        if let Some(live_values) = live.enum_definitions.get(name) {
            diff_values(
                &mut diff.alters,
                schema,
                name,
                live_values,
                declared_values,
                mode,
            );
        }
    }

    // A usage naming an enum nobody declared is reported, not guessed at.
    for usage in &declared.table_definitions {
        if !declared.enum_definitions.contains_key(&usage.enum_name) {
            diff.mismatches.push(Mismatch::UndeclaredEnumUsage {
                table_name: usage.table_name.clone(),
                column_name: usage.column_name.clone(),
                enum_name: usage.enum_name.clone(),
            });
        }
    }

    diff
}

/// Value-level diff for one enum present on both sides.
fn diff_values(
    ops: &mut Vec<Operation>,
    schema: &str,
    name: &str,
    live: &[String],
    declared: &[String],
    mode: DiffMode,
) {
    if live == declared {
        return;
    }

    let live_set: HashSet<&str> = live.iter().map(String::as_str).collect();
    let declared_set: HashSet<&str> = declared.iter().map(String::as_str).collect();

    let removed: Vec<&str> = live
        .iter()
        .map(String::as_str)
        .filter(|v| !declared_set.contains(v))
        .collect();

    // The shared values must appear in the same relative order on both
    // sides for in-place addition to be enough.
    let order_preserved = {
        let shared_in_declared_order: Vec<&str> = declared
            .iter()
            .map(String::as_str)
            .filter(|v| live_set.contains(v))
            .collect();
        let live_order: Vec<&str> = live.iter().map(String::as_str).collect();
        shared_in_declared_order == live_order
    };

    if removed.is_empty() && order_preserved {
        push_adds(ops, schema, name, &live_set, declared);
        return;
    }

    match mode {
        DiffMode::Recreate => {
            // Postgres cannot drop a single enum value or reorder labels
            // in place; recreate the type with the declared tuple.
            tracing::debug!(
                enum_name = name,
                ?removed,
                order_preserved,
                "in-place removal/reorder unsupported, recreating enum"
            );
            ops.push(Operation::DropEnum {
                name: name.to_string(),
                schema: schema.to_string(),
                values: live.to_vec(),
            });
            ops.push(Operation::CreateEnum {
                name: name.to_string(),
                schema: schema.to_string(),
                values: declared.to_vec(),
            });
        }
        DiffMode::AddOnly => {
            tracing::warn!(
                enum_name = name,
                ?removed,
                order_preserved,
                "add-only mode: skipping value removal/reorder"
            );
            push_adds(ops, schema, name, &live_set, declared);
        }
    }
}

/// Emit one `AlterEnumAddValue` per declared value missing from the live
/// set, each anchored to its neighbor in the target ordering. Values are
/// added in declared order, so an earlier added value is a valid anchor
/// for a later one.
fn push_adds(
    ops: &mut Vec<Operation>,
    schema: &str,
    name: &str,
    live_set: &HashSet<&str>,
    declared: &[String],
) {
    // Most recent declared value that exists (or will, once the adds run).
    let mut last_present: Option<&String> = None;

    for (i, value) in declared.iter().enumerate() {
        if live_set.contains(value.as_str()) {
            last_present = Some(value);
            continue;
        }

        let position = match last_present {
            Some(prev) => ValuePosition::After(prev.clone()),
            // Inserting at the head: anchor before the first value that
            // already exists. With nothing live at all, append.
            None => match declared[i + 1..]
                .iter()
                .find(|v| live_set.contains(v.as_str()))
            {
                Some(next) => ValuePosition::Before(next.clone()),
                None => ValuePosition::Last,
            },
        };

        ops.push(Operation::AlterEnumAddValue {
            name: name.to_string(),
            schema: schema.to_string(),
            value: value.clone(),
            position,
        });
        last_present = Some(value);
    }
}

/// Apply an operation sequence to an enum-definitions snapshot.
///
/// The engine never touches a database; this applies the *abstract*
/// operations to an in-memory mapping, which is how the round-trip
/// property (forward then inverse reproduces the original snapshot) is
/// checked, and how callers can validate a plan before rendering it.
pub fn apply_operations<'a>(
    definitions: &mut IndexMap<String, Vec<String>>,
    operations: impl IntoIterator<Item = &'a Operation>,
) -> Result<()> {
    for op in operations {
        apply_operation(definitions, op)?;
    }
    Ok(())
}

fn apply_operation(
    definitions: &mut IndexMap<String, Vec<String>>,
    op: &Operation,
) -> Result<()> {
    match op {
        Operation::CreateEnum {
            name,
            schema,
            values,
        } => {
            if definitions.contains_key(name) {
                return Err(Error::DuplicateEnum {
                    schema: schema.clone(),
                    name: name.clone(),
                });
            }
            definitions.insert(name.clone(), values.clone());
        }
        Operation::DropEnum { name, schema, .. } => {
            if definitions.shift_remove(name).is_none() {
                return Err(Error::UnknownEnum {
                    schema: schema.clone(),
                    name: name.clone(),
                });
            }
        }
        Operation::AlterEnumAddValue {
            name,
            schema,
            value,
            position,
        } => {
            let values = definitions.get_mut(name).ok_or_else(|| Error::UnknownEnum {
                schema: schema.clone(),
                name: name.clone(),
            })?;
            if values.contains(value) {
                return Err(Error::DuplicateValue {
                    name: name.clone(),
                    value: value.clone(),
                });
            }
            let index = match position {
                ValuePosition::Last => values.len(),
                ValuePosition::After(anchor) => {
                    position_of(values, name, anchor)? + 1
                }
                ValuePosition::Before(anchor) => position_of(values, name, anchor)?,
            };
            values.insert(index, value.clone());
        }
        Operation::AlterEnumDropValue {
            name,
            schema,
            value,
            ..
        } => {
            let values = definitions.get_mut(name).ok_or_else(|| Error::UnknownEnum {
                schema: schema.clone(),
                name: name.clone(),
            })?;
            let index = position_of(values, name, value)?;
            values.remove(index);
        }
        Operation::AlterEnumRenameValue {
            name,
            schema,
            from,
            to,
        } => {
            let values = definitions.get_mut(name).ok_or_else(|| Error::UnknownEnum {
                schema: schema.clone(),
                name: name.clone(),
            })?;
            if values.contains(to) {
                return Err(Error::DuplicateValue {
                    name: name.clone(),
                    value: to.clone(),
                });
            }
            let index = position_of(values, name, from)?;
            values[index] = to.clone();
        }
    }
    Ok(())
}

fn position_of(values: &[String], name: &str, value: &str) -> Result<usize> {
    values
        .iter()
        .position(|v| v == value)
        .ok_or_else(|| Error::UnknownValue {
            name: name.to_string(),
            value: value.to_string(),
        })
}
