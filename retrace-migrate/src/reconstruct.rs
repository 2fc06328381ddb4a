//! Folding collected operations into a table shape.

use retrace_schema::{Operation, Property, PropertyValue, TableOperation, TableShape};

/// Rebuild the shape of a table from walked operations.
///
/// `discovered` is in walk order (newest effect first); operations are
/// applied in chronological order. Operations on columns, keys or indexes
/// that do not exist at that point are ignored.
pub fn reconstruct(discovered: &[TableOperation]) -> TableShape {
    discovered
        .iter()
        .rev()
        .fold(TableShape::new(), |mut shape, op| {
            apply(&mut shape, &op.operation);
            shape
        })
}

/// Apply one operation to a shape.
pub fn apply(shape: &mut TableShape, operation: &Operation) {
    match operation {
        Operation::CreateTable { columns } => {
            for (name, spec) in columns {
                shape.columns.insert(name.clone(), spec.clone());
            }
        }
        Operation::AddColumn { name, spec } => {
            shape.columns.insert(name.clone(), spec.clone());
        }
        Operation::DropColumn { name } => {
            shape.columns.shift_remove(name);
        }
        Operation::RenameColumn { from, to } => {
            if let Some(spec) = shape.columns.shift_remove(from) {
                shape.columns.insert(to.clone(), spec);
            }
        }
        Operation::AlterColumn { name, spec } => {
            if let Some(existing) = shape.columns.get_mut(name) {
                *existing = spec.clone();
            }
        }
        Operation::AddPrimaryKey { columns } => {
            shape.primary_key = columns.clone();
        }
        Operation::DropPrimaryKey => shape.primary_key.clear(),
        Operation::AddForeignKey { name, spec } => {
            shape.foreign_keys.insert(name.clone(), spec.clone());
        }
        Operation::DropForeignKey { name } => {
            shape.foreign_keys.shift_remove(name);
        }
        Operation::CreateUniqueIndex { name, columns } => {
            shape.unique_indexes.insert(name.clone(), columns.clone());
        }
        Operation::DropIndex { name } => {
            shape.unique_indexes.shift_remove(name);
        }
        Operation::AddColumnComment { name, comment } => {
            if let Some(spec) = shape.columns.get_mut(name) {
                spec.set(Property::Comment, comment.clone());
            }
        }
        Operation::DropColumnComment { name } => {
            if let Some(spec) = shape.columns.get_mut(name) {
                spec.set(Property::Comment, PropertyValue::Null);
            }
        }
        // Table boundaries are handled by the walker.
        Operation::DropTable | Operation::RenameTable { .. } => {}
    }
}
