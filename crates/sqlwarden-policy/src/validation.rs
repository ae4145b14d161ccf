//! Uniqueness pre-validation.
//!
//! Index annotations on entity metadata drive a `COUNT(*)` existence probe
//! against the live connection. This runs entirely outside the save
//! pipeline: callers invoke it while validating user input, before an
//! insert is ever tracked.

use sqlwarden_core::{Connection, EntityMeta, Error, Record, Result, ScopedOpen};
use sqlwarden_dialect::DialectKnowledge;

/// Probe every unique index of the entity for an existing row with the
/// record's values.
///
/// Returns `DuplicateValue` naming the index properties on the first
/// positive count. Indexes with an unset participating value are skipped —
/// there is nothing meaningful to probe yet.
#[tracing::instrument(level = "debug", skip_all, fields(entity = meta.name.as_str()))]
pub fn validate_unique_indexes(
    conn: &mut dyn Connection,
    dialect: &DialectKnowledge,
    meta: &EntityMeta,
    record: &Record,
) -> Result<()> {
    let table = meta.require_table()?;

    for index in meta.indexes.iter().filter(|i| i.unique) {
        let mut predicates = Vec::with_capacity(index.properties.len());
        let mut params = Vec::with_capacity(index.properties.len());
        let mut skip = false;

        for (i, property) in index.properties.iter().enumerate() {
            let prop = meta.require_property(property)?;
            let accessor = prop.require_accessor(&meta.name)?;
            let value = accessor(record);
            if value.is_unset() {
                skip = true;
                break;
            }
            let name = format!("@u{i}");
            predicates.push(format!("{} = {name}", dialect.quote(&prop.column_name)));
            params.push((name, value));
        }
        if skip {
            continue;
        }

        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            dialect.quote(table),
            predicates.join(" AND ")
        );
        tracing::debug!(sql = %sql, index = %index.name, "Probing unique index");

        let mut guard = ScopedOpen::acquire(conn)?;
        let count = guard
            .conn()
            .query_scalar(&sql, &params, None)?
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        drop(guard);

        if count > 0 {
            return Err(Error::DuplicateValue {
                entity: meta.name.clone(),
                properties: index.properties.clone(),
            });
        }
    }

    Ok(())
}
