//! Record command handlers

use anyhow::{bail, Context, Result};
use tracing::debug;

use ledgermount_core::{Attributes, FieldValue, HostRecord, MountExt};

use crate::output::{Output, OutputFormat};
use crate::session::Session;

/// Create or update a host record, then run sync-on-save mounts
pub fn put(
    session: &Session,
    id: String,
    host_type: String,
    assignments: Vec<String>,
    output: &Output,
) -> Result<()> {
    let attributes = assignments
        .iter()
        .map(|a| parse_assignment(a))
        .collect::<Result<Attributes>>()?;

    let mut record = match session.record(&id) {
        Ok(existing) => {
            if existing.host_type() != host_type {
                bail!(
                    "Record {} is a '{}', not a '{}'",
                    id,
                    existing.host_type(),
                    host_type
                );
            }
            existing
        }
        Err(_) => session.new_record(&id, &host_type, Attributes::new()),
    };

    record
        .assign_attributes(attributes)
        .map_err(|e| anyhow::anyhow!(e))?;
    record.save().map_err(|e| anyhow::anyhow!(e))?;

    let outcomes = record
        .sync_on_save()
        .with_context(|| format!("Sync after saving {} failed", id))?;
    if !outcomes.is_empty() {
        debug!(id = %id, mounts = outcomes.len(), "Ran sync-on-save mounts");
        // External ids may have been written back
        record.save().map_err(|e| anyhow::anyhow!(e))?;
    }
    session.save()?;

    output.success(&format!("Saved {} ({})", id, host_type));
    for (mount, outcome) in &outcomes {
        output.print_sync_outcome(mount, outcome.as_ref());
    }

    Ok(())
}

/// Show a host record and its mounts
pub fn show(session: &Session, id: String, output: &Output) -> Result<()> {
    let record = session.record(&id)?;
    output.print_record(record.id(), record.host_type(), record.attributes());

    if output.format == OutputFormat::Human {
        let registry = session.registry(record.host_type());
        if !registry.is_empty() {
            println!();
            println!("── Mounts ({}) ──", registry.len());
            for config in registry.iter() {
                let external_id = record
                    .attribute(config.external_id_field())
                    .and_then(|v| v.to_id())
                    .unwrap_or_else(|| "(not linked)".to_string());
                println!("{} -> {} {}", config.name(), config.remote_type(), external_id);
            }
        }
    }

    Ok(())
}

/// List all host records
pub fn list(session: &Session, output: &Output) -> Result<()> {
    let records: Vec<(String, String, usize)> = session
        .store()
        .iter()
        .map(|(id, doc)| (id.to_string(), doc.host_type.clone(), doc.attributes.len()))
        .collect();

    output.print_records(&records);
    Ok(())
}

/// Parse `key=value` into an attribute
fn parse_assignment(raw: &str) -> Result<(String, FieldValue)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("Expected key=value, got '{}'", raw);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Missing attribute name in '{}'", raw);
    }
    Ok((key.to_string(), FieldValue::parse_literal(value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("name=Jane Doe").unwrap(),
            ("name".to_string(), FieldValue::from("Jane Doe"))
        );
        assert_eq!(
            parse_assignment("credit_limit=500").unwrap(),
            ("credit_limit".to_string(), FieldValue::Integer(500))
        );
        assert_eq!(
            parse_assignment("note=a=b").unwrap(),
            ("note".to_string(), FieldValue::from("a=b"))
        );
        assert_eq!(
            parse_assignment("accounting_contact_id=0012").unwrap(),
            ("accounting_contact_id".to_string(), FieldValue::from("0012"))
        );
        assert_eq!(
            parse_assignment("email=").unwrap(),
            ("email".to_string(), FieldValue::from(""))
        );
    }

    #[test]
    fn test_parse_assignment_invalid() {
        assert!(parse_assignment("name").is_err());
        assert!(parse_assignment("=Jane").is_err());
    }
}
