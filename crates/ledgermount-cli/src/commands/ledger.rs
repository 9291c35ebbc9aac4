//! Ledger command handler

use anyhow::Result;

use crate::output::{Output, OutputFormat};
use crate::session::Session;

/// List remote records in the ledger
pub fn list(session: &Session, remote_type: Option<String>, output: &Output) -> Result<()> {
    let book = session.book();
    let remote_types: Vec<&str> = match remote_type.as_deref() {
        Some(t) => vec![t],
        None => book.remote_types(),
    };

    match output.format {
        OutputFormat::Json => {
            let records: Vec<_> = remote_types
                .iter()
                .flat_map(|t| {
                    book.list(t).into_iter().map(move |(id, record)| {
                        serde_json::json!({
                            "remote_type": t,
                            "id": id,
                            "fields": record.fields,
                            "updated_date_utc": record.updated_date_utc,
                            "sandbox": record.sandbox
                        })
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        OutputFormat::Quiet => {
            for t in &remote_types {
                for (id, _) in book.list(t) {
                    println!("{}", id);
                }
            }
        }
        OutputFormat::Human => {
            let mut total = 0;
            for t in &remote_types {
                let records = book.list(t);
                if records.is_empty() {
                    continue;
                }
                total += records.len();
                println!("── {} ({}) ──", t, records.len());
                for (id, record) in records {
                    println!(
                        "{} | {} | {} field(s){}",
                        id,
                        record.updated_date_utc.format("%Y-%m-%d %H:%M"),
                        record.fields.len(),
                        if record.sandbox { " [sandbox]" } else { "" }
                    );
                }
            }
            if total == 0 {
                println!("No ledger records found.");
            } else {
                println!("\n{} record(s)", total);
            }
        }
    }

    Ok(())
}
