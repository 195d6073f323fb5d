//! Bulk input: CSV rows streamed as raw field mappings.
//!
//! Parsing runs on a blocking task and feeds a bounded channel, so the
//! provisioner starts launching record tasks while the file is still being
//! read. A malformed row becomes an error item for that record only.

use crate::error::{CliError, CliResult};
use futures::stream::{self, Stream};
use roster_provisioning::record::{
    FIELD_EMAIL, FIELD_GROUP, FIELD_NAME, FIELD_PASSWORD, FIELD_PHONE_BASE, FIELD_ROLE, FIELD_SITE,
};
use roster_provisioning::{ProvisionError, ProvisionResult, RawRecord};
use std::path::Path;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Rows buffered between the parser and the provisioner.
pub const CHANNEL_CAPACITY: usize = 64;

const REQUIRED_HEADERS: [&str; 7] = [
    FIELD_NAME,
    FIELD_EMAIL,
    FIELD_PASSWORD,
    FIELD_GROUP,
    FIELD_ROLE,
    FIELD_SITE,
    FIELD_PHONE_BASE,
];

/// Open `path` and stream its data rows.
///
/// Fails up front when the file cannot be opened or its header row lacks a
/// required column.
pub async fn read_records(
    path: &Path,
) -> CliResult<impl Stream<Item = ProvisionResult<RawRecord>>> {
    let path = path.to_path_buf();
    let (reader, headers) = tokio::task::spawn_blocking(move || open(&path))
        .await
        .map_err(|e| CliError::Input(format!("reader task failed: {e}")))??;

    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    tokio::task::spawn_blocking(move || parse_rows(reader, &headers, &tx));

    Ok(stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    }))
}

fn open(path: &Path) -> CliResult<(csv::Reader<std::fs::File>, Vec<String>)> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|e| CliError::Input(format!("{}: {e}", path.display())))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CliError::Input(format!("{}: unreadable header row: {e}", path.display())))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .copied()
        .filter(|required| !headers.iter().any(|h| h.eq_ignore_ascii_case(required)))
        .collect();
    if !missing.is_empty() {
        return Err(CliError::Input(format!(
            "{}: missing column(s) {}",
            path.display(),
            missing.join(", ")
        )));
    }

    let ambiguous: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .copied()
        .filter(|required| {
            headers
                .iter()
                .filter(|h| h.eq_ignore_ascii_case(required))
                .count()
                > 1
        })
        .collect();
    if !ambiguous.is_empty() {
        return Err(CliError::Input(format!(
            "{}: duplicate column(s) {}",
            path.display(),
            ambiguous.join(", ")
        )));
    }

    info!(path = %path.display(), columns = headers.len(), "Reading input file");
    Ok((reader, headers))
}

fn parse_rows(
    mut reader: csv::Reader<std::fs::File>,
    headers: &[String],
    tx: &mpsc::Sender<ProvisionResult<RawRecord>>,
) {
    let mut rows = 0usize;
    for (offset, row) in reader.records().enumerate() {
        // Header is line 1.
        let line = offset + 2;
        let item = match row {
            Ok(row) => Ok(headers
                .iter()
                .cloned()
                .zip(row.iter().map(str::to_string))
                .collect::<RawRecord>()),
            Err(e) => {
                warn!(line, error = %e, "Malformed input row");
                Err(ProvisionError::InvalidInput(format!("line {line}: {e}")))
            }
        };
        if tx.blocking_send(item).is_err() {
            debug!(line, "Input consumer dropped, stopping reader");
            return;
        }
        rows += 1;
    }
    info!(rows, "Input file exhausted");
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use roster_provisioning::record::field;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "NAME,EMAIL,PASSWORD,GROUP,ROLE,SITENAME,PHONEBASE";

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    async fn collect(file: &NamedTempFile) -> Vec<ProvisionResult<RawRecord>> {
        read_records(file.path()).await.unwrap().collect().await
    }

    #[tokio::test]
    async fn test_rows_become_raw_records() {
        let file = csv_file(&format!(
            "{HEADER}\nAda Lovelace, ada@example.com ,pw1,Support,Agent,Denver,WebRTC Base\n\
             Bo,bo@example.com,pw2,Sales,Agent,Denver,WebRTC Base\n"
        ));

        let records = collect(&file).await;

        assert_eq!(records.len(), 2);
        let first = records[0].as_ref().unwrap();
        assert_eq!(field(first, "NAME"), Some("Ada Lovelace"));
        assert_eq!(field(first, "EMAIL"), Some("ada@example.com"));
        assert_eq!(field(first, "SITENAME"), Some("Denver"));
        assert_eq!(field(records[1].as_ref().unwrap(), "GROUP"), Some("Sales"));
    }

    #[tokio::test]
    async fn test_headers_match_case_insensitively() {
        let file = csv_file(
            "name,email,password,group,role,sitename,phonebase\nAda,a@x.io,pw,G,R,S,P\n",
        );

        let records = collect(&file).await;

        assert_eq!(field(records[0].as_ref().unwrap(), "PHONEBASE"), Some("P"));
    }

    #[tokio::test]
    async fn test_byte_order_mark_is_ignored() {
        let file = csv_file(&format!("\u{feff}{HEADER}\nAda,a@x.io,pw,G,R,S,P\n"));

        let records = collect(&file).await;

        assert_eq!(field(records[0].as_ref().unwrap(), "NAME"), Some("Ada"));
    }

    #[tokio::test]
    async fn test_missing_column_fails_up_front() {
        let file = csv_file("NAME,EMAIL,PASSWORD,GROUP,ROLE\nAda,a@x.io,pw,G,R\n");

        let err = read_records(file.path()).await.err().unwrap();

        assert!(matches!(err, CliError::Input(_)));
        let message = err.to_string();
        assert!(message.contains("SITENAME"));
        assert!(message.contains("PHONEBASE"));
    }

    #[tokio::test]
    async fn test_columns_differing_only_in_case_are_rejected() {
        let file = csv_file(&format!("{HEADER},name\nAda,a@x.io,pw,G,R,S,P,Bo\n"));

        let err = read_records(file.path()).await.err().unwrap();

        assert_eq!(err.exit_code(), 4);
        assert!(err.to_string().contains("duplicate column(s) NAME"));
    }

    #[tokio::test]
    async fn test_missing_file_is_input_error() {
        let err = read_records(Path::new("/nonexistent/roster.csv"))
            .await
            .err()
            .unwrap();

        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_malformed_row_does_not_stop_the_stream() {
        let mut bytes = format!("{HEADER}\nAda,a@x.io,pw,G,R,S,P\n").into_bytes();
        bytes.extend_from_slice(b"B\xff\xfe,b@x.io,pw,G,R,S,P\n");
        bytes.extend_from_slice(b"Cy,c@x.io,pw,G,R,S,P\n");
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        let records = collect(&file).await;

        assert_eq!(records.len(), 3);
        assert!(records[0].is_ok());
        match &records[1] {
            Err(ProvisionError::InvalidInput(message)) => assert!(message.starts_with("line 3")),
            other => panic!("Expected InvalidInput, got: {other:?}"),
        }
        assert_eq!(field(records[2].as_ref().unwrap(), "NAME"), Some("Cy"));
    }

    #[tokio::test]
    async fn test_short_row_yields_record_with_missing_fields() {
        let file = csv_file(&format!("{HEADER}\nAda,a@x.io\n"));

        let records = collect(&file).await;

        let raw = records[0].as_ref().unwrap();
        assert_eq!(field(raw, "NAME"), Some("Ada"));
        assert_eq!(field(raw, "GROUP"), None);
    }
}
