use crate::{
    errors::{KeystoreError, KeystoreResult},
    schemas::{SignerRecord, KEYSTORE_EXTENSION},
};
use poolvote_batch_tx::Signer;
use serde_json::Value;
use std::{
    fmt::Display,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// `name` with the keystore extension appended
pub fn keystore_path(name: &str) -> PathBuf {
    PathBuf::from(format!("{}.{}", name, KEYSTORE_EXTENSION))
}

/// Read every usable signer from a keystore file
///
/// Each record goes through `parse`, which rebuilds the signer from its
/// secret. Records that are malformed or that `parse` rejects are skipped
/// with a warning; a document that is not an array fails as a whole.
pub fn read_signers<P, F, E>(path: P, mut parse: F) -> KeystoreResult<Vec<Signer>>
where
    P: AsRef<Path>,
    F: FnMut(&SignerRecord) -> Result<Signer, E>,
    E: Display,
{
    let path = path.as_ref();
    let file = File::open(path)?;
    let document: Value = serde_json::from_reader(BufReader::new(file))?;

    let Value::Array(entries) = document else {
        return Err(KeystoreError::InvalidFormat(format!(
            "{} does not hold a JSON array",
            path.display()
        )));
    };

    let mut signers = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let record: SignerRecord = match serde_json::from_value(entry) {
            Ok(record) => record,
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed keystore record");
                continue;
            }
        };

        match parse(&record) {
            Ok(signer) => signers.push(signer),
            Err(e) => warn!(
                index,
                account = %record.address,
                error = %e,
                "Skipping keystore record with an unusable secret"
            ),
        }
    }

    debug!(path = %path.display(), count = signers.len(), "Read keystore");
    Ok(signers)
}

/// Create or truncate `path` and write `signers` as pretty-printed JSON
pub fn write_signers<P: AsRef<Path>>(path: P, signers: &[Signer]) -> KeystoreResult<()> {
    let path = path.as_ref();
    let records: Vec<SignerRecord> = signers.iter().map(SignerRecord::from).collect();

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &records)?;
    writer.flush()?;

    debug!(path = %path.display(), count = records.len(), "Wrote keystore");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{tempdir, NamedTempFile};

    fn accept(record: &SignerRecord) -> Result<Signer, String> {
        Ok(Signer::new(&record.address, &record.secret))
    }

    fn require_s_prefix(record: &SignerRecord) -> Result<Signer, String> {
        if record.secret.starts_with('S') {
            Ok(Signer::new(&record.address, &record.secret))
        } else {
            Err(format!("bad secret for {}", record.address))
        }
    }

    #[test]
    fn test_keystore_path_appends_extension() {
        assert_eq!(keystore_path("accounts"), PathBuf::from("accounts.json"));
        assert_eq!(
            keystore_path("runs/new_accounts"),
            PathBuf::from("runs/new_accounts.json")
        );
    }

    #[test]
    fn test_write_and_read_signers() {
        let signers = vec![Signer::new("GA1", "SA1"), Signer::new("GA2", "SA2")];

        let temp_file = NamedTempFile::new().unwrap();
        write_signers(temp_file.path(), &signers).unwrap();
        let read = read_signers(temp_file.path(), accept).unwrap();

        assert_eq!(read, signers);

        let raw = fs::read_to_string(temp_file.path()).unwrap();
        assert!(raw.contains("\"pub\": \"GA1\""));
        assert!(raw.contains("\"sec\": \"SA2\""));
    }

    #[test]
    fn test_write_truncates_existing_file() {
        let temp_file = NamedTempFile::new().unwrap();
        write_signers(temp_file.path(), &[Signer::new("GA1", "SA1"), Signer::new("GA2", "SA2")])
            .unwrap();
        write_signers(temp_file.path(), &[Signer::new("GA3", "SA3")]).unwrap();

        let read = read_signers(temp_file.path(), accept).unwrap();
        assert_eq!(read, vec![Signer::new("GA3", "SA3")]);
    }

    #[test]
    fn test_bad_records_are_skipped() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(
            temp_file.path(),
            r#"[
                {"pub": "GA1", "sec": "SA1"},
                {"pub": "GA2"},
                "not an object",
                {"pub": "GA3", "sec": "XA3"},
                {"pub": "GA4", "sec": "SA4"}
            ]"#,
        )
        .unwrap();

        let read = read_signers(temp_file.path(), require_s_prefix).unwrap();
        assert_eq!(read, vec![Signer::new("GA1", "SA1"), Signer::new("GA4", "SA4")]);
    }

    #[test]
    fn test_non_array_document_is_an_error() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), r#"{"pub": "GA1", "sec": "SA1"}"#).unwrap();

        assert!(matches!(
            read_signers(temp_file.path(), accept),
            Err(KeystoreError::InvalidFormat(_))
        ));

        fs::write(temp_file.path(), "not json").unwrap();
        assert!(matches!(
            read_signers(temp_file.path(), accept),
            Err(KeystoreError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            read_signers(dir.path().join("absent.json"), accept),
            Err(KeystoreError::Io(_))
        ));
    }
}
