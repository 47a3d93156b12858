use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::path::Path;

use fs2::FileExt;

use super::{ReadError, WriteError};
use crate::{ActivityEvent, AliasAssignment, FeatureSummary};

/// Exact header the alias stream must carry, in order.
pub const ALIAS_SCHEMA: [&str; 3] = ["timestamp", "user_id", "alias_user_id"];

const SUMMARY_HEADER: [&str; 3] = ["feature_key", "feature_value", "event_count"];

/// Read the canonical user set from a CSV with a `user_id` column.
///
/// Duplicate ids collapse into the set; extra columns are ignored.
pub fn read_user_ids(path: impl AsRef<Path>) -> Result<HashSet<String>, ReadError> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let header = reader.headers()?.clone();
    let Some(column) = header.iter().position(|name| name == "user_id") else {
        return Err(ReadError::MissingColumn {
            column: "user_id",
            header: header.iter().map(str::to_string).collect(),
        });
    };

    let mut ids = HashSet::new();
    for record in reader.records() {
        let record = record?;
        if let Some(id) = record.get(column) {
            ids.insert(id.to_string());
        }
    }
    Ok(ids)
}

/// Streaming reader over the alias-assignment CSV.
///
/// The header is validated against [`ALIAS_SCHEMA`] at open time, before any
/// data row is read; a mismatch fails the whole stage.
pub struct AliasStreamReader {
    records: csv::DeserializeRecordsIntoIter<File, AliasAssignment>,
}

impl std::fmt::Debug for AliasStreamReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AliasStreamReader").finish_non_exhaustive()
    }
}

impl AliasStreamReader {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        let file = File::open(path)?;
        let mut reader = csv::Reader::from_reader(file);
        let header = reader.headers()?;
        let matches = header.len() == ALIAS_SCHEMA.len()
            && header.iter().zip(ALIAS_SCHEMA).all(|(actual, expected)| actual == expected);
        if !matches {
            return Err(ReadError::SchemaMismatch {
                expected: &ALIAS_SCHEMA,
                actual: header.iter().map(str::to_string).collect(),
            });
        }
        Ok(Self {
            records: reader.into_deserialize(),
        })
    }
}

impl Iterator for AliasStreamReader {
    type Item = Result<AliasAssignment, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.records.next()?.map_err(ReadError::from))
    }
}

/// Streaming reader over the activity-event CSV.
///
/// Requires `user_id`, `feature_key` and `feature_value` columns by name;
/// extra columns are ignored.
pub struct ActivityEventReader {
    records: csv::DeserializeRecordsIntoIter<File, ActivityEvent>,
}

impl ActivityEventReader {
    const REQUIRED: [&'static str; 3] = ["user_id", "feature_key", "feature_value"];

    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReadError> {
        let file = File::open(path)?;
        let mut reader = csv::Reader::from_reader(file);
        let header = reader.headers()?;
        for column in Self::REQUIRED {
            if !header.iter().any(|name| name == column) {
                return Err(ReadError::MissingColumn {
                    column,
                    header: header.iter().map(str::to_string).collect(),
                });
            }
        }
        Ok(Self {
            records: reader.into_deserialize(),
        })
    }
}

impl Iterator for ActivityEventReader {
    type Item = Result<ActivityEvent, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.records.next()?.map_err(ReadError::from))
    }
}

/// Writes the summary CSV under an exclusive lock.
pub struct SummaryWriter {
    file: File,
}

impl SummaryWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, WriteError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Self { file })
    }

    /// Write the whole summary, one row per `(feature_key, feature_value)`
    /// pair in the summary's stable order.
    ///
    /// Holds an exclusive lock for the duration of the write and releases
    /// it on every exit path. Data is flushed and fsynced before returning.
    pub fn write(&mut self, summary: &FeatureSummary) -> Result<(), WriteError> {
        self.file
            .try_lock_exclusive()
            .map_err(|_| WriteError::AlreadyLocked)?;

        let result = self.write_rows(summary);

        // Always release the lock, even on error
        let _ = FileExt::unlock(&self.file);
        result
    }

    fn write_rows(&mut self, summary: &FeatureSummary) -> Result<(), WriteError> {
        {
            let mut writer = csv::Writer::from_writer(&mut self.file);
            writer.write_record(SUMMARY_HEADER)?;
            for (key, value, count) in summary.iter() {
                writer.write_record([key, value, count.to_string().as_str()])?;
            }
            writer.flush()?;
        }
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn read_user_ids_collapses_duplicates() {
        let file = temp_csv("user_id,name\nu1,Alice\nu2,Bob\nu1,Alice\n");
        let ids = read_user_ids(file.path()).unwrap();

        assert_eq!(ids.len(), 2);
        assert!(ids.contains("u1"));
        assert!(ids.contains("u2"));
    }

    #[test]
    fn read_user_ids_requires_user_id_column() {
        let file = temp_csv("id,name\nu1,Alice\n");
        let result = read_user_ids(file.path());

        assert!(matches!(
            result,
            Err(ReadError::MissingColumn {
                column: "user_id",
                ..
            })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = read_user_ids("/nonexistent/users.csv");
        assert!(matches!(result, Err(ReadError::Io(_))));
    }

    #[test]
    fn alias_reader_yields_records_in_order() {
        let file = temp_csv(
            "timestamp,user_id,alias_user_id\n\
             2024-01-15T10:00:00Z,u1,a1\n\
             2024-01-15T10:01:00Z,a1,a2\n",
        );
        let records: Vec<_> = AliasStreamReader::open(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            records,
            vec![
                AliasAssignment::new("2024-01-15T10:00:00Z", "u1", "a1"),
                AliasAssignment::new("2024-01-15T10:01:00Z", "a1", "a2"),
            ]
        );
    }

    #[test]
    fn alias_reader_rejects_wrong_header_before_any_row() {
        let file = temp_csv("ts,uid,alias\n2024-01-15T10:00:00Z,u1,a1\n");
        let result = AliasStreamReader::open(file.path());

        match result {
            Err(ReadError::SchemaMismatch { expected, actual }) => {
                assert_eq!(expected, &ALIAS_SCHEMA[..]);
                assert_eq!(actual, vec!["ts", "uid", "alias"]);
            }
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn alias_reader_rejects_reordered_header() {
        let file = temp_csv("user_id,timestamp,alias_user_id\nu1,t,a1\n");
        let result = AliasStreamReader::open(file.path());

        assert!(matches!(result, Err(ReadError::SchemaMismatch { .. })));
    }

    #[test]
    fn event_reader_ignores_extra_columns() {
        let file = temp_csv(
            "user_id,feature_key,feature_value,session\n\
             u1,search,enabled,s1\n",
        );
        let events: Vec<_> = ActivityEventReader::open(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(events, vec![ActivityEvent::new("u1", "search", "enabled")]);
    }

    #[test]
    fn event_reader_requires_feature_columns() {
        let file = temp_csv("user_id,feature_key\nu1,search\n");
        let result = ActivityEventReader::open(file.path());

        assert!(matches!(
            result,
            Err(ReadError::MissingColumn {
                column: "feature_value",
                ..
            })
        ));
    }

    #[test]
    fn summary_writer_emits_header_and_ordered_rows() {
        let mut summary = FeatureSummary::default();
        summary.record("search".to_string(), "enabled".to_string());
        summary.record("export".to_string(), "csv".to_string());
        summary.record("search".to_string(), "enabled".to_string());

        let file = NamedTempFile::new().unwrap();
        SummaryWriter::create(file.path())
            .unwrap()
            .write(&summary)
            .unwrap();

        let written = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(
            written,
            "feature_key,feature_value,event_count\n\
             export,csv,1\n\
             search,enabled,2\n"
        );
    }

    #[test]
    fn summary_writer_truncates_previous_contents() {
        let file = temp_csv("stale contents that should disappear\n");

        let mut summary = FeatureSummary::default();
        summary.record("k".to_string(), "v".to_string());
        SummaryWriter::create(file.path())
            .unwrap()
            .write(&summary)
            .unwrap();

        let written = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(written, "feature_key,feature_value,event_count\nk,v,1\n");
    }
}
