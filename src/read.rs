use crate::data::{DatasetError, RawViolation, Violation};
use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};
use tracing::{debug, trace, warn};

/// Trait for doing something with a `Violation` read from a CSV file.
/// `Categories` implements it to build the data set; tests use it to check what
/// comes out of the reader.
pub(crate) trait ViolationSink {
    fn use_violation(&mut self, violation: Violation);
}

/// What to do with a row whose fields don't parse.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowPolicy {
    /// Log a warning, skip the row and carry on.
    #[default]
    Skip,
    /// Give up on the whole file.
    Abort,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReadStats {
    pub ingested: usize,
    pub skipped: usize,
}

/// Drops spaces and tabs at the start of every field, outside quotes, before the
/// bytes reach the CSV parser. `csv` only honors a quote that opens the field, so
/// `1, "a, b"` would otherwise split inside the quotes. Quoted content and trailing
/// whitespace are left alone.
pub(crate) struct LeadingSpaceTrimmer<R> {
    inner: R,
    field_start: bool,
    in_quotes: bool,
    /// Previous byte closed a quoted section; another quote right after it is an
    /// escaped `""` and reopens it.
    just_closed: bool,
}

impl<R: Read> LeadingSpaceTrimmer<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            field_start: true,
            in_quotes: false,
            just_closed: false,
        }
    }

    fn keep(&mut self, b: u8) -> bool {
        if self.in_quotes {
            if b == b'"' {
                self.in_quotes = false;
                self.just_closed = true;
            }
            return true;
        }
        if self.field_start && (b == b' ' || b == b'\t') {
            return false;
        }
        if b == b'"' && (self.field_start || self.just_closed) {
            self.in_quotes = true;
        }
        self.just_closed = false;
        self.field_start = matches!(b, b',' | b'\n' | b'\r');
        true
    }
}

impl<R: Read> Read for LeadingSpaceTrimmer<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let read = self.inner.read(buf)?;
            if read == 0 {
                return Ok(0);
            }
            let mut kept = 0;
            for i in 0..read {
                let b = buf[i];
                if self.keep(b) {
                    buf[kept] = b;
                    kept += 1;
                }
            }
            // A chunk of nothing but stripped blanks must not look like EOF.
            if kept > 0 {
                return Ok(kept);
            }
        }
    }
}

/// CSV importer for `Violation`s. The first line is a header and is thrown away;
/// every other row must have exactly as many fields as the header, more or less is
/// an error whatever the `policy`.
pub(crate) fn read_violations<R: std::io::Read, S: ViolationSink>(
    reader: R,
    sink: &mut S,
    policy: RowPolicy,
) -> Result<ReadStats, DatasetError> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(LeadingSpaceTrimmer::new(reader));
    let mut stats = ReadStats::default();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |pos| pos.line());
        let raw: RawViolation = record.deserialize(None)?;
        match Violation::try_from(raw) {
            Ok(violation) => {
                trace!(
                    "violation #{} (inspection #{}, {:?}) entered {}, closed {:?}",
                    violation.id,
                    violation.inspection_id,
                    violation.violation_type,
                    violation.entered,
                    violation.closed
                );
                sink.use_violation(violation);
                stats.ingested += 1;
            }
            Err(source) if policy == RowPolicy::Abort => {
                return Err(DatasetError::Row { line, source });
            }
            Err(e) => {
                warn!("skipping row at line {line}: {e}");
                stats.skipped += 1;
            }
        }
    }
    debug!(
        "read {} violations, skipped {}",
        stats.ingested, stats.skipped
    );
    Ok(stats)
}

/// Same as `read_violations`, straight from a file on disk.
pub(crate) fn read_violations_file<S: ViolationSink>(
    path: &Path,
    sink: &mut S,
    policy: RowPolicy,
) -> Result<ReadStats, DatasetError> {
    let file = File::open(path).map_err(|source| DatasetError::Open {
        path: path.to_owned(),
        source,
    })?;
    read_violations(file, sink, policy)
}

#[cfg(test)]
mod tests {
    use super::{
        read_violations, read_violations_file, LeadingSpaceTrimmer, ReadStats, RowPolicy,
        ViolationSink,
    };
    use crate::data::{DatasetError, FieldError, Violation};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::io::Read;

    #[derive(Default)]
    struct ViolationStorage {
        violations: Vec<Violation>,
    }

    impl ViolationSink for ViolationStorage {
        fn use_violation(&mut self, violation: Violation) {
            self.violations.push(violation)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    const HEADER: &str = "violation_id,inspection_id,violation_category,violation_date,violation_date_closed,violation_type\n";

    fn csv(rows: &str) -> Vec<u8> {
        format!("{HEADER}{rows}").into_bytes()
    }

    #[test]
    fn read_violations_csv() {
        let mut storage = ViolationStorage::default();
        let violations_csv = csv("\
204851, 261019, Garbage and Refuse, 2012-01-03 00:00:00, 2012-02-02 00:00:00, Refuse Accumulation
207281,268694,\"Animals and Pests\",2012-01-03 00:00:00,,\"Insects, Rodents, Animals\"
");
        let stats =
            read_violations(&violations_csv[..], &mut storage, RowPolicy::Skip).unwrap();
        assert_eq!(
            stats,
            ReadStats {
                ingested: 2,
                skipped: 0
            }
        );
        assert_eq!(
            storage.violations,
            [
                Violation {
                    id: 204851,
                    inspection_id: 261019,
                    category: "Garbage and Refuse".into(),
                    entered: date(2012, 1, 3),
                    closed: Some(date(2012, 2, 2)),
                    violation_type: "Refuse Accumulation".into(),
                },
                Violation {
                    id: 207281,
                    inspection_id: 268694,
                    category: "Animals and Pests".into(),
                    entered: date(2012, 1, 3),
                    closed: None,
                    violation_type: "Insects, Rodents, Animals".into(),
                },
            ]
        );
    }

    #[test]
    fn space_before_quoted_field() {
        let mut storage = ViolationStorage::default();
        let violations_csv = csv("\
1, 10, \"Animals, Pests\", 2012-01-03 00:00:00, , \"Insects, Rodents\"
");
        let stats =
            read_violations(&violations_csv[..], &mut storage, RowPolicy::Abort).unwrap();
        assert_eq!(stats.ingested, 1);
        assert_eq!(
            storage.violations,
            [Violation {
                id: 1,
                inspection_id: 10,
                category: "Animals, Pests".into(),
                entered: date(2012, 1, 3),
                closed: None,
                violation_type: "Insects, Rodents".into(),
            }]
        );
    }

    #[test]
    fn quoted_whitespace_is_kept() {
        let mut storage = ViolationStorage::default();
        let violations_csv = csv("\
1,10,\"  Vermin \",2012-01-03 00:00:00,,x
2,20, Vermin,2012-01-04 00:00:00,,\" \"\"Rats\"\" \"
");
        read_violations(&violations_csv[..], &mut storage, RowPolicy::Abort).unwrap();
        assert_eq!(storage.violations[0].category, "  Vermin ");
        assert_eq!(storage.violations[1].category, "Vermin");
        assert_eq!(storage.violations[1].violation_type, " \"Rats\" ");
    }

    #[test]
    fn trimmer_keeps_quoted_newlines() {
        let input = b"a,  \"x,\n  y\"\n\t b, c \n";
        let mut out = String::new();
        LeadingSpaceTrimmer::new(&input[..])
            .read_to_string(&mut out)
            .unwrap();
        assert_eq!(out, "a,\"x,\n  y\"\nb,c \n");
    }

    #[test]
    fn header_only() {
        let mut storage = ViolationStorage::default();
        let stats =
            read_violations(HEADER.as_bytes(), &mut storage, RowPolicy::Abort).unwrap();
        assert_eq!(stats, ReadStats::default());
        assert!(storage.violations.is_empty());
    }

    #[test]
    fn skip_malformed_rows() {
        let mut storage = ViolationStorage::default();
        let violations_csv = csv("\
1,10,A,2012-01-03 00:00:00,,x
two,20,A,2012-01-04 00:00:00,,x
3,30,A,sometime,,x
4,40,A,2012-01-05 00:00:00,,x
");
        let stats =
            read_violations(&violations_csv[..], &mut storage, RowPolicy::Skip).unwrap();
        assert_eq!(
            stats,
            ReadStats {
                ingested: 2,
                skipped: 2
            }
        );
        let ids: Vec<i64> = storage.violations.iter().map(|v| v.id).collect();
        assert_eq!(ids, [1, 4]);
    }

    #[test]
    fn abort_on_malformed_row() {
        let mut storage = ViolationStorage::default();
        let violations_csv = csv("\
1,10,A,2012-01-03 00:00:00,,x
two,20,A,2012-01-04 00:00:00,,x
");
        match read_violations(&violations_csv[..], &mut storage, RowPolicy::Abort) {
            Err(DatasetError::Row { line, source }) => {
                assert_eq!(line, 3);
                assert_eq!(
                    source,
                    FieldError::InvalidInteger {
                        field: "violation_id",
                        value: "two".into()
                    }
                );
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn reject_short_row() {
        let mut storage = ViolationStorage::default();
        let violations_csv = csv("1,10,A,2012-01-03 00:00:00,\n");
        assert!(matches!(
            read_violations(&violations_csv[..], &mut storage, RowPolicy::Skip),
            Err(DatasetError::Csv(_))
        ));
    }

    #[test]
    fn reject_long_row() {
        let mut storage = ViolationStorage::default();
        let violations_csv = csv("1,10,A,2012-01-03 00:00:00,,x,extra\n");
        assert!(matches!(
            read_violations(&violations_csv[..], &mut storage, RowPolicy::Skip),
            Err(DatasetError::Csv(_))
        ));
        assert!(storage.violations.is_empty());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = ViolationStorage::default();
        assert!(matches!(
            read_violations_file(
                &dir.path().join("nope.csv"),
                &mut storage,
                RowPolicy::Skip
            ),
            Err(DatasetError::Open { .. })
        ));
    }

    #[test]
    fn read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Violations-2012.csv");
        std::fs::write(&path, csv("5,50,B,2012-07-01 00:00:00,,y\n")).unwrap();
        let mut storage = ViolationStorage::default();
        let stats = read_violations_file(&path, &mut storage, RowPolicy::Abort).unwrap();
        assert_eq!(stats.ingested, 1);
        assert_eq!(storage.violations[0].category, "B");
    }
}
