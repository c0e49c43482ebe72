use chrono::{NaiveDateTime, NaiveTime};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

pub type ViolationId = i64;
pub type InspectionId = i64;

/// Format of both date columns in the source file, e.g. `2012-01-03 00:00:00`.
/// The time part is always midnight, anything else is rejected.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single violation as found in one row of the CSV file. There's no reason to ever
/// change one after it's been read, so everything is plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Violation {
    pub id: ViolationId,
    pub inspection_id: InspectionId,
    pub category: String,
    pub entered: NaiveDateTime,
    /// `None` means the violation is still open, which isn't the same as a
    /// (weird but valid) `0001-01-01` close date.
    pub closed: Option<NaiveDateTime>,
    pub violation_type: String,
}

/// The row exactly as the CSV reader sees it. Fields are positional:
/// `id, inspection_id, category, entered, closed, type`. We keep everything as
/// strings here so a bad field turns into a `FieldError` naming the culprit
/// instead of an opaque serde message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RawViolation {
    pub id: String,
    pub inspection_id: String,
    pub category: String,
    pub entered: String,
    pub closed: String,
    pub violation_type: String,
}

impl TryFrom<RawViolation> for Violation {
    type Error = FieldError;

    fn try_from(raw: RawViolation) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_int("violation_id", &raw.id)?,
            inspection_id: parse_int("inspection_id", &raw.inspection_id)?,
            entered: parse_date("violation_date", &raw.entered)?,
            closed: if raw.closed.is_empty() {
                None
            } else {
                Some(parse_date("violation_date_closed", &raw.closed)?)
            },
            category: raw.category,
            violation_type: raw.violation_type,
        })
    }
}

fn parse_int(field: &'static str, value: &str) -> Result<i64, FieldError> {
    if value.is_empty() {
        return Err(FieldError::MissingField { field });
    }
    value.parse().map_err(|_| FieldError::InvalidInteger {
        field,
        value: value.to_owned(),
    })
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDateTime, FieldError> {
    if value.is_empty() {
        return Err(FieldError::MissingField { field });
    }
    match NaiveDateTime::parse_from_str(value, DATE_FORMAT) {
        Ok(date) if date.time() == NaiveTime::MIN => Ok(date),
        _ => Err(FieldError::InvalidDate {
            field,
            value: value.to_owned(),
        }),
    }
}

/// What can go wrong when turning one raw row into a `Violation`. What to do about it
/// (skip the row or give up) is the caller's business, see `RowPolicy`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("field `{field}` is empty")]
    MissingField { field: &'static str },
    #[error("field `{field}` is not an integer: {value:?}")]
    InvalidInteger { field: &'static str, value: String },
    #[error("field `{field}` is not a `YYYY-MM-DD 00:00:00` date: {value:?}")]
    InvalidDate { field: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("failed fetching {url}: {reason}")]
    Request { url: String, reason: String },
    #[error("failed creating local copy {}: {source}", path.display())]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed writing local copy {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed opening {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("malformed row at line {line}: {source}")]
    Row { line: u64, source: FieldError },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CategoryError {
    #[error("category {0:?} has no violations")]
    Empty(String),
}
