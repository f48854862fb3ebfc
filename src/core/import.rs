//! Merge a CSV of member attributes into `members.custom_data`.

use crate::core::business::require_business;
use crate::db::pool::DbPool;
use crate::db::repository::Repository;
use crate::errors::{AppError, AppResult};
use crate::models::member::MemberProfile;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Which CSV column identifies the member a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JoinColumn {
    Email,
    Id,
    Name,
}

impl JoinColumn {
    pub fn from_code(s: &str) -> AppResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(JoinColumn::Email),
            "id" => Ok(JoinColumn::Id),
            "name" => Ok(JoinColumn::Name),
            other => Err(AppError::validation(format!(
                "invalid join column '{other}' (expected email, id or name)"
            ))),
        }
    }

    pub fn header(&self) -> &'static str {
        match self {
            JoinColumn::Email => "email",
            JoinColumn::Id => "id",
            JoinColumn::Name => "name",
        }
    }

    fn matches(&self, profile: &MemberProfile, value: &str) -> bool {
        match self {
            JoinColumn::Id => profile.member.user_id == value,
            JoinColumn::Email => profile.email.trim().to_lowercase() == value.to_lowercase(),
            JoinColumn::Name => profile.name.trim() == value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowErrorKind {
    NoSuchMember,
    AmbiguousMember,
    MalformedRow,
}

impl fmt::Display for RowErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RowErrorKind::NoSuchMember => "no such member",
            RowErrorKind::AmbiguousMember => "ambiguous member",
            RowErrorKind::MalformedRow => "malformed row",
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    /// 1-based line number in the CSV (the header is line 1).
    pub line: u64,
    pub kind: RowErrorKind,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowUpdate {
    pub line: u64,
    pub user_id: String,
    pub fields: Vec<String>,
}

/// A value that was not written because the member already had one.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedField {
    pub line: u64,
    pub user_id: String,
    pub field: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub updated: Vec<RowUpdate>,
    pub skipped: Vec<SkippedField>,
    pub errors: Vec<RowError>,
}

/// Keys written and keys left alone by [`merge_row`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub written: Vec<String>,
    pub kept: Vec<String>,
}

/// Merge one row into `data`. Without `overwrite`, only absent or empty
/// values are filled in.
pub fn merge_row(
    data: &mut BTreeMap<String, String>,
    incoming: &[(String, String)],
    overwrite: bool,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();
    for (key, value) in incoming {
        let vacant = data.get(key).is_none_or(|v| v.trim().is_empty());
        if overwrite || vacant {
            data.insert(key.clone(), value.clone());
            outcome.written.push(key.clone());
        } else {
            outcome.kept.push(key.clone());
        }
    }
    outcome
}

fn line_of(record: &StringRecord, fallback: u64) -> u64 {
    record.position().map_or(fallback, |p| p.line())
}

/// Import `csv_text` into the custom data of the members of `business_id`.
///
/// Rows fail independently and are reported in [`ImportReport::errors`];
/// all successful rows are committed together.
pub fn import_custom_data(
    pool: &mut DbPool,
    business_id: i64,
    csv_text: &str,
    join_column: JoinColumn,
    overwrite: bool,
) -> AppResult<ImportReport> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(csv_text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(AppError::validation("CSV has no header row"));
    }

    let join_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(join_column.header()))
        .ok_or_else(|| {
            AppError::validation(format!(
                "CSV has no '{}' column to match members on",
                join_column.header()
            ))
        })?;

    pool.transaction(|repo| {
        require_business(repo, business_id)?;
        let mut profiles = repo.member_profiles(business_id)?;
        let mut report = ImportReport::default();

        for (i, row) in reader.records().enumerate() {
            let fallback_line = i as u64 + 2;
            let record = match row {
                Ok(r) => r,
                Err(e) => {
                    report.errors.push(RowError {
                        line: e.position().map_or(fallback_line, |p| p.line()),
                        kind: RowErrorKind::MalformedRow,
                        detail: e.to_string(),
                    });
                    continue;
                }
            };
            let line = line_of(&record, fallback_line);
            let key = record.get(join_idx).unwrap_or_default().trim().to_string();
            if key.is_empty() {
                report.errors.push(RowError {
                    line,
                    kind: RowErrorKind::NoSuchMember,
                    detail: format!("blank {}", join_column.header()),
                });
                continue;
            }

            let matches: Vec<usize> = profiles
                .iter()
                .enumerate()
                .filter(|(_, p)| join_column.matches(p, &key))
                .map(|(idx, _)| idx)
                .collect();

            let idx = match matches.as_slice() {
                [only] => *only,
                [] => {
                    report.errors.push(RowError {
                        line,
                        kind: RowErrorKind::NoSuchMember,
                        detail: format!("no member with {} '{}'", join_column.header(), key),
                    });
                    continue;
                }
                many => {
                    report.errors.push(RowError {
                        line,
                        kind: RowErrorKind::AmbiguousMember,
                        detail: format!(
                            "{} members share {} '{}'",
                            many.len(),
                            join_column.header(),
                            key
                        ),
                    });
                    continue;
                }
            };

            let incoming: Vec<(String, String)> = headers
                .iter()
                .zip(record.iter())
                .enumerate()
                .filter(|(col, (h, _))| *col != join_idx && !h.is_empty())
                .map(|(_, (h, v))| (h.clone(), v.trim().to_string()))
                .collect();

            let member = &mut profiles[idx].member;
            let outcome = merge_row(&mut member.custom_data, &incoming, overwrite);

            if !outcome.written.is_empty() {
                repo.update_custom_data(business_id, &member.user_id, &member.custom_data)?;
                report.updated.push(RowUpdate {
                    line,
                    user_id: member.user_id.clone(),
                    fields: outcome.written,
                });
            }
            report
                .skipped
                .extend(outcome.kept.into_iter().map(|field| SkippedField {
                    line,
                    user_id: member.user_id.clone(),
                    field,
                }));
        }

        repo.audit(
            "import",
            &business_id.to_string(),
            &format!(
                "Custom data import by {}: {} updated, {} skipped field(s), {} error(s)",
                join_column.header(),
                report.updated.len(),
                report.skipped.len(),
                report.errors.len()
            ),
        )?;
        Ok(report)
    })
}
