//! AccessChecker trait for per-record and per-section privileges.
//!
//! A denied privilege is a normal answer (`Ok(false)`), never an error. Errors
//! are reserved for the checker itself failing.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::RwLock;
use thiserror::Error;
use vitrine_types::{LogId, Pi};

/// Error type for access checks.
#[derive(Error, Debug, Clone)]
pub enum AccessError {
    #[error("Access check for '{pi}' failed: {message}")]
    CheckFailed { pi: String, message: String },
}

/// Privileges the TOC engine asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Privilege {
    /// The record may appear in listings (anchor volumes).
    List,
    /// The PDF of a record or section may be downloaded.
    DownloadPdf,
}

/// Result of a batch privilege check over the sections of one record.
///
/// Sections without an explicit answer get the record-level `fallback`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionMap {
    sections: HashMap<LogId, bool>,
    fallback: bool,
}

impl PermissionMap {
    pub fn new(fallback: bool) -> Self {
        Self {
            sections: HashMap::new(),
            fallback,
        }
    }

    pub fn insert(&mut self, logid: LogId, granted: bool) {
        self.sections.insert(logid, granted);
    }

    pub fn is_granted(&self, logid: Option<&LogId>) -> bool {
        logid
            .and_then(|l| self.sections.get(l))
            .copied()
            .unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> bool {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

pub trait AccessChecker: Send + Sync + Debug {
    /// Checks one privilege for a record, or for one section of it when `logid` is given.
    fn check_permission(
        &self,
        pi: &Pi,
        logid: Option<&LogId>,
        privilege: Privilege,
    ) -> Result<bool, AccessError>;

    /// Checks one privilege for every section of a record at once.
    fn check_all_permissions(&self, pi: &Pi, privilege: Privilege) -> Result<PermissionMap, AccessError>;
}

/// Grants everything. The default for setups without access control.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl AccessChecker for AllowAll {
    fn check_permission(&self, _: &Pi, _: Option<&LogId>, _: Privilege) -> Result<bool, AccessError> {
        Ok(true)
    }

    fn check_all_permissions(&self, _: &Pi, _: Privilege) -> Result<PermissionMap, AccessError> {
        Ok(PermissionMap::new(true))
    }
}

/// Grants everything except explicitly registered denials, per record or per section.
#[derive(Debug, Default)]
pub struct InMemoryAccessChecker {
    denied_records: RwLock<HashSet<(Pi, Privilege)>>,
    denied_sections: RwLock<HashSet<(Pi, LogId, Privilege)>>,
}

impl InMemoryAccessChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny_record(&self, pi: impl Into<Pi>, privilege: Privilege) {
        if let Ok(mut denied) = self.denied_records.write() {
            denied.insert((pi.into(), privilege));
        }
    }

    pub fn deny_section(&self, pi: impl Into<Pi>, logid: impl Into<LogId>, privilege: Privilege) {
        if let Ok(mut denied) = self.denied_sections.write() {
            denied.insert((pi.into(), logid.into(), privilege));
        }
    }

    fn poisoned(pi: &Pi) -> AccessError {
        AccessError::CheckFailed {
            pi: pi.to_string(),
            message: "access store lock poisoned".to_string(),
        }
    }
}

impl AccessChecker for InMemoryAccessChecker {
    fn check_permission(
        &self,
        pi: &Pi,
        logid: Option<&LogId>,
        privilege: Privilege,
    ) -> Result<bool, AccessError> {
        let records = self.denied_records.read().map_err(|_| Self::poisoned(pi))?;
        if records.contains(&(pi.clone(), privilege)) {
            return Ok(false);
        }
        if let Some(logid) = logid {
            let sections = self.denied_sections.read().map_err(|_| Self::poisoned(pi))?;
            if sections.contains(&(pi.clone(), logid.clone(), privilege)) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn check_all_permissions(&self, pi: &Pi, privilege: Privilege) -> Result<PermissionMap, AccessError> {
        let mut map = PermissionMap::new(self.check_permission(pi, None, privilege)?);
        let sections = self.denied_sections.read().map_err(|_| Self::poisoned(pi))?;
        for (_, logid, _) in sections.iter().filter(|(p, _, v)| p == pi && *v == privilege) {
            map.insert(logid.clone(), false);
        }
        Ok(map)
    }
}
