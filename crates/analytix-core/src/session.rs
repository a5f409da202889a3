//! Login bookkeeping and the landing screen's recent-analyses list.
//!
//! Credentials are never checked; a login only bumps counters in the store.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{KeyValueStore, StoreError};

const KEY_LOGIN_COUNT: &str = "loginCount";
const KEY_LAST_LOGIN: &str = "lastLogin";
const KEY_USER: &str = "user";
const KEY_ANALYSES: &str = "analyses";

/// Most recent analyses kept on the landing screen.
pub const MAX_RECENT_ANALYSES: usize = 25;

const ID_SUFFIX_LEN: usize = 4;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("username and password are required")]
    EmptyCredentials,
    #[error("analysis name is required")]
    EmptyName,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Entry of the recent-analyses list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMeta {
    pub id: String,
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl AnalysisMeta {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.created_at).single()
    }
}

/// Usage numbers for the landing screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub login_count: u64,
    pub last_login: Option<DateTime<Utc>>,
    pub projects_created: usize,
    pub current_user: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredUser {
    username: String,
}

/// Lowercase, collapse runs of anything outside `[a-z0-9]` to `-`, trim `-`.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_SLUG
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

fn random_suffix() -> String {
    (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[fastrand::usize(..BASE36.len())] as char)
        .collect()
}

/// Session bookkeeping over an injected store.
#[derive(Debug)]
pub struct Session<S> {
    store: S,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record a username/password login. Any non-empty pair is accepted.
    pub fn login(&self, username: &str, password: &str) -> Result<(), SessionError> {
        if username.is_empty() || password.is_empty() {
            return Err(SessionError::EmptyCredentials);
        }
        self.record_login(username)
    }

    /// Record a login through a third-party provider button.
    pub fn login_with_provider(&self, provider: &str) -> Result<(), SessionError> {
        self.record_login(provider)
    }

    fn record_login(&self, username: &str) -> Result<(), SessionError> {
        let count = self.login_count()? + 1;
        let now = Utc::now().timestamp_millis();
        let user = serde_json::to_string(&StoredUser {
            username: username.to_string(),
        })
        .map_err(|e| invalid(KEY_USER, e))?;

        self.store.set(KEY_LOGIN_COUNT, &count.to_string())?;
        self.store.set(KEY_LAST_LOGIN, &now.to_string())?;
        self.store.set(KEY_USER, &user)?;
        log::info!("login #{count} as {username}");
        Ok(())
    }

    pub fn login_count(&self) -> Result<u64, SessionError> {
        Ok(self.read_number(KEY_LOGIN_COUNT)?.unwrap_or(0).max(0) as u64)
    }

    pub fn last_login(&self) -> Result<Option<DateTime<Utc>>, SessionError> {
        Ok(self
            .read_number(KEY_LAST_LOGIN)?
            .filter(|&ms| ms > 0)
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()))
    }

    pub fn current_user(&self) -> Result<Option<String>, SessionError> {
        let Some(raw) = self.store.get(KEY_USER)? else {
            return Ok(None);
        };
        let user: StoredUser = serde_json::from_str(&raw).map_err(|e| invalid(KEY_USER, e))?;
        Ok(Some(user.username))
    }

    pub fn overview(&self) -> Result<Overview, SessionError> {
        Ok(Overview {
            login_count: self.login_count()?,
            last_login: self.last_login()?,
            projects_created: self.recent_analyses()?.len(),
            current_user: self.current_user()?,
        })
    }

    /// Newest first, at most [`MAX_RECENT_ANALYSES`].
    pub fn recent_analyses(&self) -> Result<Vec<AnalysisMeta>, SessionError> {
        match self.store.get(KEY_ANALYSES)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| invalid(KEY_ANALYSES, e)),
            None => Ok(Vec::new()),
        }
    }

    pub fn find_analysis(&self, id: &str) -> Result<Option<AnalysisMeta>, SessionError> {
        Ok(self.recent_analyses()?.into_iter().find(|a| a.id == id))
    }

    /// Add a named analysis to the front of the list and return it.
    pub fn create_analysis(&self, name: &str) -> Result<AnalysisMeta, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }

        let meta = AnalysisMeta {
            id: format!("{}-{}", slugify(name), random_suffix()),
            name: name.to_string(),
            created_at: Utc::now().timestamp_millis(),
        };

        let mut analyses = self.recent_analyses()?;
        analyses.insert(0, meta.clone());
        analyses.truncate(MAX_RECENT_ANALYSES);

        let raw = serde_json::to_string(&analyses).map_err(|e| invalid(KEY_ANALYSES, e))?;
        self.store.set(KEY_ANALYSES, &raw)?;
        log::debug!("created analysis {} ({} stored)", meta.id, analyses.len());
        Ok(meta)
    }

    fn read_number(&self, key: &str) -> Result<Option<i64>, SessionError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match raw.trim().parse() {
            Ok(n) => Ok(Some(n)),
            Err(_) => {
                log::warn!("ignoring non-numeric {key}={raw:?}");
                Ok(None)
            }
        }
    }
}

fn invalid(key: &str, err: serde_json::Error) -> SessionError {
    SessionError::Store(StoreError::InvalidValue {
        key: key.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn session() -> Session<MemoryStore> {
        Session::new(MemoryStore::new())
    }

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("  Q3 Revenue -- Review!  "), "q3-revenue-review");
        assert_eq!(slugify("Ünïcode Name"), "n-code-name");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn login_requires_both_fields() {
        let s = session();
        assert!(matches!(s.login("", "pw"), Err(SessionError::EmptyCredentials)));
        assert!(matches!(s.login("ada", ""), Err(SessionError::EmptyCredentials)));
        assert_eq!(s.login_count().unwrap(), 0);
        assert!(s.store().is_empty());
    }

    #[test]
    fn login_counts_and_stamps() {
        let s = session();
        let before = Utc::now();
        s.login("ada", "anything").unwrap();
        s.login_with_provider("github").unwrap();

        let overview = s.overview().unwrap();
        assert_eq!(overview.login_count, 2);
        assert_eq!(overview.current_user.as_deref(), Some("github"));
        let last = overview.last_login.unwrap();
        assert!(last.timestamp_millis() >= before.timestamp_millis());
    }

    #[test]
    fn overview_serializes_camel_case() {
        let s = session();
        s.login("ada", "pw").unwrap();
        let value = serde_json::to_value(s.overview().unwrap()).unwrap();
        assert_eq!(value["loginCount"], 1);
        assert_eq!(value["currentUser"], "ada");
        assert_eq!(value["projectsCreated"], 0);
        assert!(value["lastLogin"].is_string());
        assert!(value.get("login_count").is_none());
    }

    #[test]
    fn fresh_overview_is_empty() {
        let overview = session().overview().unwrap();
        assert_eq!(overview, Overview::default());
    }

    #[test]
    fn garbage_login_count_reads_as_zero() {
        let s = session();
        s.store().set("loginCount", "lots").unwrap();
        assert_eq!(s.login_count().unwrap(), 0);
        s.login("ada", "pw").unwrap();
        assert_eq!(s.login_count().unwrap(), 1);
    }

    #[test]
    fn create_analysis_builds_slug_id() {
        let s = session();
        let meta = s.create_analysis("  Quarterly Audit ").unwrap();
        assert_eq!(meta.name, "Quarterly Audit");
        let re = Regex::new(r"^quarterly-audit-[0-9a-z]{4}$").unwrap();
        assert!(re.is_match(&meta.id), "id = {}", meta.id);
        assert!(meta.created().is_some());
        assert_eq!(s.find_analysis(&meta.id).unwrap(), Some(meta));
    }

    #[test]
    fn create_analysis_rejects_blank_name() {
        let s = session();
        assert!(matches!(s.create_analysis("   "), Err(SessionError::EmptyName)));
        assert!(s.recent_analyses().unwrap().is_empty());
    }

    #[test]
    fn recent_analyses_capped_newest_first() {
        let s = session();
        for i in 0..30 {
            s.create_analysis(&format!("run {i}")).unwrap();
        }
        let recent = s.recent_analyses().unwrap();
        assert_eq!(recent.len(), MAX_RECENT_ANALYSES);
        assert_eq!(recent[0].name, "run 29");
        assert_eq!(recent[MAX_RECENT_ANALYSES - 1].name, "run 5");
        assert_eq!(s.overview().unwrap().projects_created, MAX_RECENT_ANALYSES);
    }

    #[test]
    fn stored_list_uses_camel_case() {
        let s = session();
        s.create_analysis("x").unwrap();
        let raw = s.store().get("analyses").unwrap().unwrap();
        assert!(raw.contains("\"createdAt\""));
    }

    #[test]
    fn corrupt_list_surfaces_error() {
        let s = session();
        s.store().set("analyses", "{oops").unwrap();
        assert!(matches!(
            s.recent_analyses(),
            Err(SessionError::Store(StoreError::InvalidValue { .. }))
        ));
    }
}
