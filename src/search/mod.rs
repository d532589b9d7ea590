//! Search module for filter parsing, prompt filtering and sort order.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::entity::Prompt;

/// Which folder a prompt must belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderFilter {
    Unfiled,
    Folder(String),
}

/// Parsed search filter from query string.
///
/// Filters can be specified in the query string using prefixes:
/// - `tag:writing` - Filter by tag (can specify multiple, all must match)
/// - `folder:<id>` - Filter by folder; `folder:none` for unfiled prompts
/// - `is:favorite` / `is:pinned` - Only favorites / pinned prompts
/// - `created:>2025-01-01` - Created after date
/// - `created:<2025-12-31` - Created before date
#[derive(Debug, Default, Clone)]
pub struct SearchFilter {
    pub tags: Vec<String>,
    pub folder: Option<FolderFilter>,
    pub favorites_only: bool,
    pub pinned_only: bool,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
}

impl SearchFilter {
    /// Check if filter has any constraints.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
            && self.folder.is_none()
            && !self.favorites_only
            && !self.pinned_only
            && self.created_after.is_none()
            && self.created_before.is_none()
    }

    /// Check whether a prompt satisfies every constraint.
    pub fn matches(&self, prompt: &Prompt) -> bool {
        if !self.tags.iter().all(|t| prompt.has_tag(t)) {
            return false;
        }
        match &self.folder {
            Some(FolderFilter::Unfiled) if prompt.folder_id.is_some() => return false,
            Some(FolderFilter::Folder(id)) if prompt.folder_id.as_deref() != Some(id.as_str()) => {
                return false
            }
            _ => {}
        }
        if self.favorites_only && !prompt.is_favorite {
            return false;
        }
        if self.pinned_only && !prompt.is_pinned {
            return false;
        }
        if let Some(after) = self.created_after {
            if prompt.created_at <= after.timestamp_millis() {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if prompt.created_at >= before.timestamp_millis() {
                return false;
            }
        }
        true
    }
}

/// Parse a raw query string into (remaining query text, filters).
///
/// # Examples
///
/// ```
/// use promptvault::search::parse_query;
///
/// let (query, filter) = parse_query("tag:email is:favorite follow up");
/// assert_eq!(query, "follow up");
/// assert_eq!(filter.tags, vec!["email".to_string()]);
/// assert!(filter.favorites_only);
/// ```
pub fn parse_query(raw: &str) -> (String, SearchFilter) {
    let mut filter = SearchFilter::default();
    let mut remaining = Vec::new();

    for token in raw.split_whitespace() {
        if let Some(value) = token.strip_prefix("tag:") {
            filter.tags.push(value.to_string());
        } else if let Some(value) = token.strip_prefix("folder:") {
            filter.folder = Some(if value.eq_ignore_ascii_case("none") {
                FolderFilter::Unfiled
            } else {
                FolderFilter::Folder(value.to_string())
            });
        } else if token.eq_ignore_ascii_case("is:favorite") {
            filter.favorites_only = true;
        } else if token.eq_ignore_ascii_case("is:pinned") {
            filter.pinned_only = true;
        } else if let Some(value) = token.strip_prefix("created:>") {
            filter.created_after = parse_date(value);
        } else if let Some(value) = token.strip_prefix("created:<") {
            filter.created_before = parse_date(value);
        } else {
            remaining.push(token);
        }
    }

    (remaining.join(" "), filter)
}

/// Parse a date string into DateTime<Utc>.
/// Supports ISO 8601 date format (YYYY-MM-DD) or full datetime.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    // Try full datetime first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Try date only (YYYY-MM-DD) - set to midnight UTC
    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let datetime = date.and_hms_opt(0, 0, 0)?;
        return Some(DateTime::from_naive_utc_and_offset(datetime, Utc));
    }

    None
}

/// Case-insensitive match of free text against title, content or any tag
pub fn matches_text(prompt: &Prompt, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let q = query.to_lowercase();
    prompt.title.to_lowercase().contains(&q)
        || prompt.content.to_lowercase().contains(&q)
        || prompt.tags.iter().any(|t| t.to_lowercase().contains(&q))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOption {
    /// Most recently updated first
    #[default]
    Newest,
    Oldest,
    /// Title, case-insensitive
    Az,
    /// Pinned first, then most recently updated
    Pinned,
}

impl std::fmt::Display for SortOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOption::Newest => write!(f, "newest"),
            SortOption::Oldest => write!(f, "oldest"),
            SortOption::Az => write!(f, "az"),
            SortOption::Pinned => write!(f, "pinned"),
        }
    }
}

impl std::str::FromStr for SortOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "").as_str() {
            "newest" => Ok(SortOption::Newest),
            "oldest" => Ok(SortOption::Oldest),
            "az" | "title" => Ok(SortOption::Az),
            "pinned" => Ok(SortOption::Pinned),
            _ => Err(format!("Invalid sort option: {}", s)),
        }
    }
}

impl SortOption {
    pub fn compare(&self, a: &Prompt, b: &Prompt) -> Ordering {
        match self {
            SortOption::Newest => b.updated_at.cmp(&a.updated_at),
            SortOption::Oldest => a.updated_at.cmp(&b.updated_at),
            SortOption::Az => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortOption::Pinned => b
                .is_pinned
                .cmp(&a.is_pinned)
                .then_with(|| b.updated_at.cmp(&a.updated_at)),
        }
    }
}

/// Filter prompts by a raw query (text plus filter tokens) and sort them
pub fn search<'a>(prompts: &'a [Prompt], raw_query: &str, sort: SortOption) -> Vec<&'a Prompt> {
    let (text, filter) = parse_query(raw_query);
    let mut results: Vec<&Prompt> = prompts
        .iter()
        .filter(|p| filter.matches(p) && matches_text(p, &text))
        .collect();
    results.sort_by(|a, b| sort.compare(a, b));
    results
}
