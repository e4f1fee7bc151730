use crate::model::{BugRecord, BugStatus, RawBug};
use crate::utils::parse_utc_naive;
use std::collections::HashSet;

/// Ingests raw bugs, collapsing repeated ids (first occurrence wins).
pub fn normalize_all(raw: Vec<RawBug>) -> Vec<BugRecord> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter(|bug| seen.insert(bug.id))
        .map(normalize_bug)
        .collect()
}

/// Resolves absent remote fields: text becomes empty, timestamps become `None`.
pub fn normalize_bug(raw: RawBug) -> BugRecord {
    BugRecord {
        id: raw.id,
        title: raw.title.unwrap_or_default().trim().to_string(),
        description: raw.description.unwrap_or_default().trim().to_string(),
        status: raw
            .status
            .as_deref()
            .map(BugStatus::parse)
            .unwrap_or_else(|| BugStatus::Other("Unknown".into())),
        created_at: raw.date_created.as_deref().and_then(parse_utc_naive),
        updated_at: raw.date_last_updated.as_deref().and_then(parse_utc_naive),
    }
}

/// Builds one document per record: title, a space, then the description.
pub fn normalize(records: &[BugRecord]) -> Vec<String> {
    records.iter().map(document_text).collect()
}

fn document_text(bug: &BugRecord) -> String {
    if bug.description.is_empty() {
        bug.title.clone()
    } else {
        format!("{} {}", bug.title, bug.description)
    }
}
