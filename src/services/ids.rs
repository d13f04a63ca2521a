//! Canonical identifiers.
//!
//! Ids reach the service as plain strings, but older writers stored references as
//! `ObjectId("...")` literals or extended-JSON `{"$oid": "..."}` objects, sometimes
//! with upper-case hex. [`normalize`] is the single conversion used at every boundary;
//! [`representations`] lists the legacy spellings of a canonical id for lookups that
//! must still match rows not yet rewritten by the canonicalisation migration.

const OBJECT_ID_LEN: usize = 24;

pub(crate) fn normalize(raw: &str) -> String {
    let mut value = raw.trim();

    if let Some(inner) = value.strip_prefix("ObjectId(").and_then(|rest| rest.strip_suffix(')')) {
        value = inner.trim();
    }

    if value.starts_with('{') {
        if let Some(oid) = extended_json_oid(value) {
            return canonical_case(&oid);
        }
    }

    canonical_case(strip_quotes(value))
}

/// Normalizes every entry, drops blanks and keeps the first occurrence of duplicates.
pub(crate) fn normalize_list<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    raw.into_iter()
        .map(|item| normalize(item.as_ref()))
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

pub(crate) fn same_id(left: &str, right: &str) -> bool {
    let left = normalize(left);
    !left.is_empty() && left == normalize(right)
}

pub(crate) fn representations(id: &str) -> Vec<String> {
    let canonical = normalize(id);
    if canonical.is_empty() {
        return Vec::new();
    }

    let mut forms = vec![
        canonical.clone(),
        format!("ObjectId(\"{canonical}\")"),
        format!("ObjectId('{canonical}')"),
        format!("{{\"$oid\":\"{canonical}\"}}"),
        format!("{{\"$oid\": \"{canonical}\"}}"),
    ];

    if is_object_id(&canonical) {
        let upper = canonical.to_ascii_uppercase();
        if upper != canonical {
            forms.push(format!("ObjectId(\"{upper}\")"));
            forms.push(upper);
        }
    }

    forms
}

pub(crate) fn is_object_id(value: &str) -> bool {
    value.len() == OBJECT_ID_LEN && value.chars().all(|ch| ch.is_ascii_hexdigit())
}

fn extended_json_oid(value: &str) -> Option<String> {
    let parsed: serde_json::Value = serde_json::from_str(value).ok()?;
    parsed.get("$oid").and_then(serde_json::Value::as_str).map(|oid| oid.trim().to_string())
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote).and_then(|rest| rest.strip_suffix(quote)) {
            return inner.trim();
        }
    }
    value
}

fn canonical_case(value: &str) -> String {
    if is_object_id(value) {
        value.to_ascii_lowercase()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OID: &str = "65a1f0c2e4b0a1b2c3d4e5f6";

    #[test]
    fn legacy_spellings_collapse_to_one_id() {
        let spellings = [
            OID.to_string(),
            format!("  {OID} "),
            format!("ObjectId(\"{OID}\")"),
            format!("ObjectId('{OID}')"),
            format!("{{\"$oid\": \"{OID}\"}}"),
            format!("\"{OID}\""),
            OID.to_ascii_uppercase(),
        ];

        for spelling in spellings {
            assert_eq!(normalize(&spelling), OID, "spelling {spelling}");
        }
    }

    #[test]
    fn non_object_ids_keep_their_case() {
        assert_eq!(normalize("User-42"), "User-42");
        assert_eq!(
            normalize("9F1C2B1E-0000-4000-8000-ABCDEFABCDEF"),
            "9F1C2B1E-0000-4000-8000-ABCDEFABCDEF"
        );
    }

    #[test]
    fn malformed_extended_json_is_left_alone() {
        assert_eq!(normalize("{\"$oid\": 12}"), "{\"$oid\": 12}");
        assert_eq!(normalize("{oops"), "{oops");
    }

    #[test]
    fn normalize_list_drops_blanks_and_duplicates() {
        let raw = vec![
            OID.to_string(),
            "   ".to_string(),
            format!("ObjectId(\"{OID}\")"),
            String::new(),
            "student-2".to_string(),
        ];
        assert_eq!(normalize_list(raw), vec![OID.to_string(), "student-2".to_string()]);
    }

    #[test]
    fn same_id_ignores_representation() {
        assert!(same_id(&format!("{{\"$oid\":\"{OID}\"}}"), &OID.to_ascii_uppercase()));
        assert!(!same_id("", ""));
        assert!(!same_id(OID, "65a1f0c2e4b0a1b2c3d4e5f7"));
    }

    #[test]
    fn representations_cover_every_legacy_spelling() {
        let forms = representations(&OID.to_ascii_uppercase());
        for spelling in [
            OID.to_string(),
            format!("ObjectId(\"{OID}\")"),
            format!("{{\"$oid\":\"{OID}\"}}"),
            OID.to_ascii_uppercase(),
        ] {
            assert!(forms.contains(&spelling), "missing {spelling}");
        }
        assert!(representations("  ").is_empty());
    }
}
