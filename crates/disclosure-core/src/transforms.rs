//! Ready-made URL hooks for department descriptors.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::CoreError;
use crate::department::UrlTransform;

static JSESSIONID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i);jsessionid=[^?#/]*").expect("literal pattern"));

/// Resolve (possibly relative) links against `base`.
///
/// Links that cannot be joined are returned unchanged.
pub fn absolute(base: &str) -> Result<UrlTransform, CoreError> {
    let base = Url::parse(base).map_err(|e| CoreError::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Box::new(move |link: &str| match base.join(link) {
        Ok(url) => url.to_string(),
        Err(_) => link.to_string(),
    }))
}

/// Remove session query parameters (matched case-insensitively) and any
/// `;jsessionid=` path parameter.
pub fn strip_query_params(names: &[&str]) -> UrlTransform {
    let names: Vec<String> = names.iter().map(|n| n.to_ascii_lowercase()).collect();
    Box::new(move |raw: &str| {
        let cleaned = JSESSIONID_RE.replace_all(raw, "");
        let Ok(mut url) = Url::parse(&cleaned) else {
            return cleaned.into_owned();
        };
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !names.contains(&k.to_ascii_lowercase()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(kept);
        }
        url.to_string()
    })
}
