//! Filter URL parameter
//!
//! The selected filter survives navigation as a query parameter on article
//! links (`?cfval=<index>`).

use url::Url;

/// Selected filter index carried by `url`
pub fn filter_param(url: &Url, name: &str) -> Option<usize> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .and_then(|(_, value)| value.trim().parse().ok())
}

/// Copy of `url` with the filter parameter set, or removed for `None`
pub fn with_filter_param(url: &Url, name: &str, index: Option<usize>) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != name)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut updated = url.clone();
    if kept.is_empty() && index.is_none() {
        updated.set_query(None);
        return updated;
    }
    {
        let mut pairs = updated.query_pairs_mut();
        pairs.clear();
        for (key, value) in &kept {
            pairs.append_pair(key, value);
        }
        if let Some(index) = index {
            pairs.append_pair(name, &index.to_string());
        }
    }
    updated
}

/// Page title of an article URL
///
/// `article_path` uses `$1` for the title, as in `/wiki/$1`. Returns `None`
/// for URLs outside the article path or with an empty title.
pub fn article_title(url: &Url, article_path: &str) -> Option<String> {
    let (prefix, suffix) = article_path.split_once("$1")?;
    let raw = url.path().strip_prefix(prefix)?.strip_suffix(suffix)?;
    if raw.is_empty() {
        return None;
    }
    match urlencoding::decode(raw) {
        Ok(title) => Some(title.into_owned()),
        Err(err) => {
            tracing::debug!(path = url.path(), %err, "Undecodable article title");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_read_param() {
        assert_eq!(filter_param(&url("https://w.org/wiki/A?cfval=3"), "cfval"), Some(3));
        assert_eq!(filter_param(&url("https://w.org/wiki/A?cfval=x"), "cfval"), None);
        assert_eq!(filter_param(&url("https://w.org/wiki/A"), "cfval"), None);
    }

    #[test]
    fn test_set_and_remove_param() {
        let base = url("https://w.org/wiki/A?action=view&cfval=1");
        let set = with_filter_param(&base, "cfval", Some(4));
        assert_eq!(set.as_str(), "https://w.org/wiki/A?action=view&cfval=4");

        let removed = with_filter_param(&base, "cfval", None);
        assert_eq!(removed.as_str(), "https://w.org/wiki/A?action=view");

        let bare = with_filter_param(&url("https://w.org/wiki/A?cfval=2"), "cfval", None);
        assert_eq!(bare.as_str(), "https://w.org/wiki/A");
    }

    #[test]
    fn test_article_title() {
        let path = "/wiki/$1";
        assert_eq!(
            article_title(&url("https://w.org/wiki/User:Some%20body"), path).as_deref(),
            Some("User:Some body")
        );
        assert_eq!(article_title(&url("https://w.org/wiki/"), path), None);
        assert_eq!(article_title(&url("https://w.org/w/index.php?title=A"), path), None);
    }
}
