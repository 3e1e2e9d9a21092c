use crate::config::SlugStyle;

/// URL slug for a catalog title.
///
/// `Legacy` lowercases and replaces only the first space, which is how the
/// existing catalog rows were written ("Deep Cycle Gel" becomes
/// "deep-cycle gel"). `Full` collapses every whitespace run into `-`.
#[must_use]
pub fn slugify(title: &str, style: SlugStyle) -> String {
    let lower = title.trim().to_lowercase();
    match style {
        SlugStyle::Legacy => lower.replacen(' ', "-", 1),
        SlugStyle::Full => lower.split_whitespace().collect::<Vec<_>>().join("-"),
    }
}
