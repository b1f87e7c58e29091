/// Builds one context string per page: the page `window` positions before,
/// the page itself twice, and the page `window` positions after, joined by
/// newlines. Neighbours outside the deck are left out, never wrapped.
pub fn contextualize<S: AsRef<str>>(texts: &[S], window: usize) -> Vec<String> {
    let n = texts.len();
    (0..n)
        .map(|i| {
            let center = texts[i].as_ref();
            let mut parts: Vec<&str> = Vec::with_capacity(4);
            // A zero window has no neighbours; the page must not count itself as one.
            let before = i.checked_sub(window).filter(|_| window > 0);
            let after = i.checked_add(window).filter(|&j| window > 0 && j < n);
            if let Some(before) = before {
                parts.push(texts[before].as_ref());
            }
            parts.push(center);
            parts.push(center);
            if let Some(after) = after {
                parts.push(texts[after].as_ref());
            }
            parts.join("\n")
        })
        .collect()
}
