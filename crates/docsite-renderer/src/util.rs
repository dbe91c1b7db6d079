//! Shared path helpers.

/// Compute a relative path from a directory to a target path.
///
/// Both arguments are `/`-separated paths relative to the same root (for
/// docsite, the site output root). `from_dir` is always treated as a
/// directory, so no trailing segment is dropped. An empty `from_dir` is the
/// root itself.
///
/// # Examples
///
/// ```
/// use docsite_renderer::relative_path;
///
/// assert_eq!(relative_path("a/b", "a/c/index.html"), "../c/index.html");
/// assert_eq!(relative_path("", "media/logo.png"), "media/logo.png");
/// assert_eq!(relative_path("guide", "index.html"), "../index.html");
/// ```
pub fn relative_path(from_dir: &str, to: &str) -> String {
    let from_segs: Vec<&str> = from_dir
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    let to_segs: Vec<&str> = to
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    let common = from_segs
        .iter()
        .zip(&to_segs)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = from_segs.len() - common;
    let remaining = &to_segs[common..];

    let ups_part = "../".repeat(ups);
    let down_part = remaining.join("/");

    let result = format!("{ups_part}{down_part}");
    if result.is_empty() {
        "./".to_owned()
    } else {
        result
    }
}
