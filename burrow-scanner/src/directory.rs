/// Statuses under which an extensionless HTML page is treated as a listing.
const DIRECTORY_STATUS_CODES: [u16; 3] = [200, 301, 302];

/// Decide whether a fetched resource should seed child paths.
///
/// `path` is the requested frontier path. A trailing slash is always
/// expandable; otherwise the response must be HTML with a directory-like
/// status and the last segment must have no extension.
pub fn is_probably_directory(path: &str, content_type: Option<&str>, status_code: u16) -> bool {
    if path.ends_with('/') {
        return true;
    }

    let is_html = content_type
        .map(|ct| ct.to_lowercase().contains("text/html"))
        .unwrap_or(false);
    if !is_html || !DIRECTORY_STATUS_CODES.contains(&status_code) {
        return false;
    }

    let path = path.split(['?', '#']).next().unwrap_or_default();
    let last_segment = path.rsplit('/').next().unwrap_or_default();
    !last_segment.contains('.')
}
