use crate::error::ResolutionError;

/// Marker that separates the archive + timestamp prefix from the original URL
/// in an archived-copy URI (`…/web/20010101000000/http://example.com/`).
pub const SNAPSHOT_MARKER: &str = "/http";

/// Timestamp flag asking the archive for the unmodified bytes of a capture.
const VERBATIM_FLAG: &str = "id_";

/// Converts a logical original URI into the path of the file in the repository.
///
/// The scheme and the following `//` are dropped; a trailing `/` is completed with
/// `index.html`.
pub fn derive_path(uri: &str) -> Result<String, ResolutionError> {
    let mut full = uri.to_string();
    if full.ends_with('/') {
        full.push_str("index.html");
    }

    let path = match full.find("//") {
        Some(pos) => &full[pos + 2..],
        None => full.as_str(),
    };

    if path.is_empty() {
        return Err(ResolutionError::EmptyPath {
            uri: uri.to_string(),
        });
    }

    Ok(path.to_string())
}

/// Rewrites an archived-copy URI so the archive serves the capture byte for byte.
///
/// Only the first snapshot marker is touched, and only when it follows a capture
/// timestamp: a URI that already carries the verbatim flag, or a plain URL whose path
/// merely contains `/http`, is returned unchanged.
pub fn verbatim_uri(uri: &str) -> String {
    match uri.find(SNAPSHOT_MARKER) {
        Some(pos) if is_timestamp(&uri[..pos]) => {
            format!("{}{}{}", &uri[..pos], VERBATIM_FLAG, &uri[pos..])
        }
        _ => uri.to_string(),
    }
}

/// Whether the last path segment of `prefix` is a capture timestamp (digits only).
fn is_timestamp(prefix: &str) -> bool {
    let segment = prefix.rsplit('/').next().unwrap_or_default();
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}
