//! Utility functions for payload encoding and archive entry naming

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::Path;

use crate::error::ProcessingError;
use crate::types::DEFAULT_OUTPUT_CONTENT_TYPE;

/// Maximum number of rename attempts when resolving filename collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Encode a payload as `data:<mime>;base64,<payload>`
pub fn to_data_url(content_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(data))
}

/// Whether `name` is a single file-name component: no separators, no `.` or `..`,
/// not absolute.
///
/// ```
/// use upscale_batch::utils::is_plain_file_name;
///
/// assert!(is_plain_file_name("processed_images.zip"));
/// assert!(!is_plain_file_name("../escaped.zip"));
/// assert!(!is_plain_file_name("/tmp/out.zip"));
/// ```
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name() == Some(OsStr::new(name))
}

/// Decode a base64 payload
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, ProcessingError> {
    STANDARD
        .decode(encoded.trim())
        .map_err(|e| ProcessingError::Unknown {
            status: None,
            message: format!("service returned an invalid base64 payload: {}", e),
        })
}

/// Decode a `data:<mime>;base64,<payload>` URL into its MIME type and bytes.
///
/// A bare base64 string (no `data:` prefix) is accepted and reported as
/// [`DEFAULT_OUTPUT_CONTENT_TYPE`].
///
/// # Examples
///
/// ```
/// use upscale_batch::utils::decode_data_url;
///
/// let (mime, bytes) = decode_data_url("data:image/png;base64,AAEC").unwrap();
/// assert_eq!(mime, "image/png");
/// assert_eq!(bytes, vec![0, 1, 2]);
/// ```
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>), ProcessingError> {
    let Some(rest) = url.strip_prefix("data:") else {
        return Ok((DEFAULT_OUTPUT_CONTENT_TYPE.to_string(), decode_base64(url)?));
    };

    let (header, payload) = rest.split_once(',').ok_or_else(|| ProcessingError::Unknown {
        status: None,
        message: "service returned a data URL without a payload".to_string(),
    })?;

    let Some(mime) = header.strip_suffix(";base64") else {
        return Err(ProcessingError::Unknown {
            status: None,
            message: format!("service returned a non-base64 data URL ({})", header),
        });
    };

    let mime = if mime.is_empty() {
        DEFAULT_OUTPUT_CONTENT_TYPE
    } else {
        mime
    };

    Ok((mime.to_string(), decode_base64(payload)?))
}

/// Pick a name for `filename` that is not already in `taken`, and reserve it.
///
/// Later duplicates get " (1)", " (2)", ... inserted before the extension:
/// `photo.jpg` becomes `photo (1).jpg`. Names without an extension get the suffix
/// appended. Returns `None` only when every candidate is exhausted.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use upscale_batch::utils::reserve_unique_name;
///
/// let mut taken = HashSet::new();
/// assert_eq!(reserve_unique_name("a.jpg", &mut taken).as_deref(), Some("a.jpg"));
/// assert_eq!(reserve_unique_name("a.jpg", &mut taken).as_deref(), Some("a (1).jpg"));
/// ```
pub fn reserve_unique_name(filename: &str, taken: &mut HashSet<String>) -> Option<String> {
    if taken.insert(filename.to_string()) {
        return Some(filename.to_string());
    }

    // A leading dot marks a hidden file, not an extension
    let (stem, extension) = match filename.rfind('.') {
        Some(idx) if idx > 0 => (&filename[..idx], Some(&filename[idx + 1..])),
        _ => (filename, None),
    };

    for i in 1..=MAX_RENAME_ATTEMPTS {
        let candidate = match extension {
            Some(ext) => format!("{} ({}).{}", stem, i, ext),
            None => format!("{} ({})", stem, i),
        };
        if taken.insert(candidate.clone()) {
            return Some(candidate);
        }
    }

    None
}
