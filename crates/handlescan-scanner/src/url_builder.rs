use crate::error::{Result, ScanError};
use handlescan_catalog::{PlatformDescriptor, USERNAME_SLOT};

pub const MAX_USERNAME_CHARS: usize = 100;

/// Trim and check a raw username before any network activity.
///
/// A single leading `@` is dropped so that `@octocat` and `octocat` probe the
/// same profiles.
pub fn normalize_username(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let username = trimmed.strip_prefix('@').unwrap_or(trimmed).trim();

    if username.is_empty() {
        return Err(ScanError::InvalidUsername {
            reason: "username cannot be empty".to_string(),
        });
    }

    let chars = username.chars().count();
    if chars > MAX_USERNAME_CHARS {
        return Err(ScanError::InvalidUsername {
            reason: format!(
                "username must be at most {MAX_USERNAME_CHARS} characters, got {chars}"
            ),
        });
    }

    if username.chars().any(char::is_control) {
        return Err(ScanError::InvalidUsername {
            reason: "username cannot contain control characters".to_string(),
        });
    }

    Ok(username.to_string())
}

/// Form-encode a username for a URL path slot (space becomes `+`).
pub fn encode_username(username: &str) -> String {
    url::form_urlencoded::byte_serialize(username.as_bytes()).collect()
}

/// Substitute an already-normalized username into a descriptor's template.
pub fn build_profile_url(platform: &PlatformDescriptor, username: &str) -> String {
    platform
        .url_template
        .replacen(USERNAME_SLOT, &encode_username(username), 1)
}
