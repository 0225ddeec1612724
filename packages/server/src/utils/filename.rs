use uuid::Uuid;

/// Why an uploaded filename was refused.
#[derive(Debug, PartialEq, Eq)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains control characters (CR, LF, NUL, etc.).
    ControlCharacter,
    /// Nothing usable is left once path components are stripped.
    NoName,
}

impl FilenameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
            Self::NoName => "Invalid filename: no usable name",
        }
    }
}

/// Reduce a client-supplied filename to a single URL-safe path segment.
///
/// Directory components are dropped, characters outside `[A-Za-z0-9._-]`
/// become `-`, and leading dots are removed so the result is never hidden.
pub fn sanitize_filename(filename: &str) -> Result<String, FilenameError> {
    let trimmed = filename.trim();
    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    let base = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '-' || c == '.') {
        return Err(FilenameError::NoName);
    }

    Ok(cleaned.chars().take(128).collect())
}

/// Object name for an upload: `<owner>/<uuid>-<filename>`.
pub fn upload_object_name(owner: &str, filename: &str) -> Result<String, FilenameError> {
    let name = sanitize_filename(filename)?;
    Ok(format!("{owner}/{}-{name}", Uuid::new_v4().simple()))
}
