use anyhow::{Result, bail};

/// Validate a Kubernetes-style resource name.
/// Rules: lowercase `[a-z0-9-]`, max 63 chars, no leading/trailing hyphens.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("name must not be empty");
    }
    if name.len() > 63 {
        bail!("name '{}' exceeds 63 characters (got {})", name, name.len());
    }
    if name.starts_with('-') || name.ends_with('-') {
        bail!("name '{}' must not start or end with a hyphen", name);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        bail!(
            "name '{}' must contain only lowercase letters, digits, and hyphens [a-z0-9-]",
            name
        );
    }
    Ok(())
}

/// Validate a label key: an optional DNS prefix followed by `/` and a name
/// segment of at most 63 characters.
pub fn validate_label_key(key: &str) -> Result<()> {
    let segment = match key.split_once('/') {
        Some((prefix, segment)) => {
            if prefix.is_empty() || prefix.len() > 253 {
                bail!("label key '{}' has an invalid prefix", key);
            }
            if !prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
            {
                bail!("label key prefix '{}' must be a DNS subdomain", prefix);
            }
            segment
        }
        None => key,
    };
    if segment.is_empty() {
        bail!("label key must not be empty");
    }
    validate_label_segment(segment).map_err(|e| anyhow::anyhow!("label key '{}': {}", key, e))
}

/// Validate a label value. Empty values are allowed.
pub fn validate_label_value(value: &str) -> Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    validate_label_segment(value).map_err(|e| anyhow::anyhow!("label value '{}': {}", value, e))
}

fn validate_label_segment(segment: &str) -> Result<()> {
    if segment.len() > 63 {
        bail!("exceeds 63 characters (got {})", segment.len());
    }
    let edge_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    if !edge_ok(segment.chars().next()) || !edge_ok(segment.chars().last()) {
        bail!("must start and end with an alphanumeric character");
    }
    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        bail!("must contain only [A-Za-z0-9-_.]");
    }
    Ok(())
}
