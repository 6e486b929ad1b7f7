use std::env;
use std::str::FromStr;

use jsonwebtoken::Algorithm;

use super::types::{ConfigError, Environment};

const DEFAULT_CORS_ORIGINS: &[&str] =
    &["http://localhost:5173", "http://localhost:3000", "http://localhost:8080"];

/// Image formats a browser can render inline as a profile photo.
const RENDERABLE_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

pub(super) fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

pub(super) fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

pub(super) fn env_flag(key: &str) -> bool {
    env_optional(key).is_some_and(|value| parse_bool(&value))
}

/// Reads `key` as a number, falling back to `default` when unset.
pub(super) fn env_number<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env_optional(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue { field: key, value: raw }),
        None => Ok(default),
    }
}

/// Like [`env_number`] but rejects zero and negatives, for page sizes and limits.
pub(super) fn env_positive(key: &'static str, default: i64) -> Result<i64, ConfigError> {
    let value = env_number(key, default)?;
    if value > 0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue { field: key, value: value.to_string() })
    }
}

pub(super) fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

pub(super) fn parse_environment(value: Option<&str>) -> Environment {
    match value.map(str::to_ascii_lowercase).as_deref() {
        Some("production" | "prod") => Environment::Production,
        Some("staging") => Environment::Staging,
        Some("test" | "testing") => Environment::Test,
        _ => Environment::Development,
    }
}

pub(super) fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    match value {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(ConfigError::InvalidValue { field: "ALGORITHM", value: other.to_string() }),
    }
}

/// Accepts a JSON array or a comma separated list. Blank input means the dev defaults.
pub(super) fn parse_cors_origins(value: Option<String>) -> Result<Vec<String>, ConfigError> {
    let origins = match value {
        Some(raw) if raw.trim_start().starts_with('[') => {
            serde_json::from_str::<Vec<String>>(&raw).map_err(|_| ConfigError::InvalidCors(raw))?
        }
        Some(raw) => split_list(&raw, false),
        None => Vec::new(),
    };

    if origins.is_empty() {
        return Ok(DEFAULT_CORS_ORIGINS.iter().map(|origin| origin.to_string()).collect());
    }
    Ok(origins)
}

/// Lowercased photo extensions; every entry must be a renderable image format.
pub(super) fn parse_image_extensions(value: Option<String>) -> Result<Vec<String>, ConfigError> {
    let extensions = match value {
        Some(raw) => split_list(&raw, true),
        None => vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()],
    };

    if extensions.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "ALLOWED_IMAGE_EXTENSIONS",
            value: String::from("<empty>"),
        });
    }
    if let Some(bad) = extensions.iter().find(|ext| !RENDERABLE_IMAGE_EXTENSIONS.contains(&ext.as_str())) {
        return Err(ConfigError::InvalidValue {
            field: "ALLOWED_IMAGE_EXTENSIONS",
            value: bad.clone(),
        });
    }
    Ok(extensions)
}

fn split_list(raw: &str, lowercase: bool) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| if lowercase { item.to_ascii_lowercase() } else { item.to_string() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_accepts_json_and_csv() {
        let expected = vec!["http://a".to_string(), "http://b".to_string()];
        assert_eq!(parse_cors_origins(Some("[\"http://a\",\"http://b\"]".into())).unwrap(), expected);
        assert_eq!(parse_cors_origins(Some("http://a, http://b".into())).unwrap(), expected);
    }

    #[test]
    fn blank_cors_falls_back_to_dev_origins() {
        let parsed = parse_cors_origins(Some(" , ".to_string())).expect("cors");
        assert_eq!(parsed.len(), DEFAULT_CORS_ORIGINS.len());
        assert!(parse_cors_origins(Some("[oops".to_string())).is_err());
    }

    #[test]
    fn bool_and_environment_variants() {
        assert!(parse_bool("YES"));
        assert!(parse_bool("on"));
        assert!(!parse_bool("0"));
        assert_eq!(parse_environment(Some("Prod")), Environment::Production);
        assert_eq!(parse_environment(Some("testing")), Environment::Test);
        assert_eq!(parse_environment(None), Environment::Development);
    }

    #[test]
    fn only_hmac_algorithms_are_accepted() {
        assert_eq!(parse_algorithm("HS512").unwrap(), Algorithm::HS512);
        assert!(parse_algorithm("RS256").is_err());
    }

    #[test]
    fn image_extensions_are_lowercased_and_checked() {
        assert_eq!(parse_image_extensions(Some("PNG, webp".into())).unwrap(), vec!["png", "webp"]);
        assert!(parse_image_extensions(Some("png,tiff".into())).is_err());
        assert!(parse_image_extensions(Some(" , ".into())).is_err());
        assert_eq!(parse_image_extensions(None).unwrap().len(), 3);
    }
}
