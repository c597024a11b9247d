use std::sync::LazyLock;
use regex::Regex;
use crate::error::{Error, Result};

static MODEL_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());

static CATALOG_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://[^/\s]+/models/(\d+)(/.*)?$").unwrap());

/// Extract a model id from a bare numeric id or a catalog URL such as
/// `https://tensor.art/models/757279507095956705/some-slug`.
pub fn parse_model_reference(input: &str) -> Result<String> {
    if MODEL_ID.is_match(input) {
        return Ok(input.to_string());
    }

    CATALOG_URL
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
        .ok_or_else(|| Error::InvalidReference(input.to_string()))
}
