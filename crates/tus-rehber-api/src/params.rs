use crate::errors::ApiError;
use tus_rehber_query::FilterSpec;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const MAX_TEXT_LEN: usize = 128;
pub const MIN_SCORE_BOUND: f64 = 0.0;
pub const MAX_SCORE_BOUND: f64 = 100.0;

/// Decode a raw query string into ordered key/value pairs. Keys may repeat;
/// `+` and percent-escapes decode, malformed escapes pass through literally.
#[must_use]
pub fn parse_query_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('=') {
            Some((k, v)) => (url_decode(k), url_decode(v)),
            None => (url_decode(part), String::new()),
        })
        .collect()
}

fn url_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let h1 = bytes[i + 1] as char;
                let h2 = bytes[i + 2] as char;
                if let (Some(a), Some(b)) = (h1.to_digit(16), h2.to_digit(16)) {
                    out.push(((a << 4) + b) as u8);
                    i += 3;
                } else {
                    out.push(bytes[i]);
                    i += 1;
                }
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).to_string()
}

/// Total parsing of the search filter from decoded pairs, with a fixed field
/// table and per-field error messages. Set-valued fields accept repeated keys
/// and the legacy `key[]` spelling; empty values are treated as absent;
/// unknown keys are ignored.
pub fn parse_search_params(pairs: &[(String, String)]) -> Result<FilterSpec, ApiError> {
    let mut spec = FilterSpec::default();

    for (raw_key, value) in pairs {
        let key = raw_key.strip_suffix("[]").unwrap_or(raw_key);
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key {
            "text" => spec.text = Some(value.to_string()),
            "city" => spec.city.push(value.to_string()),
            "ownership_type" => spec.ownership_type.push(value.to_string()),
            "institution_kind" => spec.institution_kind.push(value.to_string()),
            "branch" => spec.branch.push(value.to_string()),
            "min_score_floor" => spec.min_score_floor = Some(parse_score(key, value)?),
            "min_score_ceiling" => spec.min_score_ceiling = Some(parse_score(key, value)?),
            "quota_floor" => spec.quota_floor = Some(parse_quota(key, value)?),
            "quota_ceiling" => spec.quota_ceiling = Some(parse_quota(key, value)?),
            "page" => {
                let page = value
                    .parse::<u32>()
                    .map_err(|_| ApiError::invalid_param(key, "must be a positive integer"))?;
                if page == 0 {
                    return Err(ApiError::invalid_param(key, "must be at least 1"));
                }
                spec.page = page;
            }
            "page_size" => {
                let size = value
                    .parse::<u32>()
                    .map_err(|_| ApiError::invalid_param(key, "must be a positive integer"))?;
                if size == 0 || size > MAX_PAGE_SIZE {
                    return Err(ApiError::invalid_param(key, "must be between 1 and 100"));
                }
                spec.page_size = size;
            }
            _ => {}
        }
    }

    if let Some(text) = &spec.text {
        if text.len() > MAX_TEXT_LEN {
            return Err(ApiError::invalid_param("text", "too long"));
        }
    }
    Ok(spec)
}

fn parse_score(key: &str, value: &str) -> Result<f64, ApiError> {
    let parsed = value
        .parse::<f64>()
        .map_err(|_| ApiError::invalid_param(key, "must be a number"))?;
    if !parsed.is_finite() || !(MIN_SCORE_BOUND..=MAX_SCORE_BOUND).contains(&parsed) {
        return Err(ApiError::invalid_param(key, "must be between 0 and 100"));
    }
    Ok(parsed)
}

fn parse_quota(key: &str, value: &str) -> Result<i64, ApiError> {
    let parsed = value
        .parse::<i64>()
        .map_err(|_| ApiError::invalid_param(key, "must be an integer"))?;
    if parsed < 0 {
        return Err(ApiError::invalid_param(key, "must not be negative"));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ApiErrorCode;

    fn pairs(raw: &str) -> Vec<(String, String)> {
        parse_query_pairs(raw)
    }

    #[test]
    fn parses_defaults_from_empty_query() {
        let spec = parse_search_params(&pairs("")).expect("parse");
        assert_eq!(spec.page, 1);
        assert_eq!(spec.page_size, DEFAULT_PAGE_SIZE);
        assert!(spec.text.is_none());
        assert!(spec.city.is_empty());
    }

    #[test]
    fn repeated_keys_and_bracket_spelling_accumulate() {
        let spec = parse_search_params(&pairs("city=Ankara&city[]=Istanbul&branch=Cardiology"))
            .expect("parse");
        assert_eq!(spec.city, vec!["Ankara", "Istanbul"]);
        assert_eq!(spec.branch, vec!["Cardiology"]);
    }

    #[test]
    fn decodes_percent_escapes_and_plus() {
        let spec = parse_search_params(&pairs("text=city+hospital%21")).expect("parse");
        assert_eq!(spec.text.as_deref(), Some("city hospital!"));
    }

    #[test]
    fn empty_values_are_absent() {
        let spec = parse_search_params(&pairs("text=&quota_floor=&city=")).expect("parse");
        assert!(spec.text.is_none());
        assert!(spec.quota_floor.is_none());
        assert!(spec.city.is_empty());
    }

    #[test]
    fn page_size_out_of_range_is_an_error_not_a_clamp() {
        for raw in ["page_size=0", "page_size=101", "page_size=abc"] {
            let err = parse_search_params(&pairs(raw)).expect_err("expected error");
            assert_eq!(err.code, ApiErrorCode::InvalidQueryParameter);
            assert_eq!(err.details["parameter"], "page_size");
        }
    }

    #[test]
    fn numeric_fields_reject_malformed_values() {
        let err = parse_search_params(&pairs("min_score_floor=high")).expect_err("error");
        assert_eq!(err.details["parameter"], "min_score_floor");
        let err = parse_search_params(&pairs("min_score_floor=101")).expect_err("error");
        assert_eq!(err.details["parameter"], "min_score_floor");
        let err = parse_search_params(&pairs("quota_floor=-1")).expect_err("error");
        assert_eq!(err.details["parameter"], "quota_floor");
        let err = parse_search_params(&pairs("min_score_ceiling=NaN")).expect_err("error");
        assert_eq!(err.details["parameter"], "min_score_ceiling");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let spec = parse_search_params(&pairs("sort_by=name&page=3")).expect("parse");
        assert_eq!(spec.page, 3);
    }

    #[test]
    fn numeric_bounds_mark_the_spec_as_period_pinned() {
        let spec = parse_search_params(&pairs("quota_floor=2")).expect("parse");
        assert!(spec.has_numeric_bounds());
        let spec = parse_search_params(&pairs("city=Ankara")).expect("parse");
        assert!(!spec.has_numeric_bounds());
    }
}
