use crate::error::{LexiError, Result};

/// Variable lookup used by every config loader; `std::env::var` in production.
pub(super) type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

#[must_use]
pub(super) fn read_non_empty_env(lookup: EnvLookup<'_>, name: &str) -> Option<String> {
    lookup(name)
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[must_use]
pub(super) fn read_env_usize(
    lookup: EnvLookup<'_>,
    name: &str,
    default_value: usize,
    min_value: usize,
) -> usize {
    lookup(name)
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|value| *value >= min_value)
        .unwrap_or(default_value)
}

#[must_use]
pub(super) fn read_env_u64(lookup: EnvLookup<'_>, name: &str, default_value: u64) -> u64 {
    lookup(name)
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(default_value)
}

#[must_use]
pub(super) fn read_env_u32(
    lookup: EnvLookup<'_>,
    name: &str,
    default_value: u32,
    min_value: u32,
) -> u32 {
    lookup(name)
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .filter(|value| *value >= min_value)
        .unwrap_or(default_value)
}

/// Fusion weights: unset falls back to the default, anything set must be a
/// finite non-negative float.
pub(super) fn read_env_weight(lookup: EnvLookup<'_>, name: &str, default_value: f32) -> Result<f32> {
    let Some(raw) = read_non_empty_env(lookup, name) else {
        return Ok(default_value);
    };
    let value = raw
        .parse::<f32>()
        .map_err(|_| LexiError::Validation(format!("invalid {name}: {raw} (expected a float)")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(LexiError::Validation(format!(
            "invalid {name}: {raw} (must be finite and >= 0)"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect::<HashMap<_, _>>();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn read_env_usize_falls_back_below_minimum() {
        let lookup = lookup_from(&[("A", "0"), ("B", " 12 "), ("C", "x")]);
        assert_eq!(read_env_usize(&lookup, "A", 5, 1), 5);
        assert_eq!(read_env_usize(&lookup, "B", 5, 1), 12);
        assert_eq!(read_env_usize(&lookup, "C", 5, 1), 5);
        assert_eq!(read_env_usize(&lookup, "MISSING", 5, 1), 5);
    }

    #[test]
    fn read_non_empty_env_trims_and_drops_blank() {
        let lookup = lookup_from(&[("A", "  "), ("B", " hash ")]);
        assert_eq!(read_non_empty_env(&lookup, "A"), None);
        assert_eq!(read_non_empty_env(&lookup, "B").as_deref(), Some("hash"));
    }

    #[test]
    fn read_env_weight_rejects_negative_and_non_finite() {
        let lookup = lookup_from(&[("NEG", "-0.1"), ("NAN", "NaN"), ("OK", "0.25")]);
        assert!(read_env_weight(&lookup, "NEG", 0.5).is_err());
        assert!(read_env_weight(&lookup, "NAN", 0.5).is_err());
        let ok = read_env_weight(&lookup, "OK", 0.5).expect("valid weight");
        assert!((ok - 0.25).abs() < f32::EPSILON);
        let default = read_env_weight(&lookup, "MISSING", 0.5).expect("default weight");
        assert!((default - 0.5).abs() < f32::EPSILON);
    }
}
