// src/config/validate.rs

use crate::config::duration::parse_duration;
use crate::config::model::{RunConfig, RunSection};
use crate::errors::{Result, RunctlError};

/// Check the semantic rules serde cannot express.
pub fn validate_config(cfg: &RunConfig) -> Result<()> {
    validate_token(&cfg.run)?;
    validate_interpreter(&cfg.run)?;
    validate_durations(&cfg.run)?;
    Ok(())
}

fn validate_token(run: &RunSection) -> Result<()> {
    if let Some(token) = &run.exit_status_token {
        if token.trim().is_empty() {
            return Err(RunctlError::ConfigError(
                "[run].exit_status_token must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_interpreter(run: &RunSection) -> Result<()> {
    if let Some(prefix) = &run.interpreter {
        if prefix.is_empty() || prefix[0].trim().is_empty() {
            return Err(RunctlError::ConfigError(
                "[run].interpreter must name a program (e.g. [\"/bin/sh\", \"-c\"])".to_string(),
            ));
        }
        if !run.use_interpreter {
            return Err(RunctlError::ConfigError(
                "[run].interpreter is set but use_interpreter = false".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_durations(run: &RunSection) -> Result<()> {
    let fields = [
        ("timeout", &run.timeout),
        ("exit_wait", &run.exit_wait),
        ("poll_interval", &run.poll_interval),
    ];

    for (key, value) in fields {
        let Some(raw) = value else { continue };
        let dur = parse_duration(raw)
            .map_err(|e| RunctlError::ConfigError(format!("[run].{key}: {e}")))?;
        if dur.is_zero() {
            return Err(RunctlError::ConfigError(format!(
                "[run].{key} must be greater than zero (got '{raw}')"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_run(run: RunSection) -> RunConfig {
        RunConfig { run }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&RunConfig::default()).is_ok());
    }

    #[test]
    fn blank_token_is_rejected() {
        let cfg = with_run(RunSection {
            exit_status_token: Some("  ".to_string()),
            ..RunSection::default()
        });
        assert!(matches!(validate_config(&cfg), Err(RunctlError::ConfigError(_))));
    }

    #[test]
    fn interpreter_requires_use_interpreter() {
        let cfg = with_run(RunSection {
            interpreter: Some(vec!["bash".to_string(), "-c".to_string()]),
            use_interpreter: false,
            ..RunSection::default()
        });
        let err = validate_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("use_interpreter"));
    }

    #[test]
    fn zero_and_malformed_durations_are_rejected() {
        let zero = with_run(RunSection {
            timeout: Some("0s".to_string()),
            ..RunSection::default()
        });
        assert!(validate_config(&zero).is_err());

        let bad = with_run(RunSection {
            poll_interval: Some("fast".to_string()),
            ..RunSection::default()
        });
        let err = validate_config(&bad).unwrap_err();
        assert!(err.to_string().contains("poll_interval"));
    }
}
