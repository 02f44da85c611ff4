//! Human-readable error descriptions, exit codes and structured JSON errors.

use thiserror::Error;
use tripmode_core::{BuildError, EngineError};

/// Anything wrong with the TOML, the model file or the normalization file.
#[derive(Debug, Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(pub String);

impl ConfigError {
    pub fn wrap(context: &str, err: impl std::fmt::Display) -> eyre::Report {
        eyre::Report::new(Self(format!("{context}: {err}")))
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(ConfigError(msg)) = err.downcast_ref::<ConfigError>() {
        return format!(
            "What happened: Invalid configuration ({msg}).\nLikely causes: Missing file or out-of-range values in the TOML.\nHow to fix: Edit the config (see etc/tripmode.toml), then rerun."
        );
    }

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingClassifier => {
                "What happened: No classifier was provided to the engine.\nLikely causes: [model] path is not set.\nHow to fix: Point [model] path at a linear model TOML.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Window, rate and buffer settings do not fit together.\nHow to fix: Edit [sampling] and [window] in the config, then rerun."
            ),
        };
    }

    if let Some(ee) = err.downcast_ref::<EngineError>() {
        return match ee {
            EngineError::ModelMismatch { code } => format!(
                "What happened: The model returned label code {code}, which this build does not know.\nLikely causes: The model was trained with a different label set.\nHow to fix: Use a model whose class codes are 1..=5 (STILL, WALKING, RUNNING, CYCLING, VEHICLE)."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();
    if lower.contains("invalid recording row") || lower.contains("open recording") {
        return format!(
            "What happened: The recording could not be read ({msg}).\nLikely causes: Missing channel file or a malformed row.\nHow to fix: Rows must be `class,timestamp_us,x,y,z` in linear.csv, gravity.csv and gyro.csv."
        );
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: 3 model mismatch, 2 configuration, 1 anything else.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if matches!(
        err.downcast_ref::<EngineError>(),
        Some(EngineError::ModelMismatch { .. })
    ) {
        return 3;
    }
    if err.downcast_ref::<ConfigError>().is_some() || err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    1
}

fn reason_name(err: &eyre::Report) -> &'static str {
    if let Some(ee) = err.downcast_ref::<EngineError>() {
        return match ee {
            EngineError::InvalidInput { .. } => "InvalidInput",
            EngineError::ModelMismatch { .. } => "ModelMismatch",
            EngineError::Classifier(_) => "Classifier",
            EngineError::Busy => "Busy",
        };
    }
    if err.downcast_ref::<ConfigError>().is_some() || err.downcast_ref::<BuildError>().is_some() {
        return "Config";
    }
    "Error"
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    if let Some(EngineError::ModelMismatch { code }) = err.downcast_ref::<EngineError>() {
        return json!({
            "reason": "ModelMismatch",
            "details": { "code": code },
            "message": humanize(err),
        })
        .to_string();
    }
    json!({ "reason": reason_name(err), "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_stable() {
        let mismatch = eyre::Report::new(EngineError::ModelMismatch { code: 9 });
        assert_eq!(exit_code_for_error(&mismatch), 3);
        assert_eq!(exit_code_for_error(&ConfigError::wrap("cfg", "bad")), 2);
        assert_eq!(
            exit_code_for_error(&eyre::Report::new(BuildError::MissingClassifier)),
            2
        );
        assert_eq!(exit_code_for_error(&eyre::eyre!("boom")), 1);
    }

    #[test]
    fn json_errors_carry_reason_and_details() {
        let err = eyre::Report::new(EngineError::ModelMismatch { code: 9 });
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "ModelMismatch");
        assert_eq!(v["details"]["code"], 9);
        let v: serde_json::Value =
            serde_json::from_str(&format_error_json(&ConfigError::wrap("x", "y"))).unwrap();
        assert_eq!(v["reason"], "Config");
    }
}
