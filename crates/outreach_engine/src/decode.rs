use outreach_core::{Stage, StageResult};
use serde_json::Value;

use crate::{StageEvent, WireEvent};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{stage} body is not valid JSON: {message}")]
    Malformed { stage: Stage, message: String },
    #[error("{stage} body has no `{field}` field")]
    MissingField { stage: Stage, field: &'static str },
    #[error("{stage} field `{field}` has the wrong type: {message}")]
    InvalidField {
        stage: Stage,
        field: &'static str,
        message: String,
    },
}

/// Decode a wire event into a stage update.
///
/// Unknown event names yield `Ok(None)` so that new server-side stages are
/// ignored rather than treated as errors.
pub fn decode_event(event: &WireEvent) -> Result<Option<StageEvent>, DecodeError> {
    let Some(stage) = Stage::from_wire_name(&event.name) else {
        return Ok(None);
    };

    let body: Value = serde_json::from_str(&event.data).map_err(|err| DecodeError::Malformed {
        stage,
        message: err.to_string(),
    })?;

    let result = match stage {
        Stage::SourceSummary | Stage::TargetSummary => {
            StageResult::Summary(extract_field(stage, &body, "summary")?)
        }
        Stage::Emails => StageResult::Emails(extract_field(stage, &body, "emails")?),
    };

    Ok(Some(StageEvent { stage, result }))
}

fn extract_field<T: serde::de::DeserializeOwned>(
    stage: Stage,
    body: &Value,
    field: &'static str,
) -> Result<T, DecodeError> {
    // A non-object body cannot carry the field either.
    let value = body
        .get(field)
        .filter(|value| !value.is_null())
        .ok_or(DecodeError::MissingField { stage, field })?;
    T::deserialize(value).map_err(|err| DecodeError::InvalidField {
        stage,
        field,
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_event_decodes() {
        let event = WireEvent::new("sourceSummary", r#"{"summary":"Acme makes widgets"}"#);
        assert_eq!(
            decode_event(&event),
            Ok(Some(StageEvent {
                stage: Stage::SourceSummary,
                result: StageResult::Summary("Acme makes widgets".into()),
            }))
        );
    }

    #[test]
    fn emails_keep_wire_order() {
        let event = WireEvent::new("emails", r#"{"emails":["b@x.com","a@x.com"]}"#);
        let decoded = decode_event(&event).unwrap().unwrap();
        assert_eq!(
            decoded.result,
            StageResult::Emails(vec!["b@x.com".into(), "a@x.com".into()])
        );
    }

    #[test]
    fn unknown_name_is_ignored_even_with_garbage_body() {
        let event = WireEvent::new("message", "not json at all");
        assert_eq!(decode_event(&event), Ok(None));
    }

    #[test]
    fn malformed_body_is_decode_error() {
        let event = WireEvent::new("targetSummary", "{\"summary\":");
        assert!(matches!(
            decode_event(&event),
            Err(DecodeError::Malformed {
                stage: Stage::TargetSummary,
                ..
            })
        ));
    }

    #[test]
    fn missing_field_is_decode_error() {
        let event = WireEvent::new("targetSummary", r#"{"text":"Globex"}"#);
        assert_eq!(
            decode_event(&event),
            Err(DecodeError::MissingField {
                stage: Stage::TargetSummary,
                field: "summary",
            })
        );

        let event = WireEvent::new("emails", "[]");
        assert_eq!(
            decode_event(&event),
            Err(DecodeError::MissingField {
                stage: Stage::Emails,
                field: "emails",
            })
        );
    }

    #[test]
    fn wrong_field_type_is_decode_error() {
        let event = WireEvent::new("emails", r#"{"emails":"a@x.com"}"#);
        assert!(matches!(
            decode_event(&event),
            Err(DecodeError::InvalidField { field: "emails", .. })
        ));
    }

    #[test]
    fn extra_fields_are_tolerated() {
        let event = WireEvent::new("sourceSummary", r#"{"summary":"s","tokens":12}"#);
        assert!(decode_event(&event).unwrap().is_some());
    }
}
