//! Animation construction errors

use thiserror::Error;

use crate::value::ValueShape;

/// Reasons an animation could not be started
///
/// All of them are raised before anything is claimed or scheduled, so a
/// failed start leaves targets, the registry, and the scheduler untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    #[error("unknown tween '{name}'{}", did_you_mean(.suggestions))]
    UnknownTween {
        name: String,
        suggestions: Vec<String>,
    },

    #[error("{target} has no animatable attribute '{attribute}'")]
    InvalidAttribute {
        target: &'static str,
        attribute: String,
    },

    #[error("attribute '{attribute}' is a {expected} but the end value is a {found}")]
    ShapeMismatch {
        attribute: String,
        expected: ValueShape,
        found: ValueShape,
    },

    #[error("the scheduler driving this animator has been dropped")]
    SchedulerDropped,
}

fn did_you_mean(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tween_message() {
        let error = AnimationError::UnknownTween {
            name: "bounce".into(),
            suggestions: vec!["bounce_end".into(), "bounce_start".into()],
        };
        assert_eq!(
            error.to_string(),
            "unknown tween 'bounce' (did you mean: bounce_end, bounce_start?)"
        );

        let error = AnimationError::UnknownTween {
            name: "zigzag".into(),
            suggestions: Vec::new(),
        };
        assert_eq!(error.to_string(), "unknown tween 'zigzag'");
    }

    #[test]
    fn test_shape_mismatch_message() {
        let error = AnimationError::ShapeMismatch {
            attribute: "pos".into(),
            expected: ValueShape::Scalar,
            found: ValueShape::Vector(2),
        };
        assert_eq!(
            error.to_string(),
            "attribute 'pos' is a scalar but the end value is a vector of 2"
        );
    }
}
