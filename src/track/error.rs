#[derive(Debug, Clone, PartialEq)]
pub enum TrackError {
    TooFewPoints { found: usize },
    NonFinitePoint { index: usize },
    DegenerateCurve,
    InvalidParameter { name: &'static str, value: f32 },
}

impl std::fmt::Display for TrackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackError::TooFewPoints { found } => {
                write!(f, "Track needs at least 2 control points, found {found}")
            }
            TrackError::NonFinitePoint { index } => {
                write!(f, "Control point {index} is not finite")
            }
            TrackError::DegenerateCurve => write!(f, "Track curve has zero length"),
            TrackError::InvalidParameter { name, value } => {
                write!(f, "Invalid track parameter {name}: {value}")
            }
        }
    }
}

impl std::error::Error for TrackError {}

/// Rejects non-positive or non-finite values.
pub(crate) fn ensure_positive(name: &'static str, value: f32) -> Result<f32, TrackError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(TrackError::InvalidParameter { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_parameter() {
        let err = TrackError::InvalidParameter {
            name: "overlap",
            value: 0.5,
        };
        assert_eq!(err.to_string(), "Invalid track parameter overlap: 0.5");
    }

    #[test]
    fn ensure_positive_rejects_zero_and_nan() {
        assert!(ensure_positive("radius", 0.0).is_err());
        assert!(ensure_positive("radius", f32::NAN).is_err());
        assert_eq!(ensure_positive("radius", 2.0), Ok(2.0));
    }
}
