use thiserror::Error;

#[derive(Error, Debug)]
pub enum DurationError {
    #[error("Missing configuration component required by this observation: {0}")]
    MissingCollaborator(&'static str),

    #[error("Unsupported scan pattern: {0}")]
    UnsupportedPattern(String),

    #[error(
        "Unrecognized observing mode: mapping={mapping}, switching={switching}, type={obs_type}"
    )]
    UnrecognizedObservingMode {
        mapping: String,
        switching: String,
        obs_type: String,
    },

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Unable to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Error during the XML configuration parsing: {0}")]
    XmlParsingError(String),

    #[error("Invalid observing area: {0}")]
    InvalidObservingArea(String),
}

impl From<quick_xml::DeError> for DurationError {
    fn from(err: quick_xml::DeError) -> Self {
        DurationError::XmlParsingError(err.to_string())
    }
}

impl DurationError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        DurationError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl PartialEq for DurationError {
    fn eq(&self, other: &Self) -> bool {
        use DurationError::*;
        match (self, other) {
            (MissingCollaborator(a), MissingCollaborator(b)) => a == b,
            (UnsupportedPattern(a), UnsupportedPattern(b)) => a == b,
            (
                UnrecognizedObservingMode {
                    mapping: m1,
                    switching: s1,
                    obs_type: t1,
                },
                UnrecognizedObservingMode {
                    mapping: m2,
                    switching: s2,
                    obs_type: t2,
                },
            ) => m1 == m2 && s1 == s2 && t1 == t2,
            (InvalidParameter { name: a, .. }, InvalidParameter { name: b, .. }) => a == b,

            // io errors are not comparable: equal when the variant matches
            (IoError(_), IoError(_)) => true,

            (XmlParsingError(a), XmlParsingError(b)) => a == b,
            (InvalidObservingArea(a), InvalidObservingArea(b)) => a == b,
            _ => false,
        }
    }
}
