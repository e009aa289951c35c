//! Process exit codes
//!
//! Stable codes so pipelines can tell operator mistakes from storage failures.

use sd_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Deployment finished
    Success = 0,
    /// Unexpected local failure (I/O, directory walk)
    GeneralError = 1,
    /// Bad flags, inputs, deploy file, rules or globs
    UsageError = 2,
    /// The object store failed
    NetworkError = 3,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a core error to its exit code
    pub fn from_error(error: &Error) -> Self {
        match error {
            e if e.is_usage() => ExitCode::UsageError,
            Error::Storage(_) | Error::Aggregate(_) => ExitCode::NetworkError,
            _ => ExitCode::GeneralError,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sd_core::{AggregateError, RuleError, UploadFailure};

    #[test]
    fn test_codes() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::UsageError.as_i32(), 2);
        assert_eq!(ExitCode::NetworkError.as_i32(), 3);
    }

    #[test]
    fn test_from_error() {
        assert_eq!(
            ExitCode::from_error(&Error::Config("missing".to_string())),
            ExitCode::UsageError
        );
        assert_eq!(
            ExitCode::from_error(&Error::Parse {
                line: 1,
                text: "oops".to_string(),
                kind: RuleError::MissingSeparator,
            }),
            ExitCode::UsageError
        );
        assert_eq!(
            ExitCode::from_error(&Error::Storage("denied".to_string())),
            ExitCode::NetworkError
        );
        let aggregate = AggregateError::new(UploadFailure::new(
            "index.html",
            Error::Storage("denied".to_string()),
        ));
        assert_eq!(
            ExitCode::from_error(&Error::Aggregate(aggregate)),
            ExitCode::NetworkError
        );
        assert_eq!(
            ExitCode::from_error(&Error::Discovery("gone".to_string())),
            ExitCode::GeneralError
        );
    }
}
