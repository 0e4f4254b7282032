use std::path::PathBuf;

/// All errors that can occur while preparing instrument data and configuration.
#[derive(Debug)]
pub enum Error {
    /// Required installation or environment configuration is missing.
    Configuration(String),
    /// A 1-based table index fell outside the table.
    OutOfRange { index: usize, len: usize },
    /// The destination file exists and overwriting was not requested.
    OutputExists(PathBuf),
    /// A key that is not present in the template or the known vocabulary.
    UnknownParameter(String),
    /// An override whose shape (scalar vs. section) does not match the template.
    ParameterShape(String),
    /// A band name not present in the band table.
    UnknownBand(String),
    /// No files were found for the named list.
    EmptyFileList(&'static str),
    /// Binning factor must be finite and positive.
    InvalidBinning(f64),
    /// An exclusion pattern failed to compile.
    InvalidPattern(String),
    /// An I/O error from the standard library.
    Io(std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Error::OutOfRange { index, len } => {
                write!(f, "index {index} out of range for table of {len} entries")
            }
            Error::OutputExists(path) => write!(f, "file exist: {}", path.display()),
            Error::UnknownParameter(key) => write!(f, "unknown parameter: {key}"),
            Error::ParameterShape(key) => write!(f, "parameter shape mismatch: {key}"),
            Error::UnknownBand(band) => write!(f, "unknown band: {band}"),
            Error::EmptyFileList(what) => write!(f, "{what} list is empty"),
            Error::InvalidBinning(b) => write!(f, "invalid binning factor: {b}"),
            Error::InvalidPattern(msg) => write!(f, "invalid pattern: {msg}"),
            Error::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Error::InvalidPattern(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_configuration() {
        let e = Error::Configuration("unable to find MOPEX installation".into());
        assert_eq!(
            e.to_string(),
            "configuration error: unable to find MOPEX installation"
        );
    }

    #[test]
    fn display_out_of_range() {
        let e = Error::OutOfRange { index: 31, len: 30 };
        assert_eq!(e.to_string(), "index 31 out of range for table of 30 entries");
    }

    #[test]
    fn display_output_exists() {
        let e = Error::OutputExists(PathBuf::from("/tmp/sex.conf"));
        assert_eq!(e.to_string(), "file exist: /tmp/sex.conf");
    }

    #[test]
    fn display_empty_list() {
        let e = Error::EmptyFileList("sigma");
        assert_eq!(e.to_string(), "sigma list is empty");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = std::io::Error::other("oops");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
    }

    #[test]
    fn regex_error_from_conversion() {
        let e: Error = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(e, Error::InvalidPattern(_)));
    }

    #[test]
    fn std_error_source() {
        use std::error::Error as StdError;

        let e = Error::UnknownBand("ch9".into());
        assert!(e.source().is_none());

        let e = Error::Io(std::io::Error::other("inner"));
        assert!(e.source().is_some());
    }
}
