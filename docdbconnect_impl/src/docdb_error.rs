use std::path::PathBuf;
use thiserror::Error;

/// A list specifying categories of [`DocDbError`](crate::DocDbError).
///
/// None of the messages contains a password or an SSH passphrase.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DocDbError {
    /// The connection string is not a syntactically valid URI.
    #[error("The connection string is malformed")]
    MalformedConnectionString {
        /// The causing Error.
        #[from]
        source: url::ParseError,
    },

    /// The connection string does not start with the expected scheme prefix.
    #[error("The connection string does not start with '{expected}'")]
    MissingSchemePrefix {
        /// The prefix that was expected.
        expected: String,
    },

    /// An option in the query string or in the environment override has no `=`.
    #[error("The option '{pair}' is not of the form <key>=<value>")]
    MalformedOptionPair {
        /// The offending entry.
        pair: String,
    },

    /// A property that is required for the active validation mode is missing or blank.
    #[error("The required property '{property}' is missing")]
    MissingRequiredProperty {
        /// The name of the missing property.
        property: &'static str,
    },

    /// A property value is not one of the accepted values.
    #[error("'{value}' is not a valid {property}")]
    InvalidPropertyValue {
        /// The kind of value that was expected.
        property: &'static str,
        /// The offending value.
        value: String,
    },

    /// The configured CA file does not exist.
    #[error("The CA file '{}' was not found", path.display())]
    CaFileNotFound {
        /// The resolved path of the CA file.
        path: PathBuf,
    },

    /// Certificates could not be read or parsed.
    #[error("Certificates from {origin} could not be loaded")]
    CertificateLoad {
        /// Where the certificates came from.
        origin: String,
        /// The causing Error.
        source: std::io::Error,
    },

    /// A host could not be split into host name and port.
    #[error("'{address}' is not a valid server address")]
    InvalidServerAddress {
        /// The offending address.
        address: String,
    },

    /// Reading a file failed.
    #[error(transparent)]
    Io {
        /// The causing Error.
        #[from]
        source: std::io::Error,
    },
}

/// Abbreviation of `Result<T, DocDbError>`.
pub type DocDbResult<T> = std::result::Result<T, DocDbError>;

impl DocDbError {
    /// Returns the SQLSTATE that classifies this error.
    ///
    /// - `08001`: the connection string could not be used
    /// - `22023`: a property has an invalid or missing value
    /// - `58030`: an I/O error occurred
    pub fn sql_state(&self) -> &'static str {
        match self {
            Self::MalformedConnectionString { .. }
            | Self::MissingSchemePrefix { .. }
            | Self::MalformedOptionPair { .. } => "08001",
            Self::MissingRequiredProperty { .. }
            | Self::InvalidPropertyValue { .. }
            | Self::CaFileNotFound { .. }
            | Self::CertificateLoad { .. }
            | Self::InvalidServerAddress { .. } => "22023",
            Self::Io { .. } => "58030",
        }
    }

    /// Reveal the inner error
    pub fn inner(&self) -> Option<&dyn std::error::Error> {
        match self {
            Self::MalformedConnectionString { source } => Some(source),
            Self::CertificateLoad { source, .. } | Self::Io { source } => Some(source),
            _ => None,
        }
    }

    pub(crate) fn certificate_load<S: Into<String>>(origin: S, source: std::io::Error) -> Self {
        Self::CertificateLoad {
            origin: origin.into(),
            source,
        }
    }
}

#[cfg(test)]
mod test {
    use super::DocDbError;

    #[test]
    fn sql_states() {
        let err = DocDbError::from(url::Url::parse("documentdb://h:port").unwrap_err());
        assert_eq!("08001", err.sql_state());
        assert!(err.inner().is_some());

        let err = DocDbError::certificate_load(
            "my-ca.pem",
            std::io::Error::new(std::io::ErrorKind::InvalidData, "no certificates found"),
        );
        assert_eq!("22023", err.sql_state());
        assert_eq!("Certificates from my-ca.pem could not be loaded", err.to_string());

        let err = DocDbError::MissingRequiredProperty { property: "user" };
        assert_eq!("22023", err.sql_state());
        assert!(err.inner().is_none());

        let err = DocDbError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!("58030", err.sql_state());
    }
}
