use super::{
    connection_properties::ConnectionProperties, property_bag::PropertyBag,
    validation::ValidationMode,
};
use crate::{url::DOCUMENT_DB_SCHEME, DocDbResult};

/// A trait implemented by types that can be converted into validated `ConnectionProperties`.
///
/// Connection strings are decoded with the scheme prefix `jdbc:documentdb:` and validated
/// with [`ValidationMode::ClientConnection`].
///
/// # Example
/// ```rust
///     use docdbconnect::IntoConnectionProperties;
///
///     let props = "jdbc:documentdb://alice:pw@host1/mydb"
///         .into_connection_properties()
///         .unwrap();
///
///     assert_eq!(Some("host1"), props.hostname());
/// ```
pub trait IntoConnectionProperties {
    /// Converts the value of `self` into `ConnectionProperties`.
    ///
    /// # Errors
    /// `DocDbError` if the connection string is malformed or required properties are missing.
    fn into_connection_properties(self) -> DocDbResult<ConnectionProperties>;
}

impl IntoConnectionProperties for ConnectionProperties {
    fn into_connection_properties(self) -> DocDbResult<ConnectionProperties> {
        self.validate(ValidationMode::ClientConnection)?;
        Ok(self)
    }
}

impl IntoConnectionProperties for &str {
    fn into_connection_properties(self) -> DocDbResult<ConnectionProperties> {
        ConnectionProperties::from_connection_string(self, ValidationMode::ClientConnection)
    }
}

impl IntoConnectionProperties for String {
    fn into_connection_properties(self) -> DocDbResult<ConnectionProperties> {
        self.as_str().into_connection_properties()
    }
}

impl IntoConnectionProperties for (PropertyBag, &str) {
    fn into_connection_properties(self) -> DocDbResult<ConnectionProperties> {
        let (seed, url) = self;
        ConnectionProperties::from_connection_string_with(
            &seed,
            url,
            DOCUMENT_DB_SCHEME,
            ValidationMode::ClientConnection,
        )
    }
}

#[cfg(test)]
mod test {
    use super::IntoConnectionProperties;
    use crate::{ConnectionProperties, DocDbError, PropertyBag};

    #[test]
    fn conversions() {
        let props = "jdbc:documentdb://alice:pw@host1/mydb"
            .into_connection_properties()
            .unwrap();
        assert_eq!(Some("alice"), props.user());

        let props = String::from("jdbc:documentdb://alice:pw@host1/mydb")
            .into_connection_properties()
            .unwrap();
        assert_eq!(Some("mydb"), props.database());

        let props = props.into_connection_properties().unwrap();
        assert_eq!(Some("host1"), props.hostname());

        let mut seed = PropertyBag::new();
        seed.set("user", "bob");
        let props = (seed, "jdbc:documentdb://alice:pw@host1/mydb")
            .into_connection_properties()
            .unwrap();
        assert_eq!(Some("bob"), props.user());
    }

    #[test]
    fn conversion_validates() {
        assert!(matches!(
            "jdbc:documentdb://host1/mydb".into_connection_properties(),
            Err(DocDbError::MissingRequiredProperty { property: "user" })
        ));
        assert!(matches!(
            ConnectionProperties::new().into_connection_properties(),
            Err(DocDbError::MissingRequiredProperty { .. })
        ));
    }
}
