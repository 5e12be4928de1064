use super::connection_properties::{AllowDiskUseOption, MetadataScanMethod, ReadPreference};
use crate::url;

/// The properties that can be used to configure a connection.
///
/// The declaration order is the order in which options appear in
/// sanitized connection strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConnectionProperty {
    /// The user name.
    User,
    /// The password.
    Password,
    /// The host, optionally with a port.
    Hostname,
    /// The database.
    Database,
    /// The application name.
    ApplicationName,
    /// The login timeout in seconds.
    LoginTimeoutSec,
    /// The number of documents read by a metadata scan.
    MetadataScanLimit,
    /// The metadata scan method.
    MetadataScanMethod,
    /// Whether failed reads are retried.
    RetryReadsEnabled,
    /// The read preference.
    ReadPreference,
    /// Whether TLS is used.
    TlsEnabled,
    /// Whether server certificates with a non-matching host name are accepted.
    TlsAllowInvalidHostnames,
    /// A PEM file with additional certificate authorities.
    TlsCaFile,
    /// The name of the replica set.
    ReplicaSet,
    /// The schema name.
    SchemaName,
    /// The SSH user.
    SshUser,
    /// The SSH host.
    SshHostname,
    /// The SSH private key file.
    SshPrivateKeyFile,
    /// The passphrase of the SSH private key.
    SshPrivateKeyPassphrase,
    /// Whether the SSH host key is checked strictly.
    SshStrictHostKeyChecking,
    /// The SSH known-hosts file.
    SshKnownHostsFile,
    /// The default fetch size.
    DefaultFetchSize,
    /// Whether the schema is refreshed.
    RefreshSchema,
    /// The database used for authentication.
    DefaultAuthDb,
    /// The allow-disk-use option.
    AllowDiskUse,
}

impl ConnectionProperty {
    /// The key of the property in connection strings and property bags.
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// The schema default, as string; empty if the property has no default.
    pub fn default_value(self) -> &'static str {
        self.descriptor().default_value
    }

    /// The schema entry of the property.
    pub fn descriptor(self) -> &'static PropertyDescriptor {
        // PROPERTIES is declared in the same order as the enum
        &PROPERTIES[self as usize]
    }

    /// Finds the property with the given key.
    pub fn from_name(name: &str) -> Option<Self> {
        PROPERTIES
            .iter()
            .find(|descriptor| descriptor.name == name)
            .map(|descriptor| descriptor.property)
    }
}

impl std::fmt::Display for ConnectionProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The value type of a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropertyType {
    /// Free text.
    String,
    /// `true` or `false`, case-insensitive.
    Boolean,
    /// A decimal 32-bit integer.
    Integer,
    /// One of the given tokens, case-insensitive.
    Enumeration(&'static [&'static str]),
}

impl PropertyType {
    /// Brings a raw value into its canonical form.
    ///
    /// Returns `None` for blank values and for values that cannot be parsed.
    pub fn normalize(self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match self {
            Self::String => Some(raw.to_string()),
            Self::Boolean => {
                if raw.eq_ignore_ascii_case("true") {
                    Some("true".to_string())
                } else if raw.eq_ignore_ascii_case("false") {
                    Some("false".to_string())
                } else {
                    None
                }
            }
            Self::Integer => raw.parse::<i32>().ok().map(|i| i.to_string()),
            Self::Enumeration(tokens) => tokens
                .iter()
                .find(|token| token.eq_ignore_ascii_case(raw))
                .map(|token| (*token).to_string()),
        }
    }
}

/// Schema entry of a single property.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// The property.
    pub property: ConnectionProperty,
    /// The key in connection strings and property bags.
    pub name: &'static str,
    /// The default value; empty if there is none.
    pub default_value: &'static str,
    /// The value type.
    pub property_type: PropertyType,
    /// Whether the property is written as option into the sanitized connection string.
    ///
    /// `false` for the properties that form the login, host and database parts,
    /// and for secrets.
    pub in_sanitized_form: bool,
}

/// The default application name.
pub const DEFAULT_APPLICATION_NAME: &str = concat!("docdbconnect ", env!("CARGO_PKG_VERSION"));

const fn entry(
    property: ConnectionProperty,
    name: &'static str,
    default_value: &'static str,
    property_type: PropertyType,
    in_sanitized_form: bool,
) -> PropertyDescriptor {
    PropertyDescriptor {
        property,
        name,
        default_value,
        property_type,
        in_sanitized_form,
    }
}

#[rustfmt::skip]
static PROPERTIES: [PropertyDescriptor; 25] = {
    use ConnectionProperty as P;
    use PropertyType as T;
    [
        entry(P::User, url::USER, "", T::String, false),
        entry(P::Password, url::PASSWORD, "", T::String, false),
        entry(P::Hostname, url::HOSTNAME, "", T::String, false),
        entry(P::Database, url::DATABASE, "", T::String, false),
        entry(P::ApplicationName, url::APPLICATION_NAME, DEFAULT_APPLICATION_NAME, T::String, true),
        entry(P::LoginTimeoutSec, url::LOGIN_TIMEOUT_SEC, "", T::Integer, true),
        entry(P::MetadataScanLimit, url::METADATA_SCAN_LIMIT, "1000", T::Integer, true),
        entry(P::MetadataScanMethod, url::METADATA_SCAN_METHOD, "random", T::Enumeration(MetadataScanMethod::NAMES), true),
        entry(P::RetryReadsEnabled, url::RETRY_READS_ENABLED, "true", T::Boolean, true),
        entry(P::ReadPreference, url::READ_PREFERENCE, "", T::Enumeration(ReadPreference::NAMES), true),
        entry(P::TlsEnabled, url::TLS_ENABLED, "false", T::Boolean, true),
        entry(P::TlsAllowInvalidHostnames, url::TLS_ALLOW_INVALID_HOSTNAMES, "false", T::Boolean, true),
        entry(P::TlsCaFile, url::TLS_CA_FILE, "", T::String, true),
        entry(P::ReplicaSet, url::REPLICA_SET, "", T::String, true),
        entry(P::SchemaName, url::SCHEMA_NAME, "_default", T::String, true),
        entry(P::SshUser, url::SSH_USER, "", T::String, true),
        entry(P::SshHostname, url::SSH_HOSTNAME, "", T::String, true),
        entry(P::SshPrivateKeyFile, url::SSH_PRIVATE_KEY_FILE, "", T::String, true),
        entry(P::SshPrivateKeyPassphrase, url::SSH_PRIVATE_KEY_PASSPHRASE, "", T::String, false),
        entry(P::SshStrictHostKeyChecking, url::SSH_STRICT_HOST_KEY_CHECKING, "true", T::Boolean, true),
        entry(P::SshKnownHostsFile, url::SSH_KNOWN_HOSTS_FILE, "", T::String, true),
        entry(P::DefaultFetchSize, url::DEFAULT_FETCH_SIZE, "2000", T::Integer, true),
        entry(P::RefreshSchema, url::REFRESH_SCHEMA, "false", T::Boolean, true),
        entry(P::DefaultAuthDb, url::DEFAULT_AUTH_DB, "admin", T::String, true),
        entry(P::AllowDiskUse, url::ALLOW_DISK_USE, "default", T::Enumeration(AllowDiskUseOption::NAMES), true),
    ]
};

// MongoDB connection string options that DocumentDB clients recognize but do not support.
const UNSUPPORTED_MONGODB_PROPERTIES: &[&str] = &[
    "authMechanism",
    "authMechanismProperties",
    "authSource",
    "compressors",
    "connectTimeoutMS",
    "directConnection",
    "fsync",
    "gssapiServiceName",
    "heartbeatFrequencyMS",
    "j",
    "journal",
    "localThresholdMS",
    "maxIdleTimeMS",
    "maxLifeTimeMS",
    "maxPoolSize",
    "maxStalenessSeconds",
    "minPoolSize",
    "readConcernLevel",
    "readPreferenceTags",
    "retryWrites",
    "safe",
    "serverSelectionTimeoutMS",
    "socketTimeoutMS",
    "ssl",
    "sslInvalidHostNameAllowed",
    "streamType",
    "tlsInsecure",
    "uuidRepresentation",
    "w",
    "waitQueueMultiple",
    "waitQueueTimeoutMS",
    "wtimeoutMS",
    "zlibCompressionLevel",
];

/// Knowledge about the legal property names, their types and defaults.
///
/// The URL codec and the validator consult the schema only through this trait,
/// so that additional properties do not require changes there.
pub trait PropertySchema: std::fmt::Debug + Send + Sync {
    /// All supported properties, in the order in which they are emitted.
    fn properties(&self) -> &[PropertyDescriptor];

    /// The schema entry for the given key, if the key is supported.
    fn lookup_by_name(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties()
            .iter()
            .find(|descriptor| descriptor.name == name)
    }

    /// Whether the key denotes a supported property.
    fn is_supported(&self, name: &str) -> bool {
        self.lookup_by_name(name).is_some()
    }

    /// Whether the key is a known, but unsupported, option.
    fn is_unsupported_but_known(&self, name: &str) -> bool;

    /// The default value of a supported property.
    fn default_value(&self, name: &str) -> Option<&str> {
        self.lookup_by_name(name)
            .map(|descriptor| descriptor.default_value)
    }
}

/// The built-in property schema.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocDbPropertySchema;

impl PropertySchema for DocDbPropertySchema {
    fn properties(&self) -> &[PropertyDescriptor] {
        &PROPERTIES
    }

    fn is_unsupported_but_known(&self, name: &str) -> bool {
        UNSUPPORTED_MONGODB_PROPERTIES.contains(&name)
    }
}

#[cfg(test)]
mod test {
    use super::{ConnectionProperty, DocDbPropertySchema, PropertySchema, PropertyType, PROPERTIES};

    #[test]
    fn table_matches_enum_order() {
        for (i, descriptor) in PROPERTIES.iter().enumerate() {
            assert_eq!(i, descriptor.property as usize, "{}", descriptor.name);
            assert_eq!(
                Some(descriptor.property),
                ConnectionProperty::from_name(descriptor.name)
            );
        }
    }

    #[test]
    fn defaults_are_canonical() {
        for descriptor in &PROPERTIES {
            if !descriptor.default_value.is_empty() {
                assert_eq!(
                    Some(descriptor.default_value.to_string()),
                    descriptor.property_type.normalize(descriptor.default_value),
                    "{}",
                    descriptor.name
                );
            }
        }
    }

    #[test]
    fn classification() {
        let schema = DocDbPropertySchema;
        assert!(schema.is_supported("replicaSet"));
        assert!(!schema.is_supported("replicaset"));
        assert!(!schema.is_unsupported_but_known("replicaSet"));
        assert!(schema.is_unsupported_but_known("retryWrites"));
        assert!(!schema.is_supported("retryWrites"));
        assert!(!schema.is_supported("foo") && !schema.is_unsupported_but_known("foo"));
        assert_eq!(Some("admin"), schema.default_value("defaultAuthDb"));
        assert_eq!(None, schema.default_value("foo"));
    }

    #[test]
    fn normalize() {
        assert_eq!(Some("true".to_string()), PropertyType::Boolean.normalize("TRUE"));
        assert_eq!(None, PropertyType::Boolean.normalize("yes"));
        assert_eq!(Some("42".to_string()), PropertyType::Integer.normalize(" 42 "));
        assert_eq!(None, PropertyType::Integer.normalize("4x2"));
        assert_eq!(
            Some("idForward".to_string()),
            PropertyType::Enumeration(&["random", "idForward"]).normalize("IDFORWARD")
        );
        assert_eq!(None, PropertyType::String.normalize("   "));
    }
}
