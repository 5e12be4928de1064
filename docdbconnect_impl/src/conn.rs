// The connection properties, their URL form, and what is derived from them
// for opening a connection.

mod params;

pub use params::{
    client_settings::{
        ClientSettings, Credential, DriverInformation, ServerAddress, ServerMonitorListener,
        TlsSettings,
    },
    connection_properties::{
        AllowDiskUseOption, ConnectionProperties, MetadataScanMethod, ReadPreference,
    },
    into_connection_properties::IntoConnectionProperties,
    property::{
        ConnectionProperty, DocDbPropertySchema, PropertyDescriptor, PropertySchema, PropertyType,
    },
    property_bag::PropertyBag,
    search_paths::SearchPaths,
    trust::{TrustAnchor, TrustMaterial, TrustOrigin},
    validation::ValidationMode,
};
