//! Do not use this crate directly.
//!
//! This is the implementation crate for `docdbconnect`.
//!

#![deny(missing_debug_implementations)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde;

mod conn;
mod docdb_error;
pub mod url;

pub use crate::conn::{
    AllowDiskUseOption, ClientSettings, ConnectionProperties, ConnectionProperty, Credential,
    DocDbPropertySchema, DriverInformation, IntoConnectionProperties, MetadataScanMethod,
    PropertyBag, PropertyDescriptor, PropertySchema, PropertyType, ReadPreference, SearchPaths,
    ServerAddress, ServerMonitorListener, TlsSettings, TrustAnchor, TrustMaterial, TrustOrigin,
    ValidationMode,
};
pub use crate::docdb_error::{DocDbError, DocDbResult};

/// Default port of a DocumentDB server, used when a host is given without a port.
pub const DEFAULT_PORT: u16 = 27017;
