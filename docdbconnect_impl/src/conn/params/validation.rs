use super::{property::ConnectionProperty, property_bag::is_blank, property_bag::PropertyBag};
use crate::{DocDbError, DocDbResult};

/// Selects which properties must be present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ValidationMode {
    /// Nothing is required.
    None,
    /// Everything needed for opening a client connection:
    /// user, password, database and host.
    #[default]
    ClientConnection,
    /// Everything needed for opening an SSH tunnel:
    /// host, SSH user, SSH host and SSH private key file.
    SshTunnel,
}

impl ValidationMode {
    /// The required properties, in the order in which they are checked.
    pub fn required_properties(self) -> &'static [ConnectionProperty] {
        use ConnectionProperty as P;
        match self {
            Self::None => &[],
            Self::ClientConnection => &[P::User, P::Password, P::Database, P::Hostname],
            Self::SshTunnel => &[
                P::Hostname,
                P::SshUser,
                P::SshHostname,
                P::SshPrivateKeyFile,
            ],
        }
    }
}

/// Fails with [`DocDbError::MissingRequiredProperty`] for the first required property
/// that is missing or blank.
pub(crate) fn validate(bag: &PropertyBag, mode: ValidationMode) -> DocDbResult<()> {
    match mode
        .required_properties()
        .iter()
        .find(|property| is_blank(bag.get(property.name())))
    {
        Some(property) => {
            debug!("validation ({mode:?}) failed, missing: {property}");
            Err(DocDbError::MissingRequiredProperty {
                property: property.name(),
            })
        }
        None => Ok(()),
    }
}
