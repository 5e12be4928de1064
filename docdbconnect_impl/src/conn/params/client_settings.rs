use super::{
    connection_properties::{ConnectionProperties, ReadPreference},
    search_paths::SearchPaths,
};
use crate::{DocDbError, DocDbResult, DEFAULT_PORT};
use debug_ignore::DebugIgnore;
use rustls::ClientConfig;
use secstr::SecUtf8;
use std::{str::FromStr, sync::Arc, time::Duration};

/// Receives events about the servers a client is connected to.
///
/// All methods have empty default implementations.
pub trait ServerMonitorListener: std::fmt::Debug + Send + Sync {
    /// A server was added to the monitored topology.
    fn server_opening(&self, _address: &ServerAddress) {}
    /// A server was removed from the monitored topology.
    fn server_closed(&self, _address: &ServerAddress) {}
    /// A heartbeat to a server succeeded.
    fn server_heartbeat_succeeded(&self, _address: &ServerAddress, _elapsed: Duration) {}
    /// A heartbeat to a server failed.
    fn server_heartbeat_failed(&self, _address: &ServerAddress, _reason: &str) {}
}

/// The settings with which a client opens a connection to the service.
///
/// Produced by [`ConnectionProperties::build_client_settings`].
#[derive(Clone, Debug)]
pub struct ClientSettings {
    credential: Option<Credential>,
    server_monitor_listeners: Vec<Arc<dyn ServerMonitorListener>>,
    hosts: Vec<ServerAddress>,
    required_replica_set_name: Option<String>,
    connect_timeout: Option<Duration>,
    tls: TlsSettings,
    read_preference: Option<ReadPreference>,
    application_name: String,
    retry_reads: bool,
    driver_information: DriverInformation,
}

impl ClientSettings {
    pub(crate) fn try_from_properties(
        props: &ConnectionProperties,
        search_paths: &SearchPaths,
        ssh_local_port: Option<u16>,
        server_monitor_listener: Option<Arc<dyn ServerMonitorListener>>,
    ) -> DocDbResult<Self> {
        let credential = match (props.user(), props.password()) {
            (Some(user), Some(password)) => Some(Credential {
                user: user.to_string(),
                source: props.default_authentication_database().to_string(),
                password: SecUtf8::from(password),
            }),
            _ => None,
        };

        let hosts = match ssh_local_port.filter(|port| *port > 0) {
            Some(port)
                if props.enable_ssh_tunnel()
                    && props.is_ssh_private_key_file_exists(search_paths) =>
            {
                debug!("connecting through the SSH tunnel at localhost:{port}");
                vec![ServerAddress::new("localhost", port)]
            }
            _ => parse_hosts(props.hostname().unwrap_or_default())?,
        };

        let tls = TlsSettings::try_from_properties(props, search_paths)?;

        Ok(Self {
            credential,
            server_monitor_listeners: server_monitor_listener.into_iter().collect(),
            hosts,
            required_replica_set_name: props.replica_set().map(ToString::to_string),
            connect_timeout: props
                .login_timeout()
                .map(|secs| Duration::from_secs(u64::from(secs))),
            tls,
            read_preference: props.read_preference(),
            application_name: props.application_name().to_string(),
            retry_reads: props.retry_reads_enabled(),
            driver_information: DriverInformation::new(props.application_name()),
        })
    }

    /// The credential, if user and password are configured.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// The attached server monitor listeners.
    pub fn server_monitor_listeners(&self) -> &[Arc<dyn ServerMonitorListener>] {
        &self.server_monitor_listeners
    }

    /// The addresses to connect to.
    pub fn hosts(&self) -> &[ServerAddress] {
        &self.hosts
    }

    /// The replica set that the cluster must have.
    pub fn required_replica_set_name(&self) -> Option<&str> {
        self.required_replica_set_name.as_deref()
    }

    /// The timeout for opening a socket.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// The TLS settings.
    pub fn tls(&self) -> &TlsSettings {
        &self.tls
    }

    /// The read preference, if one was configured.
    pub fn read_preference(&self) -> Option<ReadPreference> {
        self.read_preference
    }

    /// The application name that is reported to the server.
    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// Whether failed reads are retried.
    pub fn retry_reads(&self) -> bool {
        self.retry_reads
    }

    /// Whether failed writes are retried; always `false`, the service does not support it.
    pub fn retry_writes(&self) -> bool {
        false
    }

    /// Information about the driver.
    pub fn driver_information(&self) -> &DriverInformation {
        &self.driver_information
    }
}

fn parse_hosts(hostname: &str) -> DocDbResult<Vec<ServerAddress>> {
    hostname
        .split(',')
        .map(str::trim)
        .filter(|host| !host.is_empty())
        .map(ServerAddress::from_str)
        .collect()
}

/// User, authentication database and password.
#[derive(Clone, Debug)]
pub struct Credential {
    user: String,
    source: String,
    password: SecUtf8,
}
impl Credential {
    /// The user name.
    pub fn user(&self) -> &str {
        &self.user
    }
    /// The database in which the user is defined.
    pub fn source(&self) -> &str {
        &self.source
    }
    /// The password.
    pub fn password(&self) -> &SecUtf8 {
        &self.password
    }
}

/// TLS flags and, if TLS is enabled, the client configuration that trusts the collected CAs.
#[derive(Clone, Debug, Default)]
pub struct TlsSettings {
    enabled: bool,
    invalid_host_name_allowed: bool,
    context: Option<DebugIgnore<Arc<ClientConfig>>>,
}
impl TlsSettings {
    fn try_from_properties(
        props: &ConnectionProperties,
        search_paths: &SearchPaths,
    ) -> DocDbResult<Self> {
        let enabled = props.tls_enabled();
        let invalid_host_name_allowed = props.tls_allow_invalid_hostnames();
        let context = if enabled {
            let client_config = props
                .trust_material(search_paths)?
                .client_config(invalid_host_name_allowed)?;
            Some(DebugIgnore(Arc::new(client_config)))
        } else {
            None
        };
        Ok(Self {
            enabled,
            invalid_host_name_allowed,
            context,
        })
    }

    /// Whether TLS is used.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a mismatch between server certificate and host name is tolerated.
    pub fn is_invalid_host_name_allowed(&self) -> bool {
        self.invalid_host_name_allowed
    }

    /// The TLS client configuration; only present if TLS is enabled.
    pub fn client_config(&self) -> Option<Arc<ClientConfig>> {
        self.context.as_ref().map(|context| Arc::clone(&context.0))
    }
}

/// Name and version of the driver, as reported to the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DriverInformation {
    name: String,
    version: &'static str,
}
impl DriverInformation {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
    /// The driver name.
    pub fn name(&self) -> &str {
        &self.name
    }
    /// The driver version.
    pub fn version(&self) -> &str {
        self.version
    }
}

/// Host and port of a server.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServerAddress {
    host: String,
    port: u16,
}
impl ServerAddress {
    /// Constructor.
    pub fn new<S: Into<String>>(host: S, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
    /// The host name or IP address.
    pub fn host(&self) -> &str {
        &self.host
    }
    /// The port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for ServerAddress {
    type Err = DocDbError;

    /// Parses `host`, `host:port`, `[ipv6]` or `[ipv6]:port`.
    fn from_str(address: &str) -> DocDbResult<Self> {
        let invalid = || DocDbError::InvalidServerAddress {
            address: address.to_string(),
        };

        let (host, port) = if let Some(rest) = address.strip_prefix('[') {
            let (host, after) = rest.split_once(']').ok_or_else(invalid)?;
            match after {
                "" => (host, None),
                _ => (host, Some(after.strip_prefix(':').ok_or_else(invalid)?)),
            }
        } else {
            match address.split_once(':') {
                Some((host, port)) if !port.contains(':') => (host, Some(port)),
                // no port, or an IPv6 literal without brackets
                _ => (address, None),
            }
        };

        if host.is_empty() {
            return Err(invalid());
        }
        let port = match port {
            Some(port) => port.parse::<u16>().map_err(|_| invalid())?,
            None => DEFAULT_PORT,
        };
        Ok(Self::new(host, port))
    }
}

impl std::fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod test {
    use super::{ServerAddress, ServerMonitorListener};
    use crate::{ConnectionProperties, DocDbError, ReadPreference, SearchPaths};
    use std::{sync::Arc, time::Duration};

    #[derive(Debug)]
    struct Quiet;
    impl ServerMonitorListener for Quiet {}

    fn no_search_paths() -> SearchPaths {
        SearchPaths::new(None, [])
    }

    fn tunnel_props(key_file: &str) -> ConnectionProperties {
        let mut props = ConnectionProperties::new();
        props
            .set_hostname("docdb.example.com:27017")
            .set_ssh_user("ec2-user")
            .set_ssh_hostname("bastion.example.com")
            .set_ssh_private_key_file(key_file);
        props
    }

    #[test]
    fn server_addresses() {
        assert_eq!(
            ServerAddress::new("host1", 27017),
            "host1".parse::<ServerAddress>().unwrap()
        );
        assert_eq!(
            ServerAddress::new("host1", 1234),
            "host1:1234".parse::<ServerAddress>().unwrap()
        );
        assert_eq!(
            ServerAddress::new("::1", 1234),
            "[::1]:1234".parse::<ServerAddress>().unwrap()
        );
        assert_eq!(
            ServerAddress::new("fe80::1", 27017),
            "fe80::1".parse::<ServerAddress>().unwrap()
        );
        assert_eq!("[::1]:27017", ServerAddress::new("::1", 27017).to_string());
        assert_eq!("h:1", ServerAddress::new("h", 1).to_string());

        for bad in ["", ":27017", "host:port", "host:99999", "[::1", "[::1]x"] {
            assert!(
                matches!(
                    bad.parse::<ServerAddress>(),
                    Err(DocDbError::InvalidServerAddress { .. })
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn credential_needs_user_and_password() {
        let mut props = ConnectionProperties::new();
        props.set_hostname("host1").set_user("alice");
        let settings = props
            .build_client_settings(&no_search_paths(), None, None)
            .unwrap();
        assert!(settings.credential().is_none());

        props.set_password("s3cret");
        let settings = props
            .build_client_settings(&no_search_paths(), None, None)
            .unwrap();
        let credential = settings.credential().unwrap();
        assert_eq!("alice", credential.user());
        assert_eq!("admin", credential.source());
        assert_eq!("s3cret", credential.password().unsecure());
        assert!(!format!("{settings:?}").contains("s3cret"));

        props.set_default_authentication_database("users");
        let settings = props
            .build_client_settings(&no_search_paths(), None, None)
            .unwrap();
        assert_eq!("users", settings.credential().unwrap().source());
    }

    #[test]
    fn ssh_tunnel_rewrites_host() {
        let dir = tempfile::tempdir().unwrap();
        let key_file = dir.path().join("id_rsa");
        std::fs::write(&key_file, "key").unwrap();
        let props = tunnel_props(&key_file.to_string_lossy());

        let settings = props
            .build_client_settings(&no_search_paths(), Some(45678), None)
            .unwrap();
        assert_eq!(&[ServerAddress::new("localhost", 45678)], settings.hosts());

        for port in [None, Some(0)] {
            let settings = props
                .build_client_settings(&no_search_paths(), port, None)
                .unwrap();
            assert_eq!(
                &[ServerAddress::new("docdb.example.com", 27017)],
                settings.hosts()
            );
        }
    }

    #[test]
    fn ssh_tunnel_needs_existing_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let props = tunnel_props(&dir.path().join("missing").to_string_lossy());
        let settings = props
            .build_client_settings(&no_search_paths(), Some(45678), None)
            .unwrap();
        assert_eq!("docdb.example.com", settings.hosts()[0].host());
    }

    #[test]
    fn plain_settings() {
        let mut props = ConnectionProperties::new();
        props
            .set_hostname("host1,host2:27018")
            .set_replica_set("rs0")
            .set_login_timeout(15)
            .set_read_preference(ReadPreference::SecondaryPreferred)
            .set_retry_reads_enabled(false)
            .set_application_name("my app");
        let settings = props
            .build_client_settings(&no_search_paths(), None, Some(Arc::new(Quiet)))
            .unwrap();

        assert_eq!(
            &[
                ServerAddress::new("host1", 27017),
                ServerAddress::new("host2", 27018)
            ],
            settings.hosts()
        );
        assert_eq!(Some("rs0"), settings.required_replica_set_name());
        assert_eq!(Some(Duration::from_secs(15)), settings.connect_timeout());
        assert_eq!(
            Some(ReadPreference::SecondaryPreferred),
            settings.read_preference()
        );
        assert!(!settings.retry_reads());
        assert!(!settings.retry_writes());
        assert_eq!("my app", settings.application_name());
        assert_eq!("my app", settings.driver_information().name());
        assert_eq!(1, settings.server_monitor_listeners().len());
        assert!(!settings.tls().is_enabled());
        assert!(settings.tls().client_config().is_none());
    }

    #[test]
    fn defaults() {
        let mut props = ConnectionProperties::new();
        props.set_hostname("host1");
        let settings = props
            .build_client_settings(&no_search_paths(), None, None)
            .unwrap();
        assert!(settings.required_replica_set_name().is_none());
        assert!(settings.connect_timeout().is_none());
        assert!(settings.read_preference().is_none());
        assert!(settings.retry_reads());
        assert!(settings.server_monitor_listeners().is_empty());
    }

    #[test]
    fn tls_settings() {
        let mut props = ConnectionProperties::new();
        props
            .set_hostname("host1")
            .set_tls_enabled(true)
            .set_tls_allow_invalid_hostnames(true);
        let settings = props
            .build_client_settings(&no_search_paths(), None, None)
            .unwrap();
        assert!(settings.tls().is_enabled());
        assert!(settings.tls().is_invalid_host_name_allowed());
        assert!(settings.tls().client_config().is_some());

        let dir = tempfile::tempdir().unwrap();
        props.set_tls_ca_file(dir.path().join("missing.pem").to_string_lossy());
        assert!(matches!(
            props.build_client_settings(&no_search_paths(), None, None),
            Err(DocDbError::CaFileNotFound { .. })
        ));

        // the CA file is not touched without TLS
        props.set_tls_enabled(false);
        props
            .build_client_settings(&no_search_paths(), None, None)
            .unwrap();
    }
}
