use super::{connection_properties::ConnectionProperties, search_paths::SearchPaths};
use crate::{DocDbError, DocDbResult};
use rustls::{
    client::{ServerCertVerified, ServerCertVerifier, ServerName, WebPkiVerifier},
    Certificate, CertificateError, ClientConfig, OwnedTrustAnchor, RootCertStore,
};
use std::{
    io::{BufRead, BufReader},
    path::Path,
    sync::Arc,
    time::SystemTime,
};

// Certificate bundles of the managed service, as published by the vendor. They are looked up
// with the search paths, so that they can be installed next to the application
// or in `~/.documentdb`.
const DISTRIBUTION_BUNDLES: [&str; 2] = ["global-bundle.pem", "rds-prod-root-ca-2021.pem"];

// Root certificates that are shipped with the crate, so that the service can be reached
// even if the platform trust store is outdated.
const EMBEDDED_BUNDLES: [(&str, &str); 2] = [
    (
        "amazon-root-ca-bundle.pem",
        include_str!("../../../certs/amazon-root-ca-bundle.pem"),
    ),
    (
        "starfield-services-root-g2.pem",
        include_str!("../../../certs/starfield-services-root-g2.pem"),
    ),
];

/// Where a trusted certificate authority came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrustOrigin {
    /// The file configured with `tlsCAFile`.
    CaFile,
    /// A vendor bundle that was found with the search paths.
    DistributionBundle(&'static str),
    /// A bundle that is embedded in the crate.
    EmbeddedBundle(&'static str),
    /// The trust store of the operating system.
    Platform,
    /// The Mozilla root program, compiled into the crate.
    Runtime,
}

/// A trusted certificate authority.
#[derive(Clone, Debug)]
pub enum TrustAnchor {
    /// A DER-encoded certificate.
    Certificate(Certificate),
    /// A pre-parsed trust anchor.
    Anchor(OwnedTrustAnchor),
}

/// The ordered list of certificate authorities that a TLS connection trusts.
///
/// The order is: the configured CA file, the vendor bundles found with the search paths,
/// the embedded bundles, the platform trust store, the compiled-in Mozilla roots.
/// It is built freshly for every connection, because the CA file may change.
#[derive(Clone, Debug, Default)]
pub struct TrustMaterial {
    entries: Vec<(TrustOrigin, TrustAnchor)>,
}

impl TrustMaterial {
    pub(crate) fn build(
        props: &ConnectionProperties,
        search_paths: &SearchPaths,
    ) -> DocDbResult<Self> {
        let mut material = Self::default();

        if let Some(ca_file) = props.tls_ca_file().filter(|f| !f.trim().is_empty()) {
            let path = search_paths.resolve(ca_file);
            if !path.exists() {
                return Err(DocDbError::CaFileNotFound { path });
            }
            material.add_pem_file(TrustOrigin::CaFile, &path)?;
        }

        for name in DISTRIBUTION_BUNDLES {
            let path = search_paths.resolve(name);
            if path.exists() {
                material.add_pem_file(TrustOrigin::DistributionBundle(name), &path)?;
            } else {
                debug!("certificate bundle {name} is not installed");
            }
        }

        for (name, pem) in EMBEDDED_BUNDLES {
            material.add_pem(
                TrustOrigin::EmbeddedBundle(name),
                name,
                &mut pem.as_bytes(),
            )?;
        }

        material.add_platform_anchors();
        material.add_runtime_anchors();
        debug!("trust material with {} entries", material.len());
        Ok(material)
    }

    fn add_pem_file(&mut self, origin: TrustOrigin, path: &Path) -> DocDbResult<()> {
        let what = path.display().to_string();
        trace!("reading certificates from {what}");
        // the file is closed when the reader goes out of scope, also on errors
        let mut reader = BufReader::new(
            std::fs::File::open(path).map_err(|e| DocDbError::certificate_load(&what, e))?,
        );
        self.add_pem(origin, &what, &mut reader)
    }

    fn add_pem(
        &mut self,
        origin: TrustOrigin,
        what: &str,
        reader: &mut dyn BufRead,
    ) -> DocDbResult<()> {
        let certs =
            rustls_pemfile::certs(reader).map_err(|e| DocDbError::certificate_load(what, e))?;
        if certs.is_empty() {
            return Err(DocDbError::certificate_load(
                what,
                std::io::Error::new(std::io::ErrorKind::InvalidData, "no certificates found"),
            ));
        }
        self.entries.extend(
            certs
                .into_iter()
                .map(|der| (origin, TrustAnchor::Certificate(Certificate(der)))),
        );
        Ok(())
    }

    fn add_platform_anchors(&mut self) {
        match rustls_native_certs::load_native_certs() {
            Ok(certs) => {
                self.entries.extend(certs.into_iter().map(|cert| {
                    (
                        TrustOrigin::Platform,
                        TrustAnchor::Certificate(Certificate(cert.0)),
                    )
                }));
            }
            Err(e) => warn!("platform trust store could not be read: {e}"),
        }
    }

    fn add_runtime_anchors(&mut self) {
        self.entries
            .extend(webpki_roots::TLS_SERVER_ROOTS.iter().map(|ta| {
                (
                    TrustOrigin::Runtime,
                    TrustAnchor::Anchor(OwnedTrustAnchor::from_subject_spki_name_constraints(
                        ta.subject,
                        ta.spki,
                        ta.name_constraints,
                    )),
                )
            }));
    }

    /// The entries, in precedence order.
    pub fn iter(&self) -> impl Iterator<Item = (TrustOrigin, &TrustAnchor)> {
        self.entries.iter().map(|(origin, anchor)| (*origin, anchor))
    }

    /// The number of entries that came from the given origin.
    pub fn count(&self, origin: TrustOrigin) -> usize {
        self.entries.iter().filter(|(o, _)| *o == origin).count()
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Creates a trust store with all entries.
    ///
    /// Certificates from the CA file and from the bundles must be valid;
    /// invalid certificates from the platform store are skipped.
    pub fn root_cert_store(&self) -> DocDbResult<RootCertStore> {
        let mut root_store = RootCertStore::empty();
        let mut platform_rejected = 0_usize;
        for (origin, anchor) in &self.entries {
            match (origin, anchor) {
                (TrustOrigin::Platform, TrustAnchor::Certificate(cert)) => {
                    let (_, n_err) = root_store.add_parsable_certificates(&[cert.0.clone()]);
                    platform_rejected += n_err;
                }
                (_, TrustAnchor::Certificate(cert)) => {
                    root_store.add(cert).map_err(|e| {
                        DocDbError::certificate_load(
                            format!("{origin:?}"),
                            std::io::Error::new(std::io::ErrorKind::InvalidData, e),
                        )
                    })?;
                }
                (_, TrustAnchor::Anchor(ta)) => {
                    root_store.add_trust_anchors(std::iter::once(ta.clone()));
                }
            }
        }
        if platform_rejected > 0 {
            info!("{platform_rejected} certificates of the platform trust store were not accepted");
        }
        Ok(root_store)
    }

    /// Creates the TLS client configuration that trusts all entries.
    ///
    /// With `allow_invalid_hostnames`, server certificates are still verified against the
    /// trust store, but a mismatch between certificate and host name is tolerated.
    pub fn client_config(&self, allow_invalid_hostnames: bool) -> DocDbResult<ClientConfig> {
        let root_store = self.root_cert_store()?;
        let builder = ClientConfig::builder().with_safe_defaults();
        Ok(if allow_invalid_hostnames {
            builder
                .with_custom_certificate_verifier(Arc::new(HostnameTolerantVerifier {
                    inner: WebPkiVerifier::new(root_store, None),
                }))
                .with_no_client_auth()
        } else {
            builder
                .with_root_certificates(root_store)
                .with_no_client_auth()
        })
    }
}

struct HostnameTolerantVerifier {
    inner: WebPkiVerifier,
}
impl ServerCertVerifier for HostnameTolerantVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &Certificate,
        intermediates: &[Certificate],
        server_name: &ServerName,
        scts: &mut dyn Iterator<Item = &[u8]>,
        ocsp_response: &[u8],
        now: SystemTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        match self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            scts,
            ocsp_response,
            now,
        ) {
            Err(rustls::Error::InvalidCertificate(CertificateError::NotValidForName)) => {
                debug!("accepting server certificate that is not valid for {server_name:?}");
                Ok(ServerCertVerified::assertion())
            }
            result => result,
        }
    }
}
