// advisable because not all test modules use all functions of this module:
#![allow(dead_code)]

use docdbconnect::{ConnectionProperties, SearchPaths};
use flexi_logger::{opt_format, Logger, LoggerHandle};
use std::path::Path;

// Returns a logger that prints out all info, warn and error messages.
pub fn init_logger() -> LoggerHandle {
    Logger::try_with_env_or_str("info")
        .unwrap()
        .format(opt_format)
        .start()
        .unwrap_or_else(|e| panic!("Logger initialization failed with {e}"))
}

// Search paths that do not depend on the machine the tests run on.
pub fn search_paths_in(folders: &[&Path]) -> SearchPaths {
    SearchPaths::new(
        Some("/home/tester".into()),
        folders.iter().map(|f| Some(f.to_path_buf())),
    )
}

pub fn client_connection_properties() -> ConnectionProperties {
    let mut props = ConnectionProperties::new();
    props
        .set_user("alice")
        .set_password("secret")
        .set_hostname("host1:27017")
        .set_database("mydb");
    props
}

// A PEM file with a single root certificate.
pub fn write_ca_file(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(
        &path,
        include_str!("../../docdbconnect_impl/certs/starfield-services-root-g2.pem"),
    )
    .unwrap();
    path
}
