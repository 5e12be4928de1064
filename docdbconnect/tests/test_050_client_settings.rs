mod test_utils;

use docdbconnect::{ServerAddress, ServerMonitorListener};
use log::info;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

#[derive(Debug, Default)]
struct CountingListener {
    openings: AtomicUsize,
}
impl ServerMonitorListener for CountingListener {
    fn server_opening(&self, _address: &ServerAddress) {
        self.openings.fetch_add(1, Ordering::Relaxed);
    }
}

// cargo test --test test_050_client_settings -- --nocapture
#[test]
fn test_050_client_settings() {
    let _log_handle = test_utils::init_logger();

    plain_connection();
    tunneled_tls_connection();
}

fn plain_connection() {
    info!("settings for a plain connection");
    let search_paths = test_utils::search_paths_in(&[]);
    let listener = Arc::new(CountingListener::default());
    let monitor: Arc<dyn ServerMonitorListener> = listener.clone();
    let settings = test_utils::client_connection_properties()
        .build_client_settings(&search_paths, None, Some(monitor))
        .unwrap();

    assert_eq!(&[ServerAddress::new("host1", 27017)], settings.hosts());
    assert_eq!("alice", settings.credential().unwrap().user());
    assert_eq!("admin", settings.credential().unwrap().source());
    assert!(!settings.tls().is_enabled());
    assert!(settings.retry_reads());
    assert!(!settings.retry_writes());

    for l in settings.server_monitor_listeners() {
        l.server_opening(&settings.hosts()[0]);
    }
    assert_eq!(1, listener.openings.load(Ordering::Relaxed));
}

fn tunneled_tls_connection() {
    info!("settings for a TLS connection through an SSH tunnel");
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("tunnel.pem"), "key").unwrap();
    test_utils::write_ca_file(dir.path(), "ca.pem");
    let search_paths = test_utils::search_paths_in(&[dir.path()]);

    let mut props = test_utils::client_connection_properties();
    props
        .set_ssh_user("ec2-user")
        .set_ssh_hostname("bastion")
        .set_ssh_private_key_file("tunnel.pem")
        .set_tls_enabled(true)
        .set_tls_allow_invalid_hostnames(true)
        .set_tls_ca_file("ca.pem");

    let settings = props
        .build_client_settings(&search_paths, Some(27019), None)
        .unwrap();
    assert_eq!(&[ServerAddress::new("localhost", 27019)], settings.hosts());
    assert!(settings.tls().is_enabled());
    assert!(settings.tls().is_invalid_host_name_allowed());
    assert!(settings.tls().client_config().is_some());
}
