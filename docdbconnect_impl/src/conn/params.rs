pub mod client_settings;
pub mod connection_properties;
pub(crate) mod cp_url;
pub mod into_connection_properties;
pub mod property;
pub mod property_bag;
pub mod search_paths;
pub mod trust;
pub mod validation;
