use super::{
    client_settings::ServerAddress,
    property::{ConnectionProperty, PropertyDescriptor, PropertySchema},
    property_bag::PropertyBag,
};
use crate::{url::DOCUMENTDB_CUSTOM_OPTIONS, DocDbError, DocDbResult};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt::Write;
use url::{form_urlencoded, Url};

// The remainder after the scheme prefix is a scheme-relative URI;
// it is parsed as if it had this scheme.
const PARSE_SCHEME: &str = "documentdb";

// Stands in for a host list while the URL is parsed.
const HOST_LIST_PLACEHOLDER: &str = "host-list";

// Characters that stay unencoded in the user and database parts.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const SSH_OPTIONS: [ConnectionProperty; 5] = [
    ConnectionProperty::SshUser,
    ConnectionProperty::SshHostname,
    ConnectionProperty::SshPrivateKeyFile,
    ConnectionProperty::SshStrictHostKeyChecking,
    ConnectionProperty::SshKnownHostsFile,
];

// Which keys besides the supported ones are taken over.
#[derive(Clone, Copy, Debug)]
struct KeyPolicy {
    allow_unsupported: bool,
    allow_unknown: bool,
}

const QUERY_STRING_POLICY: KeyPolicy = KeyPolicy {
    allow_unsupported: false,
    allow_unknown: false,
};

const CUSTOM_OPTIONS_POLICY: KeyPolicy = KeyPolicy {
    allow_unsupported: true,
    allow_unknown: true,
};

pub(crate) fn custom_options_from_env() -> Option<String> {
    std::env::var(DOCUMENTDB_CUSTOM_OPTIONS).ok()
}

/// Decodes `raw_url` into a copy of `seed`.
///
/// Values that exist already in `seed` are not overwritten. `custom_options` is the
/// content of the environment override, it is applied after the URL.
pub(crate) fn decode(
    raw_url: &str,
    seed: &PropertyBag,
    scheme_prefix: &str,
    schema: &dyn PropertySchema,
    custom_options: Option<&str>,
) -> DocDbResult<PropertyBag> {
    let mut bag = seed.clone();
    let remainder =
        raw_url
            .strip_prefix(scheme_prefix)
            .ok_or_else(|| DocDbError::MissingSchemePrefix {
                expected: scheme_prefix.to_string(),
            })?;
    if remainder.trim().is_empty() {
        return Ok(bag);
    }

    let (remainder, host_list) = split_host_list(remainder)?;
    let url = Url::parse(&format!("{PARSE_SCHEME}:{remainder}"))?;
    match host_list {
        Some(host_list) => {
            bag.add_if_absent(ConnectionProperty::Hostname.name(), host_list);
        }
        None => add_host(&mut bag, &url),
    }
    add_user_info(&mut bag, &url)?;
    add_database(&mut bag, &url)?;
    if let Some(query) = url.query() {
        add_query_options(&mut bag, schema, query)?;
    }
    if let Some(custom_options) = custom_options {
        add_custom_options(&mut bag, schema, custom_options)?;
    }
    Ok(bag)
}

// `Url` accepts a single host only. A comma-separated host list is checked entry by entry,
// taken over as it is, and replaced by a placeholder for parsing the rest of the URL.
fn split_host_list(remainder: &str) -> DocDbResult<(String, Option<String>)> {
    let Some(after_slashes) = remainder.strip_prefix("//") else {
        return Ok((remainder.to_string(), None));
    };
    let authority_len = after_slashes
        .find(|c| matches!(c, '/' | '?' | '#'))
        .unwrap_or(after_slashes.len());
    let (authority, rest) = after_slashes.split_at(authority_len);
    let host_start = authority.rfind('@').map_or(0, |i| i + 1);
    let (user_info, hosts) = authority.split_at(host_start);
    if !hosts.contains(',') {
        return Ok((remainder.to_string(), None));
    }

    for host in hosts.split(',') {
        host.trim().parse::<ServerAddress>()?;
    }
    Ok((
        format!("//{user_info}{HOST_LIST_PLACEHOLDER}{rest}"),
        Some(hosts.to_string()),
    ))
}

fn add_host(bag: &mut PropertyBag, url: &Url) {
    match url.host_str().filter(|host| !host.is_empty()) {
        Some(host) => {
            let host = match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            };
            bag.add_if_absent(ConnectionProperty::Hostname.name(), host);
        }
        None => trace!("connection string contains no host"),
    }
}

fn add_user_info(bag: &mut PropertyBag, url: &Url) -> DocDbResult<()> {
    let user = url.username();
    if user.is_empty() && url.password().is_none() {
        trace!("connection string contains no user info");
        return Ok(());
    }
    bag.add_if_absent(
        ConnectionProperty::User.name(),
        percent_decode(ConnectionProperty::User, user)?,
    );
    if let Some(password) = url.password() {
        bag.add_if_absent(
            ConnectionProperty::Password.name(),
            percent_decode(ConnectionProperty::Password, password)?,
        );
    }
    Ok(())
}

fn add_database(bag: &mut PropertyBag, url: &Url) -> DocDbResult<()> {
    if let Some(database) = url.path().trim_start_matches('/').split('/').next() {
        bag.add_if_absent(
            ConnectionProperty::Database.name(),
            percent_decode(ConnectionProperty::Database, database)?,
        );
    }
    Ok(())
}

fn add_query_options(
    bag: &mut PropertyBag,
    schema: &dyn PropertySchema,
    query: &str,
) -> DocDbResult<()> {
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        if !pair.contains('=') {
            return Err(malformed(pair));
        }
        // form_urlencoded splits at the first '=' and decodes both sides
        if let Some((key, value)) = form_urlencoded::parse(pair.as_bytes()).next() {
            add_property_if_valid(bag, schema, &key, &value, QUERY_STRING_POLICY);
        }
    }
    Ok(())
}

fn add_custom_options(
    bag: &mut PropertyBag,
    schema: &dyn PropertySchema,
    custom_options: &str,
) -> DocDbResult<()> {
    for pair in custom_options
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
    {
        let (key, value) = pair.split_once('=').ok_or_else(|| malformed(pair))?;
        add_property_if_valid(bag, schema, key, value, CUSTOM_OPTIONS_POLICY);
    }
    Ok(())
}

fn malformed(pair: &str) -> DocDbError {
    warn!("option '{pair}' has no value");
    DocDbError::MalformedOptionPair {
        pair: pair.to_string(),
    }
}

fn add_property_if_valid(
    bag: &mut PropertyBag,
    schema: &dyn PropertySchema,
    key: &str,
    value: &str,
    policy: KeyPolicy,
) {
    if schema.is_supported(key) {
        bag.add_if_absent(key, value);
    } else if schema.is_unsupported_but_known(key) {
        if policy.allow_unsupported {
            warn!("adding unsupported MongoDB option '{key}', it may not be supported by the server");
            bag.add_if_absent(key, value);
        } else {
            warn!("ignored MongoDB option '{key}', it is not supported");
        }
    } else if policy.allow_unknown {
        warn!("adding unknown option '{key}', it may not be supported by the server");
        bag.add_if_absent(key, value);
    } else {
        warn!("ignored unknown option '{key}'");
    }
}

// Invalid UTF-8 is rejected; the password is not repeated in the error.
fn percent_decode(property: ConnectionProperty, s: &str) -> DocDbResult<String> {
    percent_decode_str(s)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| DocDbError::InvalidPropertyValue {
            property: property.name(),
            value: if property == ConnectionProperty::Password {
                "<password>".to_string()
            } else {
                s.to_string()
            },
        })
}

/// `//[<user>@]<host>/[<database>][?<options>]`, without password.
pub(crate) fn format_sanitized(bag: &PropertyBag, schema: &dyn PropertySchema) -> String {
    let mut buf = String::with_capacity(200);
    buf.push_str("//");
    if let Some(user) = non_blank(bag, ConnectionProperty::User) {
        write!(buf, "{}@", utf8_percent_encode(user, COMPONENT)).ok();
    }
    if let Some(host) = non_blank(bag, ConnectionProperty::Hostname) {
        buf.push_str(host);
    }
    buf.push('/');
    if let Some(database) = non_blank(bag, ConnectionProperty::Database) {
        write!(buf, "{}", utf8_percent_encode(database, COMPONENT)).ok();
    }
    write_options(
        &mut buf,
        bag,
        schema
            .properties()
            .iter()
            .filter(|descriptor| descriptor.in_sanitized_form),
    );
    buf
}

/// `//<host>/[?<ssh options>]`, without passphrase.
pub(crate) fn format_ssh(bag: &PropertyBag, schema: &dyn PropertySchema) -> String {
    let mut buf = String::with_capacity(200);
    buf.push_str("//");
    if let Some(host) = non_blank(bag, ConnectionProperty::Hostname) {
        buf.push_str(host);
    }
    buf.push('/');
    write_options(
        &mut buf,
        bag,
        SSH_OPTIONS
            .iter()
            .filter_map(|property| schema.lookup_by_name(property.name())),
    );
    buf
}

fn non_blank(bag: &PropertyBag, property: ConnectionProperty) -> Option<&str> {
    bag.get(property.name())
        .filter(|value| !value.trim().is_empty())
}

// Writes each option whose effective value differs from its default.
fn write_options<'a>(
    buf: &mut String,
    bag: &PropertyBag,
    descriptors: impl Iterator<Item = &'a PropertyDescriptor>,
) {
    let mut sep = std::iter::repeat(())
        .enumerate()
        .map(|(i, ())| if i == 0 { "?" } else { "&" });

    for descriptor in descriptors {
        let default = descriptor.property_type.normalize(descriptor.default_value);
        let value = bag
            .get(descriptor.name)
            .and_then(|raw| descriptor.property_type.normalize(raw))
            .or_else(|| default.clone());
        if let Some(value) = value.filter(|value| Some(value) != default.as_ref()) {
            write!(
                buf,
                "{}{}={}",
                sep.next().unwrap_or("&"),
                descriptor.name,
                form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>()
            )
            .ok();
        }
    }
}
