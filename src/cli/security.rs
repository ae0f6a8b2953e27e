// ABOUTME: Derives optional TLS settings from the resolved client configuration
// ABOUTME: The server identity is the host part of the address; parse failures leave it empty

use crate::cli::config::ClientConfiguration;
use crate::client::TlsOptions;

/// TLS settings for `config`, or `None` for plain TCP.
///
/// `precaire` has no effect unless `tls` is set.
pub fn transport_security(config: &ClientConfiguration) -> Option<TlsOptions> {
    if !config.tls {
        return None;
    }

    let server_name = split_host(&config.addr).unwrap_or_default();
    Some(TlsOptions::new(server_name).insecure(config.precaire))
}

/// Host part of a `host:port` address. IPv6 hosts must be bracketed.
///
/// Returns `None` when the address has no port separator or is otherwise
/// malformed, e.g. a second colon after a bracketed host. The port is not
/// checked to be numeric.
pub fn split_host(addr: &str) -> Option<&str> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, after) = rest.split_once(']')?;
        let port = after.strip_prefix(':')?;
        return (!port.contains([':', '[', ']'])).then_some(host);
    }

    let (host, port) = addr.rsplit_once(':')?;
    if host.contains([':', '[', ']']) || port.contains(['[', ']']) {
        // unbracketed IPv6 or stray brackets
        return None;
    }
    Some(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(addr: &str, tls: bool, precaire: bool) -> ClientConfiguration {
        ClientConfiguration {
            addr: addr.to_string(),
            user: String::new(),
            passwd: String::new(),
            tls,
            precaire,
        }
    }

    #[test]
    fn plain_transport_without_tls() {
        assert_eq!(transport_security(&config("localhost:6200", false, false)), None);
        assert_eq!(transport_security(&config("garbage", false, false)), None);
    }

    #[test]
    fn precaire_alone_has_no_effect() {
        assert_eq!(transport_security(&config("smsc.example.com:2775", false, true)), None);
    }

    #[test]
    fn tls_identity_is_the_host() {
        let options = transport_security(&config("smsc.example.com:2775", true, true)).unwrap();
        assert_eq!(options.server_name, "smsc.example.com");
        assert!(options.insecure_skip_verify);

        let options = transport_security(&config("smsc.example.com:2775", true, false)).unwrap();
        assert!(!options.insecure_skip_verify);
    }

    #[test]
    fn malformed_address_leaves_identity_empty() {
        let options = transport_security(&config("no-port-here", true, false)).unwrap();
        assert_eq!(options.server_name, "");
    }

    #[test]
    fn split_host_cases() {
        assert_eq!(split_host("localhost:6200"), Some("localhost"));
        assert_eq!(split_host("10.0.0.1:2775"), Some("10.0.0.1"));
        assert_eq!(split_host("[::1]:2775"), Some("::1"));
        assert_eq!(split_host("host:notaport"), Some("host"));
        assert_eq!(split_host(":2775"), Some(""));
        assert_eq!(split_host("localhost"), None);
        assert_eq!(split_host("::1:2775"), None);
        assert_eq!(split_host("[::1]2775"), None);
        assert_eq!(split_host("[::1"), None);
    }

    #[test]
    fn extra_colon_after_bracketed_host_is_malformed() {
        assert_eq!(split_host("[::1]:80:90"), None);
        assert_eq!(split_host("[::1]:80]"), None);
        assert_eq!(split_host("host:80]"), None);

        let options = transport_security(&config("[::1]:80:90", true, true)).unwrap();
        assert_eq!(options.server_name, "");
    }
}
