pub mod assertion;
pub mod broker;

pub use broker::{BrokerError, CredentialBroker};

use url::Url;

/// Gate for the delegated proxy: the bearer token may only travel to the
/// configured cloud-provider hosts. Exact hostname match, or subdomain match
/// for entries starting with a dot. Plain http is tolerated solely for
/// loopback stubs.
pub fn is_allowed_api_url(url: &Url, allowed_hosts: &[String]) -> bool {
    let host = match url.host_str() {
        Some(host) => host,
        None => return false,
    };

    let scheme_ok = match url.scheme() {
        "https" => true,
        "http" => matches!(host, "localhost" | "127.0.0.1" | "[::1]"),
        _ => false,
    };
    if !scheme_ok {
        return false;
    }

    allowed_hosts.iter().any(|allowed| {
        if let Some(suffix) = allowed.strip_prefix('.') {
            host == suffix || host.ends_with(allowed.as_str())
        } else {
            host == allowed
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["www.googleapis.com".to_string(), ".googleapis.com".to_string()]
    }

    fn check(url: &str) -> bool {
        is_allowed_api_url(&Url::parse(url).unwrap(), &allowed())
    }

    #[test]
    fn accepts_the_exact_api_host() {
        assert!(check("https://www.googleapis.com/drive/v3/files"));
    }

    #[test]
    fn accepts_subdomains_of_a_dotted_suffix() {
        assert!(check("https://admin.googleapis.com/admin/directory/v1/users"));
        assert!(check("https://googleapis.com/x"));
    }

    #[test]
    fn rejects_foreign_hosts_before_dispatch() {
        assert!(!check("https://evil.example.com/x"));
        assert!(!check("https://googleapis.com.evil.example.com/x"));
        assert!(!check("https://notgoogleapis.com/x"));
    }

    #[test]
    fn rejects_non_https_schemes() {
        assert!(!check("http://www.googleapis.com/drive/v3/files"));
        assert!(!check("ftp://www.googleapis.com/x"));
    }

    #[test]
    fn loopback_stub_may_use_http() {
        let hosts = vec!["127.0.0.1".to_string()];
        assert!(is_allowed_api_url(
            &Url::parse("http://127.0.0.1:8099/token-sink").unwrap(),
            &hosts
        ));
    }
}
