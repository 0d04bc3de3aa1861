// DNS client backed by hickory-resolver, plus resolver settings

use super::lookup::{DnsClient, DnsError, Result, SrvTarget};
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::rr::RecordType;
use hickory_resolver::TokioAsyncResolver;
use std::net::SocketAddr;
use std::time::Duration;

/// Default RadioDNS root domain
pub const RADIODNS_ROOT: &str = "radiodns.org";

/// Settings for RadioDNS resolution
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Root under which bearers are looked up
    pub root_domain: String,

    /// Nameserver to query instead of the system configuration
    pub nameserver: Option<SocketAddr>,

    /// Per-query timeout
    pub timeout: Duration,

    /// Attempts per query before giving up
    pub attempts: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            root_domain: RADIODNS_ROOT.to_string(),
            nameserver: None,
            timeout: Duration::from_secs(5),
            attempts: 2,
        }
    }
}

impl ResolverSettings {
    /// Query a specific nameserver
    pub fn with_nameserver(mut self, addr: SocketAddr) -> Self {
        self.nameserver = Some(addr);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// DNS client using the tokio flavour of hickory-resolver
pub struct HickoryClient {
    resolver: TokioAsyncResolver,
}

impl HickoryClient {
    /// Build a resolver from settings
    ///
    /// Without an explicit nameserver the system configuration
    /// (`/etc/resolv.conf` or the platform equivalent) is used.
    pub fn new(settings: &ResolverSettings) -> Result<Self> {
        let (config, mut opts) = match settings.nameserver {
            Some(addr) => {
                let group = NameServerConfigGroup::from_ips_clear(&[addr.ip()], addr.port(), true);
                (
                    ResolverConfig::from_parts(None, vec![], group),
                    ResolverOpts::default(),
                )
            }
            None => hickory_resolver::system_conf::read_system_conf()
                .map_err(|e| DnsError::Config(e.to_string()))?,
        };
        opts.timeout = settings.timeout;
        opts.attempts = settings.attempts;

        tracing::debug!(
            nameserver = ?settings.nameserver,
            timeout = ?settings.timeout,
            "creating DNS resolver"
        );

        Ok(Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
        })
    }
}

/// NXDOMAIN and NODATA both mean "no such record"
fn is_no_records(err: &ResolveError) -> bool {
    matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. })
}

/// Make a name absolute so search domains are never appended
fn absolute(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

impl DnsClient for HickoryClient {
    async fn cname(&self, name: &str) -> Result<Option<String>> {
        match self.resolver.lookup(absolute(name).as_str(), RecordType::CNAME).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .find_map(|rdata| rdata.as_cname())
                .map(|cname| cname.to_string().trim_end_matches('.').to_string())),
            Err(e) if is_no_records(&e) => Ok(None),
            Err(e) => Err(DnsError::Lookup {
                name: name.to_string(),
                message: e.to_string(),
            }),
        }
    }

    async fn srv(&self, name: &str) -> Result<Vec<SrvTarget>> {
        match self.resolver.srv_lookup(absolute(name).as_str()).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|srv| SrvTarget {
                    target: srv.target().to_string().trim_end_matches('.').to_string(),
                    port: srv.port(),
                    priority: srv.priority(),
                    weight: srv.weight(),
                })
                .collect()),
            Err(e) if is_no_records(&e) => Ok(Vec::new()),
            Err(e) => Err(DnsError::Lookup {
                name: name.to_string(),
                message: e.to_string(),
            }),
        }
    }
}
