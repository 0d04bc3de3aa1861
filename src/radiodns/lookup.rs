// RadioDNS lookup procedure and its result types
//
// A bearer is turned into a name under the RadioDNS root, whose CNAME gives
// the broadcaster's authoritative FQDN. Each application is then discovered
// through an SRV record under that FQDN.

use super::resolver::ResolverSettings;
use crate::bearer::DabBearer;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DnsError {
    #[error("DNS lookup for {name} failed: {message}")]
    Lookup { name: String, message: String },

    #[error("Resolver configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DnsError>;

/// RadioDNS applications discovered through SRV records
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Application {
    /// RadioVIS over STOMP
    #[serde(rename = "radiovis")]
    RadioVis,
    /// RadioVIS over HTTP Comet
    #[serde(rename = "radiovis-http")]
    RadioVisHttp,
    /// RadioEPG (legacy SPI)
    #[serde(rename = "radioepg")]
    RadioEpg,
    /// Service and Programme Information
    #[serde(rename = "radiospi")]
    RadioSpi,
    /// RadioTAG
    #[serde(rename = "radiotag")]
    RadioTag,
}

impl Application {
    pub const ALL: [Application; 5] = [
        Application::RadioVis,
        Application::RadioVisHttp,
        Application::RadioEpg,
        Application::RadioSpi,
        Application::RadioTag,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Application::RadioVis => "radiovis",
            Application::RadioVisHttp => "radiovis-http",
            Application::RadioEpg => "radioepg",
            Application::RadioSpi => "radiospi",
            Application::RadioTag => "radiotag",
        }
    }

    /// SRV record name for this application under an authoritative FQDN
    pub fn srv_name(&self, authoritative_fqdn: &str) -> String {
        format!("_{}._tcp.{}", self.name(), authoritative_fqdn)
    }
}

impl fmt::Display for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One SRV answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SrvTarget {
    pub target: String,
    pub port: u16,
    pub priority: u16,
    pub weight: u16,
}

impl SrvTarget {
    pub fn new(target: impl Into<String>, port: u16) -> Self {
        Self {
            target: target.into(),
            port,
            priority: 0,
            weight: 0,
        }
    }
}

impl fmt::Display for SrvTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.target, self.port)
    }
}

/// Result of a successful RadioDNS lookup for one bearer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceLookup {
    /// Name that was queried under the RadioDNS root
    pub fqdn: String,
    /// Broadcaster FQDN the RadioDNS name points at
    pub authoritative_fqdn: String,
    /// Servers for every application that has SRV records
    pub applications: BTreeMap<Application, Vec<SrvTarget>>,
}

impl ServiceLookup {
    pub fn supports(&self, app: Application) -> bool {
        self.applications
            .get(&app)
            .map(|servers| !servers.is_empty())
            .unwrap_or(false)
    }

    /// Servers advertised for an application, sorted by priority
    pub fn servers(&self, app: Application) -> &[SrvTarget] {
        self.applications
            .get(&app)
            .map(|servers| servers.as_slice())
            .unwrap_or(&[])
    }
}

/// The two DNS queries RadioDNS needs
///
/// Implementations return `Ok(None)` / an empty list when the name exists
/// but carries no matching record (NXDOMAIN or NODATA).
#[allow(async_fn_in_trait)]
pub trait DnsClient {
    /// Canonical name the given name points at, without the trailing dot
    async fn cname(&self, name: &str) -> Result<Option<String>>;

    /// SRV answers for the given name
    async fn srv(&self, name: &str) -> Result<Vec<SrvTarget>>;
}

/// RadioDNS resolver over some DNS client
pub struct RadioDns<C: DnsClient> {
    client: C,
    settings: ResolverSettings,
}

impl<C: DnsClient> RadioDns<C> {
    pub fn new(client: C, settings: ResolverSettings) -> Self {
        Self { client, settings }
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Look up a DAB bearer
    ///
    /// Returns `None` when the bearer has no RadioDNS registration.
    pub async fn lookup_dab(&self, bearer: &DabBearer) -> Result<Option<ServiceLookup>> {
        let fqdn = bearer.radiodns_fqdn(&self.settings.root_domain);
        tracing::debug!(bearer = %bearer, fqdn = %fqdn, "RadioDNS CNAME lookup");

        let Some(authoritative_fqdn) = self.client.cname(&fqdn).await? else {
            tracing::debug!(fqdn = %fqdn, "no RadioDNS registration");
            return Ok(None);
        };
        let authoritative_fqdn = authoritative_fqdn.trim_end_matches('.').to_string();

        let mut applications = BTreeMap::new();
        for app in Application::ALL {
            let name = app.srv_name(&authoritative_fqdn);
            match self.client.srv(&name).await {
                Ok(mut servers) => {
                    servers.retain(|s| !s.target.is_empty() && s.target != ".");
                    servers.sort_by_key(|s| (s.priority, std::cmp::Reverse(s.weight)));
                    if !servers.is_empty() {
                        tracing::debug!(app = %app, count = servers.len(), "application found");
                        applications.insert(app, servers);
                    }
                }
                Err(e) => {
                    tracing::debug!(app = %app, error = %e, "SRV lookup failed, treating as unsupported");
                }
            }
        }

        Ok(Some(ServiceLookup {
            fqdn,
            authoritative_fqdn,
            applications,
        }))
    }
}
