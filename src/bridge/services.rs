// Selecting the services that qualify for Slideshow and programme guides

use super::warnings::{check_warnings, ConfigWarning};
use crate::bearer::DabBearer;
use crate::mux::MuxService;
use crate::radiodns::{Application, DnsClient, RadioDns, ServiceLookup, SrvTarget};
use serde::Serialize;

/// A multiplex service together with its RadioDNS lookup result
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedService {
    #[serde(flatten)]
    pub service: MuxService,
    /// `None` when the bearer has no RadioDNS registration or the lookup failed
    pub dns: Option<ServiceLookup>,
}

impl ResolvedService {
    pub fn new(service: MuxService, dns: Option<ServiceLookup>) -> Self {
        Self { service, dns }
    }

    pub fn supports(&self, app: Application) -> bool {
        self.dns.as_ref().map(|d| d.supports(app)).unwrap_or(false)
    }

    pub fn servers(&self, app: Application) -> &[SrvTarget] {
        self.dns.as_ref().map(|d| d.servers(app)).unwrap_or(&[])
    }

    pub fn authoritative_fqdn(&self) -> Option<&str> {
        self.dns.as_ref().map(|d| d.authoritative_fqdn.as_str())
    }

    /// A RadioVIS source (STOMP or HTTP) is advertised
    pub fn has_visual_source(&self) -> bool {
        self.supports(Application::RadioVis) || self.supports(Application::RadioVisHttp)
    }

    /// Programme guide application to use, preferring SPI over legacy EPG
    pub fn guide_application(&self) -> Option<Application> {
        [Application::RadioSpi, Application::RadioEpg]
            .into_iter()
            .find(|app| self.supports(*app))
    }
}

/// A service that can be fed hybrid visuals into DAB Slideshow
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideshowService {
    pub fqdn: String,
    pub service: String,
    pub label: String,
    pub bearer: DabBearer,
    pub radiovis: Vec<SrvTarget>,
    #[serde(rename = "radiovis-http")]
    pub radiovis_http: Vec<SrvTarget>,
}

/// One programme guide provider and the bearers it describes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpgService {
    pub fqdn: String,
    pub application: Application,
    pub bearers: Vec<DabBearer>,
    pub servers: Vec<SrvTarget>,
}

/// Look every service up in RadioDNS
///
/// Lookup failures are logged and recorded as "no registration" so a single
/// unreachable zone does not abort the run.
pub async fn resolve_services<C: DnsClient>(
    radiodns: &RadioDns<C>,
    services: Vec<MuxService>,
) -> Vec<ResolvedService> {
    let mut resolved = Vec::with_capacity(services.len());
    for service in services {
        let dns = match radiodns.lookup_dab(&service.bearer).await {
            Ok(dns) => dns,
            Err(e) => {
                tracing::warn!(service = %service.name, bearer = %service.bearer, "RadioDNS lookup failed: {}", e);
                None
            }
        };
        match &dns {
            Some(lookup) => tracing::info!(
                service = %service.name,
                fqdn = %lookup.authoritative_fqdn,
                applications = lookup.applications.len(),
                "resolved"
            ),
            None => tracing::info!(service = %service.name, "not registered in RadioDNS"),
        }
        resolved.push(ResolvedService::new(service, dns));
    }
    resolved
}

/// Services with a Slideshow component and a RadioVIS source
pub fn slideshow_services(resolved: &[ResolvedService]) -> Vec<SlideshowService> {
    resolved
        .iter()
        .filter(|s| s.service.has_slideshow && s.has_visual_source())
        .filter_map(|s| {
            Some(SlideshowService {
                fqdn: s.authoritative_fqdn()?.to_string(),
                service: s.service.name.clone(),
                label: s.service.label.clone(),
                bearer: s.service.bearer,
                radiovis: s.servers(Application::RadioVis).to_vec(),
                radiovis_http: s.servers(Application::RadioVisHttp).to_vec(),
            })
        })
        .collect()
}

/// Programme guide providers, one per authoritative FQDN in first-seen order
pub fn epg_services(resolved: &[ResolvedService]) -> Vec<EpgService> {
    let mut providers: Vec<EpgService> = Vec::new();

    for service in resolved {
        let (Some(fqdn), Some(app)) = (service.authoritative_fqdn(), service.guide_application())
        else {
            continue;
        };
        if providers.iter().any(|p| p.fqdn == fqdn) {
            continue;
        }

        let bearers = resolved
            .iter()
            .filter(|s| s.authoritative_fqdn() == Some(fqdn) && s.supports(app))
            .map(|s| s.service.bearer)
            .collect();

        providers.push(EpgService {
            fqdn: fqdn.to_string(),
            application: app,
            bearers,
            servers: service.servers(app).to_vec(),
        });
    }

    providers
}

/// Everything one bridge run produces
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub slideshow: Vec<SlideshowService>,
    pub epg: Vec<EpgService>,
    pub warnings: Vec<ConfigWarning>,
}

impl Report {
    pub fn build(resolved: &[ResolvedService]) -> Self {
        Self {
            slideshow: slideshow_services(resolved),
            epg: epg_services(resolved),
            warnings: check_warnings(resolved),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mux::config::tests::SAMPLE_MUX;
    use crate::mux::MuxConfig;
    use crate::radiodns::mock::MockDns;
    use crate::radiodns::ResolverSettings;

    /// RadioDNS data matching SAMPLE_MUX: srv-one has visuals and SPI,
    /// srv-two shares its FQDN with SPI only, srv-epg is unregistered.
    pub(crate) fn sample_dns() -> MockDns {
        let mut dns = MockDns::new();
        dns.add_cname("0.c221.ce15.ce1.dab.radiodns.org", "rdns.example.com");
        dns.add_cname("0.c222.ce15.ce0.dab.radiodns.org", "rdns.example.com");
        dns.add_srv(
            "_radiovis._tcp.rdns.example.com",
            SrvTarget::new("vis.example.com", 61613),
        );
        dns.add_srv(
            "_radiospi._tcp.rdns.example.com",
            SrvTarget::new("spi.example.com", 80),
        );
        dns.add_srv(
            "_radioepg._tcp.rdns.example.com",
            SrvTarget::new("epg.example.com", 80),
        );
        dns
    }

    pub(crate) async fn sample_resolved() -> Vec<ResolvedService> {
        let services = MuxConfig::parse(SAMPLE_MUX)
            .unwrap()
            .mux_services()
            .unwrap();
        let radiodns = RadioDns::new(sample_dns(), ResolverSettings::default());
        resolve_services(&radiodns, services).await
    }

    #[tokio::test]
    async fn test_resolve_services() {
        let resolved = sample_resolved().await;
        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved[0].authoritative_fqdn(), Some("rdns.example.com"));
        assert!(resolved[0].has_visual_source());
        assert_eq!(resolved[2].dns, None);
    }

    #[tokio::test]
    async fn test_failed_lookup_is_unregistered() {
        let services = MuxConfig::parse(SAMPLE_MUX)
            .unwrap()
            .mux_services()
            .unwrap();
        let mut dns = sample_dns();
        dns.fail_cname("0.c221.ce15.ce1.dab.radiodns.org");
        let radiodns = RadioDns::new(dns, ResolverSettings::default());

        let resolved = resolve_services(&radiodns, services).await;
        assert_eq!(resolved[0].dns, None);
        assert!(resolved[1].dns.is_some());
    }

    #[tokio::test]
    async fn test_slideshow_services() {
        let resolved = sample_resolved().await;
        let slideshow = slideshow_services(&resolved);

        // srv-two also has RadioVIS but no figtype 0x02 component
        assert_eq!(slideshow.len(), 1);
        assert_eq!(slideshow[0].service, "srv-one");
        assert_eq!(slideshow[0].fqdn, "rdns.example.com");
        assert_eq!(slideshow[0].radiovis[0].target, "vis.example.com");
        assert!(slideshow[0].radiovis_http.is_empty());
    }

    #[tokio::test]
    async fn test_epg_services_grouped_by_fqdn() {
        let resolved = sample_resolved().await;
        let epg = epg_services(&resolved);

        assert_eq!(epg.len(), 1);
        assert_eq!(epg[0].fqdn, "rdns.example.com");
        assert_eq!(epg[0].application, Application::RadioSpi);
        assert_eq!(
            epg[0].bearers,
            vec![resolved[0].service.bearer, resolved[1].service.bearer]
        );
        assert_eq!(epg[0].servers[0].target, "spi.example.com");
    }

    #[tokio::test]
    async fn test_epg_falls_back_to_radioepg() {
        let services = MuxConfig::parse(SAMPLE_MUX)
            .unwrap()
            .mux_services()
            .unwrap();
        let mut dns = MockDns::new();
        dns.add_cname("0.c221.ce15.ce1.dab.radiodns.org", "legacy.example.com");
        dns.add_srv(
            "_radioepg._tcp.legacy.example.com",
            SrvTarget::new("epg.legacy.example.com", 80),
        );
        let radiodns = RadioDns::new(dns, ResolverSettings::default());
        let resolved = resolve_services(&radiodns, services).await;

        let epg = epg_services(&resolved);
        assert_eq!(epg.len(), 1);
        assert_eq!(epg[0].application, Application::RadioEpg);
        assert_eq!(epg[0].bearers.len(), 1);
    }

    #[tokio::test]
    async fn test_report_json() {
        let resolved = sample_resolved().await;
        let report = Report::build(&resolved);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["slideshow"][0]["bearer"], "dab:ce1.ce15.c221.0");
        assert_eq!(json["slideshow"][0]["radiovis"][0]["port"], 61613);
        assert_eq!(json["epg"][0]["application"], "radiospi");
        assert!(json["warnings"].is_array());
    }
}
