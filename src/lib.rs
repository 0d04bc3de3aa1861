// ODR RadioDNS Bridge: connects RadioDNS applications to an ODR-DabMux multiplex
// Licensed under the GNU LGPL 2.1 or later

pub mod bearer;
pub mod bridge;
pub mod info;
pub mod mux;
pub mod radiodns;

// Re-export commonly used types
pub use bearer::{BearerError, DabBearer};
pub use bridge::{
    check_warnings, epg_services, resolve_services, slideshow_services, ConfigWarning,
    EpgService, Report, ResolvedService, SlideshowService,
};
pub use info::{InfoError, InfoTree};
pub use mux::{EpgPacket, MuxConfig, MuxConfigError, MuxService};
pub use radiodns::{
    Application, DnsClient, DnsError, HickoryClient, RadioDns, ResolverSettings, ServiceLookup,
    SrvTarget,
};

/// Bridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
