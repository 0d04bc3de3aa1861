// RadioDNS service lookup (ETSI TS 103 270)
pub mod lookup;
pub mod resolver;

#[cfg(test)]
pub mod mock;

pub use lookup::{
    Application, DnsClient, DnsError, RadioDns, Result, ServiceLookup, SrvTarget,
};
pub use resolver::{HickoryClient, ResolverSettings};
