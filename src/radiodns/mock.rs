// In-memory DNS client for testing lookups without a network

use super::lookup::{DnsClient, DnsError, Result, SrvTarget};
use std::collections::{HashMap, HashSet};

/// DNS client answering from fixed tables
#[derive(Debug, Clone, Default)]
pub struct MockDns {
    cnames: HashMap<String, String>,
    srv: HashMap<String, Vec<SrvTarget>>,
    failing: HashSet<String>,
}

impl MockDns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_cname(&mut self, name: &str, target: &str) {
        self.cnames.insert(normalize(name), target.to_string());
    }

    pub fn add_srv(&mut self, name: &str, target: SrvTarget) {
        self.srv.entry(normalize(name)).or_default().push(target);
    }

    /// Make CNAME queries for `name` fail with a lookup error
    pub fn fail_cname(&mut self, name: &str) {
        self.failing.insert(format!("CNAME {}", normalize(name)));
    }

    /// Make SRV queries for `name` fail with a lookup error
    pub fn fail_srv(&mut self, name: &str) {
        self.failing.insert(format!("SRV {}", normalize(name)));
    }

    fn check(&self, kind: &str, name: &str) -> Result<()> {
        if self.failing.contains(&format!("{} {}", kind, name)) {
            return Err(DnsError::Lookup {
                name: name.to_string(),
                message: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

impl DnsClient for MockDns {
    async fn cname(&self, name: &str) -> Result<Option<String>> {
        let name = normalize(name);
        self.check("CNAME", &name)?;
        Ok(self.cnames.get(&name).cloned())
    }

    async fn srv(&self, name: &str) -> Result<Vec<SrvTarget>> {
        let name = normalize(name);
        self.check("SRV", &name)?;
        Ok(self.srv.get(&name).cloned().unwrap_or_default())
    }
}
