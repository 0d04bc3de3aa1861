// Consistency checks between the multiplex configuration and RadioDNS

use super::services::ResolvedService;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// A mismatch worth telling the multiplex operator about
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    /// RadioVIS is advertised but the multiplex carries no Slideshow component
    VisualsWithoutComponent { service: String, label: String },

    /// A Slideshow component exists but nothing can feed it
    ComponentWithoutVisuals { service: String, label: String },

    /// EPG components draw from more than one input
    MultipleEpgInputs(Vec<String>),
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::VisualsWithoutComponent { service, label } => write!(
                f,
                "{} '{}' has hybrid visual slideshow service but no figtype = 0x02 definition in its component definition",
                service, label
            ),
            ConfigWarning::ComponentWithoutVisuals { service, label } => write!(
                f,
                "{} '{}' is configured to send DAB Slideshow with a figtype = 0x02 defined in its component definition, but has no hybrid visual source available",
                service, label
            ),
            ConfigWarning::MultipleEpgInputs(inputs) => write!(
                f,
                "More than one EPG subchannel input file is defined: {}",
                inputs.join(", ")
            ),
        }
    }
}

impl Serialize for ConfigWarning {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Compare each service's components with what RadioDNS advertises
pub fn check_warnings(resolved: &[ResolvedService]) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();
    let mut epg_inputs = BTreeSet::new();

    for entry in resolved {
        let service = &entry.service;
        let visuals = entry.has_visual_source();

        if !service.has_slideshow && visuals {
            warnings.push(ConfigWarning::VisualsWithoutComponent {
                service: service.name.clone(),
                label: service.label.clone(),
            });
        }
        if service.has_slideshow && !visuals {
            warnings.push(ConfigWarning::ComponentWithoutVisuals {
                service: service.name.clone(),
                label: service.label.clone(),
            });
        }

        if let Some(epg) = &service.epg {
            epg_inputs.insert(epg.input_uri.clone());
        }
    }

    if epg_inputs.len() > 1 {
        warnings.push(ConfigWarning::MultipleEpgInputs(
            epg_inputs.into_iter().collect(),
        ));
    }

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::services::tests::sample_resolved;
    use crate::mux::EpgPacket;

    #[tokio::test]
    async fn test_visuals_without_component() {
        let resolved = sample_resolved().await;
        let warnings = check_warnings(&resolved);

        assert_eq!(
            warnings,
            vec![ConfigWarning::VisualsWithoutComponent {
                service: "srv-two".to_string(),
                label: "Radio Two".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_component_without_visuals() {
        let mut resolved = sample_resolved().await;
        resolved[0].dns = None;
        let warnings = check_warnings(&resolved);

        assert!(warnings.contains(&ConfigWarning::ComponentWithoutVisuals {
            service: "srv-one".to_string(),
            label: "Radio One".to_string(),
        }));
    }

    #[tokio::test]
    async fn test_multiple_epg_inputs() {
        let mut resolved = sample_resolved().await;
        resolved[0].service.epg = Some(EpgPacket {
            input_uri: "other.dat".to_string(),
            packet_size: 24,
            packet_address: 2,
        });
        let warnings = check_warnings(&resolved);

        let last = warnings.last().unwrap();
        assert_eq!(
            *last,
            ConfigWarning::MultipleEpgInputs(vec!["epg.dat".to_string(), "other.dat".to_string()])
        );
        assert_eq!(
            last.to_string(),
            "More than one EPG subchannel input file is defined: epg.dat, other.dat"
        );
    }
}
