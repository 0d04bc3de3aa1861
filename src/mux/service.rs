// Per-service summary derived from a multiplex configuration

use super::config::{MuxConfig, MuxConfigError, Result, ServiceDef};
use crate::bearer::DabBearer;
use serde::Serialize;

/// Packet-mode delivery details for a service's EPG component
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpgPacket {
    /// Input feeding the EPG subchannel
    pub input_uri: String,
    /// Packet size in bytes (subchannel bitrate * 3)
    pub packet_size: u32,
    pub packet_address: u16,
}

/// A service as seen by the bridge: its bearer and which data
/// applications the multiplex is configured to carry for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MuxService {
    /// Key of the service in the `services` section
    pub name: String,
    pub label: String,
    pub bearer: DabBearer,
    /// A figtype 0x02 component is defined for the service
    pub has_slideshow: bool,
    /// A figtype 0x07 / type 60 component is defined for the service
    pub has_epg: bool,
    /// Set when the EPG component sits on a usable packet subchannel
    pub epg: Option<EpgPacket>,
}

impl MuxConfig {
    /// Summarise every service in file order
    pub fn mux_services(&self) -> Result<Vec<MuxService>> {
        self.services.iter().map(|def| self.summarise(def)).collect()
    }

    /// ECC that applies to a service
    ///
    /// Long SIds carry the ECC in their top byte. Short SIds use the
    /// service's own `ecc` setting, falling back to the ensemble ECC.
    pub fn service_ecc(&self, def: &ServiceDef) -> u8 {
        if def.id > crate::bearer::dab::SHORT_SID_MAX {
            (def.id >> 24) as u8
        } else {
            def.ecc.unwrap_or(self.ensemble.ecc)
        }
    }

    fn summarise(&self, def: &ServiceDef) -> Result<MuxService> {
        let mut has_slideshow = false;
        let mut has_epg = false;
        let mut epg = None;

        for component in self.components_of(&def.name) {
            if component.is_slideshow() {
                has_slideshow = true;
            }
            if component.is_epg() {
                has_epg = true;
                let sub = component
                    .subchannel
                    .as_deref()
                    .and_then(|name| self.subchannel(name))
                    .filter(|sub| sub.kind.is_packet());
                let Some(sub) = sub else {
                    tracing::debug!(
                        component = %component.name,
                        "EPG component is not carried on a packet subchannel"
                    );
                    continue;
                };

                let address = component.address.ok_or_else(|| {
                    MuxConfigError::MissingField(format!("{}.address", component.name))
                })?;
                let bitrate = sub.bitrate.ok_or_else(|| {
                    MuxConfigError::MissingField(format!("{}.bitrate", sub.name))
                })?;
                let input_uri = sub.input_uri.clone().ok_or_else(|| {
                    MuxConfigError::MissingField(format!("{}.inputuri", sub.name))
                })?;

                epg = Some(EpgPacket {
                    input_uri,
                    packet_size: bitrate * 3,
                    packet_address: address,
                });
            }
        }

        Ok(MuxService {
            name: def.name.clone(),
            label: def.label.clone().unwrap_or_else(|| def.name.clone()),
            bearer: DabBearer::new(self.service_ecc(def), self.ensemble.id, def.id),
            has_slideshow,
            has_epg,
            epg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mux::config::tests::SAMPLE_MUX;

    #[test]
    fn test_service_summaries() -> Result<()> {
        let config = MuxConfig::parse(SAMPLE_MUX)?;
        let services = config.mux_services()?;
        assert_eq!(services.len(), 3);

        let one = &services[0];
        assert_eq!(one.label, "Radio One");
        assert!(one.has_slideshow);
        assert!(!one.has_epg);
        assert_eq!(one.bearer.to_string(), "dab:ce1.ce15.c221.0");

        let two = &services[1];
        assert!(!two.has_slideshow);
        assert_eq!(two.bearer.ecc, 0xe0);
        assert_eq!(two.bearer.to_string(), "dab:ce0.ce15.c222.0");

        let epg = &services[2];
        assert!(epg.has_epg);
        assert_eq!(epg.bearer.ecc, 0xe1);
        assert_eq!(
            epg.epg,
            Some(EpgPacket {
                input_uri: "epg.dat".to_string(),
                packet_size: 48,
                packet_address: 1,
            })
        );
        Ok(())
    }

    #[test]
    fn test_epg_on_non_packet_subchannel() -> Result<()> {
        let config = MuxConfig::parse(
            r#"
ensemble { id 0x4fff
ecc 0xec
}
services { srv { id 0x4daa } }
subchannels { sub { type audio
bitrate 128 } }
components { comp { service srv
subchannel sub
figtype 0x7
type 60
address 0x2 } }
"#,
        )?;
        let services = config.mux_services()?;
        assert!(services[0].has_epg);
        assert_eq!(services[0].epg, None);
        assert_eq!(services[0].label, "srv");
        Ok(())
    }

    #[test]
    fn test_epg_requires_type_60() -> Result<()> {
        let mut config = MuxConfig::parse(SAMPLE_MUX)?;
        config.components[2].component_type = Some(59);
        let services = config.mux_services()?;
        assert!(!services[2].has_epg);
        Ok(())
    }

    #[test]
    fn test_epg_missing_address() {
        let mut config = MuxConfig::parse(SAMPLE_MUX).unwrap();
        config.components[2].address = None;
        assert!(matches!(
            config.mux_services(),
            Err(MuxConfigError::MissingField(f)) if f == "comp-epg.address"
        ));
    }
}
