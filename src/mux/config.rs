// Typed view over the sections of an ODR-DabMux configuration file

use crate::info::{InfoError, InfoTree};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MuxConfigError {
    #[error("Config syntax error: {0}")]
    Syntax(#[from] InfoError),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid number in {field}: '{value}'")]
    InvalidNumber { field: String, value: String },
}

pub type Result<T> = std::result::Result<T, MuxConfigError>;

/// FIG 0/13 user application type for MOT Slideshow
pub const FIGTYPE_SLIDESHOW: u8 = 0x02;
/// FIG 0/13 user application type for MOT EPG / SPI
pub const FIGTYPE_EPG: u8 = 0x07;
/// Data service component type for the EPG
pub const COMPONENT_TYPE_EPG: u8 = 60;

/// Ensemble-level identifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ensemble {
    /// Extended Country Code
    pub ecc: u8,
    /// Ensemble Id
    pub id: u16,
    pub label: Option<String>,
    pub short_label: Option<String>,
}

/// A service entry from the `services` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDef {
    /// Section key, used by components to refer to the service
    pub name: String,
    pub id: u32,
    /// Per-service ECC override for short SIds
    pub ecc: Option<u8>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubchannelKind {
    Audio,
    DabPlus,
    Data,
    Packet,
    EnhancedPacket,
    Other(String),
}

impl SubchannelKind {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "audio" => Self::Audio,
            "dabplus" => Self::DabPlus,
            "data" => Self::Data,
            "packet" => Self::Packet,
            "enhancedpacket" => Self::EnhancedPacket,
            _ => Self::Other(s.to_string()),
        }
    }

    /// Packet-mode subchannels can carry the EPG
    pub fn is_packet(&self) -> bool {
        matches!(self, Self::Packet | Self::EnhancedPacket)
    }
}

impl fmt::Display for SubchannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => write!(f, "audio"),
            Self::DabPlus => write!(f, "dabplus"),
            Self::Data => write!(f, "data"),
            Self::Packet => write!(f, "packet"),
            Self::EnhancedPacket => write!(f, "enhancedpacket"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A subchannel entry from the `subchannels` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subchannel {
    pub name: String,
    pub kind: SubchannelKind,
    /// Bitrate in kbit/s
    pub bitrate: Option<u32>,
    pub input_uri: Option<String>,
    pub id: Option<u8>,
}

/// A component entry from the `components` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    /// Key of the owning service
    pub service: String,
    /// Key of the carrying subchannel
    pub subchannel: Option<String>,
    pub figtype: Option<u8>,
    pub component_type: Option<u8>,
    /// Packet address
    pub address: Option<u16>,
}

impl Component {
    pub fn is_slideshow(&self) -> bool {
        self.figtype == Some(FIGTYPE_SLIDESHOW)
    }

    pub fn is_epg(&self) -> bool {
        self.figtype == Some(FIGTYPE_EPG) && self.component_type == Some(COMPONENT_TYPE_EPG)
    }
}

/// A parsed multiplex configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuxConfig {
    pub ensemble: Ensemble,
    pub services: Vec<ServiceDef>,
    pub subchannels: Vec<Subchannel>,
    pub components: Vec<Component>,
}

impl MuxConfig {
    /// Load and parse a configuration file
    pub fn load(filename: impl AsRef<Path>) -> Result<Self> {
        let tree = InfoTree::load(filename)?;
        Self::from_tree(&tree)
    }

    /// Parse configuration text
    pub fn parse(text: &str) -> Result<Self> {
        let tree = InfoTree::parse(text)?;
        Self::from_tree(&tree)
    }

    /// Build the typed configuration from a parsed INFO tree
    pub fn from_tree(root: &InfoTree) -> Result<Self> {
        let ensemble_node = root
            .get("ensemble")
            .ok_or_else(|| MuxConfigError::MissingField("ensemble".to_string()))?;
        let ensemble = Ensemble {
            ecc: hex_u8(required(ensemble_node, "ensemble", "ecc")?, "ensemble.ecc")?,
            id: hex_u16(required(ensemble_node, "ensemble", "id")?, "ensemble.id")?,
            label: ensemble_node.child_value("label").map(str::to_string),
            short_label: ensemble_node.child_value("shortlabel").map(str::to_string),
        };

        let mut services = Vec::new();
        for (name, node) in section(root, "services") {
            let id = hex_u32(required(node, name, "id")?, &format!("{}.id", name))?;
            let ecc = node
                .child_value("ecc")
                .map(|v| hex_u8(v, &format!("{}.ecc", name)))
                .transpose()?;
            services.push(ServiceDef {
                name: name.to_string(),
                id,
                ecc,
                label: node.child_value("label").map(str::to_string),
            });
        }

        let mut subchannels = Vec::new();
        for (name, node) in section(root, "subchannels") {
            let kind = SubchannelKind::parse(node.child_value("type").unwrap_or(""));
            let bitrate = node
                .child_value("bitrate")
                .map(|v| decimal_u32(v, &format!("{}.bitrate", name)))
                .transpose()?;
            let id = node
                .child_value("id")
                .map(|v| decimal_u8(v, &format!("{}.id", name)))
                .transpose()?;
            let input_uri = node
                .child_value("inputuri")
                .or_else(|| node.child_value("inputfile"))
                .map(str::to_string);
            subchannels.push(Subchannel {
                name: name.to_string(),
                kind,
                bitrate,
                input_uri,
                id,
            });
        }

        let mut components = Vec::new();
        for (name, node) in section(root, "components") {
            let figtype = node
                .child_value("figtype")
                .map(|v| hex_u8(v, &format!("{}.figtype", name)))
                .transpose()?;
            let component_type = node
                .child_value("type")
                .map(|v| decimal_u8(v, &format!("{}.type", name)))
                .transpose()?;
            let address = node
                .child_value("address")
                .map(|v| hex_u16(v, &format!("{}.address", name)))
                .transpose()?;
            components.push(Component {
                name: name.to_string(),
                service: required(node, name, "service")?.to_string(),
                subchannel: node.child_value("subchannel").map(str::to_string),
                figtype,
                component_type,
                address,
            });
        }

        tracing::debug!(
            services = services.len(),
            subchannels = subchannels.len(),
            components = components.len(),
            "parsed multiplex configuration"
        );

        Ok(Self {
            ensemble,
            services,
            subchannels,
            components,
        })
    }

    /// Ensemble ECC, EId, label and short label
    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }

    pub fn subchannel(&self, name: &str) -> Option<&Subchannel> {
        self.subchannels.iter().find(|s| s.name == name)
    }

    /// Components belonging to a service, in file order
    pub fn components_of<'a>(&'a self, service: &'a str) -> impl Iterator<Item = &'a Component> {
        self.components.iter().filter(move |c| c.service == service)
    }
}

/// Entries of a top-level section, one per distinct key. A missing section is empty.
fn section<'a>(root: &'a InfoTree, name: &str) -> Vec<(&'a str, &'a InfoTree)> {
    let Some(node) = root.get(name) else {
        return Vec::new();
    };
    node.keys()
        .into_iter()
        .filter_map(|key| node.get(key).map(|child| (key, child)))
        .collect()
}

fn required<'a>(node: &'a InfoTree, owner: &str, key: &str) -> Result<&'a str> {
    node.child_value(key)
        .ok_or_else(|| MuxConfigError::MissingField(format!("{}.{}", owner, key)))
}

/// Parse a hex number with or without a `0x` prefix
fn parse_hex(value: &str, field: &str) -> Result<u32> {
    let digits = value
        .trim()
        .strip_prefix("0x")
        .or_else(|| value.trim().strip_prefix("0X"))
        .unwrap_or(value.trim());
    u32::from_str_radix(digits, 16).map_err(|_| MuxConfigError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn hex_u32(value: &str, field: &str) -> Result<u32> {
    parse_hex(value, field)
}

fn hex_u16(value: &str, field: &str) -> Result<u16> {
    u16::try_from(parse_hex(value, field)?).map_err(|_| MuxConfigError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn hex_u8(value: &str, field: &str) -> Result<u8> {
    u8::try_from(parse_hex(value, field)?).map_err(|_| MuxConfigError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn decimal_u32(value: &str, field: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| MuxConfigError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        })
}

fn decimal_u8(value: &str, field: &str) -> Result<u8> {
    u8::try_from(decimal_u32(value, field)?).map_err(|_| MuxConfigError::InvalidNumber {
        field: field.to_string(),
        value: value.to_string(),
    })
}
