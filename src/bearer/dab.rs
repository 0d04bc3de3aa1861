// DAB service bearer
//
// A DAB bearer is written as `dab:<gcc>.<eid>.<sid>.<scids>[.<xpad>]` in
// hex, e.g. `dab:ce1.ce15.c221.0`. The global country code (`gcc`) joins
// the country-code nibble of the SId with the extended country code.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum BearerError {
    #[error("bearer '{0}' is not a DAB bearer URI")]
    InvalidFormat(String),

    #[error("bearer '{uri}': global country code {gcc:03x} does not match SId {sid:x}")]
    CountryMismatch { uri: String, gcc: u16, sid: u32 },
}

pub type Result<T> = std::result::Result<T, BearerError>;

lazy_static::lazy_static! {
    static ref DAB_URI: regex::Regex = regex::Regex::new(
        r"^dab:([0-9a-fA-F]{3})\.([0-9a-fA-F]{4})\.([0-9a-fA-F]{8}|[0-9a-fA-F]{4})\.([0-9a-fA-F])(?:\.([0-9a-fA-F]{1,4}))?$"
    )
    .expect("DAB bearer pattern is valid");
}

/// Largest SId that is still a short (16-bit) programme service id
pub const SHORT_SID_MAX: u32 = 0xFFFF;

/// A DAB service bearer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DabBearer {
    /// Extended Country Code
    pub ecc: u8,
    /// Ensemble Id
    pub eid: u16,
    /// Service Id (16-bit, or 32-bit for data services carrying the ECC)
    pub sid: u32,
    /// Service component id within the service
    pub scids: u8,
    /// X-PAD user application type
    pub xpad: Option<u16>,
}

impl DabBearer {
    pub fn new(ecc: u8, eid: u16, sid: u32) -> Self {
        Self {
            ecc,
            eid,
            sid,
            scids: 0,
            xpad: None,
        }
    }

    pub fn with_scids(mut self, scids: u8) -> Self {
        self.scids = scids;
        self
    }

    pub fn with_xpad(mut self, xpad: u16) -> Self {
        self.xpad = Some(xpad);
        self
    }

    /// Whether the SId is a 32-bit id that embeds its own ECC
    pub fn is_long_sid(&self) -> bool {
        self.sid > SHORT_SID_MAX
    }

    /// Global country code: country nibble of the SId followed by the ECC
    pub fn gcc(&self) -> u16 {
        if self.is_long_sid() {
            (((self.sid >> 12) & 0xF00) + (self.sid >> 24)) as u16
        } else {
            (((self.sid >> 4) & 0xF00) as u16) + self.ecc as u16
        }
    }

    /// SId as 4 hex digits, or 8 for a long SId
    fn sid_hex(&self) -> String {
        if self.is_long_sid() {
            format!("{:08x}", self.sid)
        } else {
            format!("{:04x}", self.sid)
        }
    }

    /// Name to query for this bearer under a RadioDNS root domain
    ///
    /// `[<xpad>.]<scids>.<sid>.<eid>.<gcc>.dab.<root>`
    pub fn radiodns_fqdn(&self, root: &str) -> String {
        let mut fqdn = String::new();
        if let Some(xpad) = self.xpad {
            fqdn.push_str(&format!("{:x}.", xpad));
        }
        fqdn.push_str(&format!(
            "{:x}.{}.{:04x}.{:03x}.dab.{}",
            self.scids,
            self.sid_hex(),
            self.eid,
            self.gcc(),
            root.trim_end_matches('.')
        ));
        fqdn
    }
}

impl fmt::Display for DabBearer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dab:{:03x}.{:04x}.{}.{:x}",
            self.gcc(),
            self.eid,
            self.sid_hex(),
            self.scids
        )?;
        if let Some(xpad) = self.xpad {
            write!(f, ".{:04x}", xpad)?;
        }
        Ok(())
    }
}

impl FromStr for DabBearer {
    type Err = BearerError;

    fn from_str(s: &str) -> Result<Self> {
        let caps = DAB_URI
            .captures(s)
            .ok_or_else(|| BearerError::InvalidFormat(s.to_string()))?;

        // Every group is a bounded run of hex digits, so these cannot overflow
        let hex = |idx: usize| -> Result<u32> {
            let group = caps
                .get(idx)
                .ok_or_else(|| BearerError::InvalidFormat(s.to_string()))?;
            u32::from_str_radix(group.as_str(), 16)
                .map_err(|_| BearerError::InvalidFormat(s.to_string()))
        };

        let gcc = hex(1)? as u16;
        let mut bearer = DabBearer {
            ecc: (gcc & 0xFF) as u8,
            eid: hex(2)? as u16,
            sid: hex(3)?,
            scids: hex(4)? as u8,
            xpad: None,
        };
        if caps.get(5).is_some() {
            bearer.xpad = Some(hex(5)? as u16);
        }

        if bearer.gcc() != gcc {
            return Err(BearerError::CountryMismatch {
                uri: s.to_string(),
                gcc,
                sid: bearer.sid,
            });
        }

        Ok(bearer)
    }
}

impl Serialize for DabBearer {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DabBearer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
