// ODR-DabMux multiplex configuration
pub mod config;
pub mod service;

pub use config::{
    Component, Ensemble, MuxConfig, MuxConfigError, Result, ServiceDef, Subchannel,
    SubchannelKind,
};
pub use service::{EpgPacket, MuxService};
