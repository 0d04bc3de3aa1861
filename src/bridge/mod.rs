// Matching multiplex services against their RadioDNS registrations
pub mod services;
pub mod warnings;

pub use services::{
    epg_services, resolve_services, slideshow_services, EpgService, Report, ResolvedService,
    SlideshowService,
};
pub use warnings::{check_warnings, ConfigWarning};
