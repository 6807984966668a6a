//! MODFLOW-2005 file formats.
//!
//! The simulator's on-disk interface: a free-format input deck
//! ([`write`]) and binary head/budget output artifacts ([`binary`]).
//! This module is a reader/writer of those externally defined formats,
//! not their definition.

pub mod binary;
pub(crate) mod write;

/// Fortran unit numbers used consistently across the input deck.
pub(crate) mod units {
    pub const LIST: u32 = 2;
    pub const DIS: u32 = 11;
    pub const BAS: u32 = 13;
    pub const OC: u32 = 14;
    pub const LPF: u32 = 15;
    pub const RCH: u32 = 18;
    pub const PCG: u32 = 27;
    pub const HEAD: u32 = 51;
    pub const BUDGET: u32 = 53;
}
