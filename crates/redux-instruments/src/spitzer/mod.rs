//! Spitzer IRAC/MIPS data discovery and MOPEX job preparation.

pub mod bcd;
pub mod mopex;

pub use bcd::{Band, BcdKind, BcdLists, Instrument, PbcdKind, SpitzerBcd, SpitzerObs};
pub use mopex::{ExtraList, MopexConf};
