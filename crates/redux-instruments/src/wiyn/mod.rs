//! WIYN One Degree Imager (ODI).

pub mod facts;
pub mod layout;
pub mod skeleton;

pub use facts::Generation;
pub use layout::MosaicLayout;
