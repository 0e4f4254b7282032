pub mod astromatic;
pub mod cfht;
pub mod error;
pub mod fits;
pub mod paths;
pub mod spitzer;
pub mod template;
pub mod wiyn;

pub use error::{Error, Result};
pub use template::ParamTemplate;
pub use wiyn::MosaicLayout;
