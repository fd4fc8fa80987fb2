//! Type definitions for provkit

pub mod certificate;
pub mod error;
pub mod settings;
pub mod thing_name;

pub use certificate::Certificate;
pub use error::{Error, Result};
pub use settings::DeviceSettings;
pub use thing_name::ThingName;
