//! # provkit-tools
//!
//! Operator utilities around the STM32 provisioning workflow: broker
//! housekeeping, Home Assistant discovery, a fleet-provisioning mock and a
//! TCP echo pair for connectivity checks. The binaries in `src/bin` are thin
//! wrappers over these modules.

pub mod broker;
pub mod discovery;
pub mod echo;
pub mod logging;
pub mod provisioning;
pub mod retained;

pub use broker::{BrokerArgs, BrokerConfig, MqttClient, Publisher};
