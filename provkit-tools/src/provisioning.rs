//! Stand-in for the AWS IoT fleet-provisioning CBOR API
//!
//! The device publishes a CSR to the create-certificate topic and later a
//! register request to the template topic; the mock answers each on the
//! matching `/accepted` topic.

use std::collections::BTreeMap;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

/// Provisioning template the firmware registers against
pub const DEFAULT_TEMPLATE: &str = "STM32_FP_Template";

/// Create-certificate request topic
pub const CREATE_CERTIFICATE_TOPIC: &str = "aws/certificates/create-from-csr/cbor";

const ACCEPTED_SUFFIX: &str = "/accepted";

const CANNED_CERTIFICATE: &str = include_str!("../fixtures/create_certificate_accepted.json");

/// Body of a create-certificate acceptance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCertificateResponse {
    pub certificate_pem: String,
    pub certificate_id: String,
    pub certificate_ownership_token: String,
}

impl CreateCertificateResponse {
    /// The response shipped in `fixtures/`
    pub fn canned() -> Result<Self> {
        serde_json::from_str(CANNED_CERTIFICATE).context("parsing canned certificate fixture")
    }
}

/// Body of a register-thing acceptance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterThingResponse {
    pub device_configuration: BTreeMap<String, String>,
    pub thing_name: String,
}

/// Register request topic for a provisioning template
pub fn register_topic(template: &str) -> String {
    format!("aws/provisioning-templates/{template}/provision/cbor")
}

/// Acceptance topic paired with a request topic
pub fn accepted_topic(request_topic: &str) -> String {
    format!("{request_topic}{ACCEPTED_SUFFIX}")
}

/// CBOR-encode a response body
pub fn encode_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ciborium::into_writer(value, &mut out).map_err(|e| anyhow!("CBOR encoding failed: {}", e))?;
    Ok(out)
}

/// Human-readable rendering of a CBOR payload for logs
///
/// Payloads that do not decode are described rather than rejected.
pub fn describe_payload(payload: &[u8]) -> String {
    match ciborium::from_reader::<ciborium::Value, _>(payload) {
        Ok(value) => format!("{:?}", value),
        Err(e) => format!("<{} bytes, not CBOR: {}>", payload.len(), e),
    }
}

/// Decides what to publish in answer to each request
#[derive(Debug, Clone)]
pub struct ProvisioningMock {
    register_topic: String,
    thing_name: Option<String>,
    certificate: CreateCertificateResponse,
}

impl ProvisioningMock {
    pub fn new(certificate: CreateCertificateResponse) -> Self {
        Self {
            register_topic: register_topic(DEFAULT_TEMPLATE),
            thing_name: None,
            certificate,
        }
    }

    pub fn with_template(mut self, template: &str) -> Self {
        self.register_topic = register_topic(template);
        self
    }

    /// Answer register requests with this thing name
    pub fn with_thing_name(mut self, thing_name: impl Into<String>) -> Self {
        self.thing_name = Some(thing_name.into());
        self
    }

    /// Request topics to subscribe to
    pub fn subscriptions(&self) -> [&str; 2] {
        [CREATE_CERTIFICATE_TOPIC, self.register_topic.as_str()]
    }

    /// Reply for a request, as `(topic, payload)`
    ///
    /// Returns `None` for topics the mock does not answer, and for register
    /// requests when no thing name is configured.
    pub fn respond(&self, topic: &str) -> Result<Option<(String, Vec<u8>)>> {
        if topic == CREATE_CERTIFICATE_TOPIC {
            let payload = encode_cbor(&self.certificate)?;
            return Ok(Some((accepted_topic(topic), payload)));
        }

        if topic == self.register_topic {
            let Some(thing_name) = &self.thing_name else {
                return Ok(None);
            };
            let response = RegisterThingResponse {
                device_configuration: BTreeMap::new(),
                thing_name: thing_name.clone(),
            };
            return Ok(Some((accepted_topic(topic), encode_cbor(&response)?)));
        }

        Ok(None)
    }
}
