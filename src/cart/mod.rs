//! Messages posted to the parent storefront window.

use crate::config::{Configuration, Rgb};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CartProperties {
    pub fletch: String,
    pub vane_primary: Rgb,
    pub vane_secondary: Rgb,
    pub nock: Rgb,
    pub wrap: Rgb,
}

impl From<&Configuration> for CartProperties {
    fn from(config: &Configuration) -> Self {
        Self {
            fletch: config.fletch_count.label().to_string(),
            vane_primary: config.primary_vane_color,
            vane_secondary: config.secondary_vane_color,
            nock: config.nock_color,
            wrap: config.wrap_color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type")]
pub enum HostMessage {
    #[serde(rename = "ADD_TO_CART")]
    AddToCart {
        #[serde(rename = "variantId")]
        variant_id: String,
        quantity: u32,
        properties: CartProperties,
    },
    #[serde(rename = "RESIZE")]
    Resize { height: u32 },
}

/// A message plus the only origin allowed to receive it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Envelope {
    pub target_origin: String,
    pub message: HostMessage,
}

pub fn add_to_cart(variant_id: &str, config: &Configuration) -> HostMessage {
    if variant_id.is_empty() {
        log::warn!("Building cart message with an empty variant id");
    }
    HostMessage::AddToCart {
        variant_id: variant_id.to_string(),
        quantity: 1,
        properties: CartProperties::from(config),
    }
}

pub fn resize(height: u32) -> HostMessage {
    HostMessage::Resize { height }
}

impl Envelope {
    pub fn new(target_origin: &str, message: HostMessage) -> Self {
        Self {
            target_origin: target_origin.to_string(),
            message,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
