//! Decoding of payloads that may take one of several shapes.
//!
//! Two resolution strategies are provided, both total and deterministic:
//!
//! - [`FieldDiscriminated`] reads a tag field and hands the payload to the
//!   one variant registered under that tag.
//! - [`TrialOrdered`] tries each success variant in declaration order, then
//!   each error-shaped fallback, and keeps the first that decodes.
//!
//! Neither invents a default: a payload no variant accepts is a
//! [`DecodeError`].

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::value::RawValue;

use crate::DecodeError;

/// Decoder for one payload shape.
pub type DecodeFn<T> = fn(&RawValue) -> Result<T, DecodeError>;

/// Decodes a payload with its `serde` implementation.
pub fn decode_json<T: DeserializeOwned>(raw: &RawValue) -> Result<T, DecodeError> {
    Ok(serde_json::from_str(raw.get())?)
}

/// Something that turns a raw payload into `T`.
pub trait Decode<T> {
    /// Decodes `raw`.
    fn decode(&self, raw: &RawValue) -> Result<T, DecodeError>;
}

impl<T> Decode<T> for DecodeFn<T> {
    fn decode(&self, raw: &RawValue) -> Result<T, DecodeError> { (*self)(raw) }
}

/// A named decoder.
#[derive(Debug)]
pub struct Variant<T: 'static> {
    /// Tag value or label used in diagnostics.
    pub name: &'static str,
    /// Decoder for this shape.
    pub decode: DecodeFn<T>,
}

/// Selects a variant by the string value of one field.
#[derive(Debug)]
pub struct FieldDiscriminated<T: 'static> {
    field: &'static str,
    variants: &'static [Variant<T>],
}

impl<T: 'static> FieldDiscriminated<T> {
    /// Dispatches on `field`; each variant's `name` is the tag it answers to.
    pub const fn new(field: &'static str, variants: &'static [Variant<T>]) -> Self {
        Self { field, variants }
    }

    /// Name of the tag field.
    pub fn field(&self) -> &'static str { self.field }

    fn tag(&self, raw: &RawValue) -> Result<String, DecodeError> {
        let fields: HashMap<String, Box<RawValue>> = serde_json::from_str(raw.get())
            .map_err(|_| DecodeError::new(format!("expected an object carrying {:?}", self.field)))?;
        let tag = fields
            .get(self.field)
            .ok_or_else(|| DecodeError::new(format!("missing discriminator {:?}", self.field)))?;
        serde_json::from_str::<String>(tag.get()).map_err(|_| {
            DecodeError::new(format!("discriminator {:?} is not a string: {}", self.field, tag.get()))
        })
    }
}

impl<T: 'static> Decode<T> for FieldDiscriminated<T> {
    fn decode(&self, raw: &RawValue) -> Result<T, DecodeError> {
        let tag = self.tag(raw)?;
        let variant = self.variants.iter().find(|v| v.name == tag).ok_or_else(|| {
            DecodeError::new(format!("unknown {} {:?}", self.field, tag))
        })?;
        (variant.decode)(raw)
            .map_err(|e| DecodeError::new(format!("{} {:?}: {}", self.field, tag, e)))
    }
}

/// Tries variants in a fixed order.
#[derive(Debug)]
pub struct TrialOrdered<T: 'static> {
    variants: &'static [Variant<T>],
    fallbacks: &'static [Variant<T>],
}

impl<T: 'static> TrialOrdered<T> {
    /// Success variants only.
    pub const fn new(variants: &'static [Variant<T>]) -> Self { Self { variants, fallbacks: &[] } }

    /// Adds error-shaped fallbacks, tried after every success variant.
    pub const fn with_fallbacks(self, fallbacks: &'static [Variant<T>]) -> Self {
        Self { variants: self.variants, fallbacks }
    }
}

impl<T: 'static> Decode<T> for TrialOrdered<T> {
    fn decode(&self, raw: &RawValue) -> Result<T, DecodeError> {
        let mut attempts = Vec::new();
        for variant in self.variants.iter().chain(self.fallbacks) {
            match (variant.decode)(raw) {
                Ok(value) => return Ok(value),
                Err(e) => attempts.push(format!("{}: {}", variant.name, e)),
            }
        }
        Err(DecodeError::new(format!("no variant matched ({})", attempts.join("; "))))
    }
}
