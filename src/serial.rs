//! Binary snapshots of compiled pricing engines.
//!
//! A snapshot holds the compiled rule list and the [`EngineConfig`] it was
//! built against, so a service can skip rule-file parsing on startup. The
//! format is a 32-byte fixed header followed by a bincode-encoded payload.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"TRFS"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! The format version must match exactly. The engine version is
//! informational only.
//!
//! Decimals travel as `(mantissa, scale)` pairs because bincode is not a
//! self-describing format.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::engine::PricingEngine;
use crate::types::{
    Adjustment, AdjustmentKind, Condition, DisplayTier, FieldPath, Operator, PricingRule,
    RuleVariant, SegmentTable, Value, VolumeTier, VolumeTiers,
};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"TRFS";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when writing an engine snapshot.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode engine snapshot: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when reading an engine snapshot.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not a tariff snapshot: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized type hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SerializedEngine {
    metadata: SnapshotMetadata,
    rules: Vec<SerializedRule>,
    config: SerializedConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotMetadata {
    rule_count: usize,
    source_digest: Option<[u8; 32]>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRule {
    id: Option<i64>,
    name: String,
    priority: i64,
    exclusive: bool,
    conditions: Vec<SerializedCondition>,
    variant: SerializedVariant,
}

/// Built-in variants carry no table; it is restored from the snapshot config.
#[derive(Debug, Serialize, Deserialize)]
enum SerializedVariant {
    Volume,
    CustomerSegment,
    Generic(Option<SerializedAdjustment>),
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedAdjustment {
    kind: String,
    amount: SerializedDecimal,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedCondition {
    field: SerializedField,
    operator: String,
    value: SerializedValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum SerializedField {
    ProductId,
    ProductCategoryId,
    ProductBrandId,
    ProductPrice,
    CustomerId,
    CustomerGroupId,
    CustomerGroupCode,
    Quantity,
    Extension(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum SerializedValue {
    Bool(bool),
    Int(i64),
    Str(String),
    Decimal(SerializedDecimal),
    List(Vec<SerializedValue>),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct SerializedDecimal {
    mantissa: i128,
    scale: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct SerializedConfig {
    volume_tiers: Vec<(u32, Option<u32>, SerializedDecimal)>,
    segment_discounts: Vec<(String, SerializedDecimal)>,
    display_tiers: Vec<(String, u32, Option<u32>)>,
}

// ---------------------------------------------------------------------------
// Scalar conversion
// ---------------------------------------------------------------------------

fn serialize_decimal(value: Decimal) -> SerializedDecimal {
    SerializedDecimal {
        mantissa: value.mantissa(),
        scale: value.scale(),
    }
}

fn deserialize_decimal(value: SerializedDecimal) -> Result<Decimal, DeserializeError> {
    Decimal::try_from_i128_with_scale(value.mantissa, value.scale).map_err(|e| {
        DeserializeError::Validation(format!(
            "decimal {}e-{} out of range: {e}",
            value.mantissa, value.scale
        ))
    })
}

fn serialize_field(field: &FieldPath) -> SerializedField {
    match field {
        FieldPath::ProductId => SerializedField::ProductId,
        FieldPath::ProductCategoryId => SerializedField::ProductCategoryId,
        FieldPath::ProductBrandId => SerializedField::ProductBrandId,
        FieldPath::ProductPrice => SerializedField::ProductPrice,
        FieldPath::CustomerId => SerializedField::CustomerId,
        FieldPath::CustomerGroupId => SerializedField::CustomerGroupId,
        FieldPath::CustomerGroupCode => SerializedField::CustomerGroupCode,
        FieldPath::Quantity => SerializedField::Quantity,
        FieldPath::Extension(key) => SerializedField::Extension(key.clone()),
    }
}

fn deserialize_field(field: SerializedField) -> FieldPath {
    match field {
        SerializedField::ProductId => FieldPath::ProductId,
        SerializedField::ProductCategoryId => FieldPath::ProductCategoryId,
        SerializedField::ProductBrandId => FieldPath::ProductBrandId,
        SerializedField::ProductPrice => FieldPath::ProductPrice,
        SerializedField::CustomerId => FieldPath::CustomerId,
        SerializedField::CustomerGroupId => FieldPath::CustomerGroupId,
        SerializedField::CustomerGroupCode => FieldPath::CustomerGroupCode,
        SerializedField::Quantity => FieldPath::Quantity,
        SerializedField::Extension(key) => FieldPath::Extension(key),
    }
}

fn serialize_value(value: &Value) -> SerializedValue {
    match value {
        Value::Bool(v) => SerializedValue::Bool(*v),
        Value::Int(v) => SerializedValue::Int(*v),
        Value::String(v) => SerializedValue::Str(v.clone()),
        Value::Decimal(v) => SerializedValue::Decimal(serialize_decimal(*v)),
        Value::List(items) => SerializedValue::List(items.iter().map(serialize_value).collect()),
    }
}

fn deserialize_value(value: SerializedValue) -> Result<Value, DeserializeError> {
    Ok(match value {
        SerializedValue::Bool(v) => Value::Bool(v),
        SerializedValue::Int(v) => Value::Int(v),
        SerializedValue::Str(v) => Value::String(v),
        SerializedValue::Decimal(v) => Value::Decimal(deserialize_decimal(v)?),
        SerializedValue::List(items) => Value::List(
            items
                .into_iter()
                .map(deserialize_value)
                .collect::<Result<_, _>>()?,
        ),
    })
}

fn serialize_adjustment(adjustment: &Adjustment) -> SerializedAdjustment {
    SerializedAdjustment {
        kind: adjustment.kind.as_str().to_owned(),
        amount: serialize_decimal(adjustment.amount),
    }
}

fn deserialize_adjustment(adjustment: SerializedAdjustment) -> Result<Adjustment, DeserializeError> {
    Ok(Adjustment::new(
        AdjustmentKind::from_name(&adjustment.kind),
        deserialize_decimal(adjustment.amount)?,
    ))
}

// ---------------------------------------------------------------------------
// PricingEngine -> SerializedEngine
// ---------------------------------------------------------------------------

fn serialize_rule(rule: &PricingRule) -> SerializedRule {
    let variant = match &rule.variant {
        RuleVariant::Volume(_) => SerializedVariant::Volume,
        RuleVariant::CustomerSegment(_) => SerializedVariant::CustomerSegment,
        RuleVariant::Generic(adjustment) => {
            SerializedVariant::Generic(adjustment.as_ref().map(serialize_adjustment))
        }
    };
    SerializedRule {
        id: rule.id,
        name: rule.name.clone(),
        priority: rule.priority,
        exclusive: rule.exclusive,
        conditions: rule
            .conditions
            .iter()
            .map(|c| SerializedCondition {
                field: serialize_field(&c.field),
                operator: c.operator.as_str().to_owned(),
                value: serialize_value(&c.value),
            })
            .collect(),
        variant,
    }
}

fn serialize_config(config: &EngineConfig) -> SerializedConfig {
    SerializedConfig {
        volume_tiers: config
            .volume_tiers
            .as_slice()
            .iter()
            .map(|t| (t.min, t.max, serialize_decimal(t.percentage)))
            .collect(),
        segment_discounts: config
            .segment_discounts
            .iter()
            .map(|(code, pct)| (code.to_owned(), serialize_decimal(pct)))
            .collect(),
        display_tiers: config
            .display_tiers
            .iter()
            .map(|t| (t.label.clone(), t.min, t.max))
            .collect(),
    }
}

fn engine_to_serialized(engine: &PricingEngine, source_text: Option<&str>) -> SerializedEngine {
    SerializedEngine {
        metadata: SnapshotMetadata {
            rule_count: engine.rules.len(),
            source_digest: source_text.map(|s| *blake3::hash(s.as_bytes()).as_bytes()),
        },
        rules: engine.rules.iter().map(serialize_rule).collect(),
        config: serialize_config(&engine.config),
    }
}

// ---------------------------------------------------------------------------
// SerializedEngine -> PricingEngine
// ---------------------------------------------------------------------------

fn deserialize_config(ser: SerializedConfig) -> Result<EngineConfig, DeserializeError> {
    let volume_tiers = ser
        .volume_tiers
        .into_iter()
        .map(|(min, max, pct)| Ok(VolumeTier::new(min, max, deserialize_decimal(pct)?)))
        .collect::<Result<Vec<_>, DeserializeError>>()?;
    let segment_discounts = ser
        .segment_discounts
        .into_iter()
        .map(|(code, pct)| Ok((code, deserialize_decimal(pct)?)))
        .collect::<Result<_, DeserializeError>>()?;
    let display_tiers = ser
        .display_tiers
        .into_iter()
        .map(|(label, min, max)| DisplayTier::new(&label, min, max))
        .collect();

    Ok(EngineConfig {
        volume_tiers: VolumeTiers::new(volume_tiers),
        segment_discounts: SegmentTable::new(segment_discounts),
        display_tiers,
    })
}

fn deserialize_rule(
    ser: SerializedRule,
    config: &EngineConfig,
) -> Result<PricingRule, DeserializeError> {
    let variant = match ser.variant {
        SerializedVariant::Volume => RuleVariant::Volume(config.volume_tiers.clone()),
        SerializedVariant::CustomerSegment => {
            RuleVariant::CustomerSegment(config.segment_discounts.clone())
        }
        SerializedVariant::Generic(adjustment) => {
            RuleVariant::Generic(adjustment.map(deserialize_adjustment).transpose()?)
        }
    };
    let conditions = ser
        .conditions
        .into_iter()
        .map(|c| {
            Ok(Condition {
                field: deserialize_field(c.field),
                operator: Operator::from_name(&c.operator),
                value: deserialize_value(c.value)?,
            })
        })
        .collect::<Result<Vec<_>, DeserializeError>>()?;

    Ok(PricingRule {
        id: ser.id,
        name: ser.name,
        priority: ser.priority,
        exclusive: ser.exclusive,
        enabled: true,
        conditions,
        variant,
    })
}

fn serialized_to_engine(ser: SerializedEngine) -> Result<PricingEngine, DeserializeError> {
    validate(&ser)?;

    let config = deserialize_config(ser.config)?;
    config
        .validate()
        .map_err(|e| DeserializeError::Validation(e.to_string()))?;

    let rules = ser
        .rules
        .into_iter()
        .map(|r| deserialize_rule(r, &config))
        .collect::<Result<Vec<_>, DeserializeError>>()?;

    Ok(PricingEngine { rules, config })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(ser: &SerializedEngine) -> Result<(), DeserializeError> {
    if ser.metadata.rule_count != ser.rules.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} rules but payload has {}",
            ser.metadata.rule_count,
            ser.rules.len()
        )));
    }

    for window in ser.rules.windows(2) {
        if window[0].priority < window[1].priority {
            return Err(DeserializeError::Validation(format!(
                "rule '{}' (priority {}) precedes higher priority rule '{}' ({})",
                window[0].name, window[0].priority, window[1].name, window[1].priority
            )));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) {
    let hash = blake3::hash(payload);
    let hash_bytes = hash.as_bytes();

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags (reserved)
    #[allow(clippy::cast_possible_truncation)] // payload will never exceed 4 GiB
    let payload_len = payload.len() as u32;
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash_bytes[..16]);
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32, always fits in u32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }

    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    // bytes[6..8] engine version, bytes[8..12] flags
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

/// Check the header and checksum, then decode the payload.
fn decode_payload(bytes: &[u8]) -> Result<SerializedEngine, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_end = HEADER_SIZE + payload_len as usize;
    if bytes.len() != payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[HEADER_SIZE..payload_end];

    let computed_hash = blake3::hash(payload);
    if computed_hash.as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (serialized, _): (SerializedEngine, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    Ok(serialized)
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(
    engine: &PricingEngine,
    source_text: Option<&str>,
) -> Result<Vec<u8>, SerializeError> {
    let serialized = engine_to_serialized(engine, source_text);
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload);
    buf.extend_from_slice(&payload);
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<PricingEngine, DeserializeError> {
    serialized_to_engine(decode_payload(bytes)?)
}

/// Whether a snapshot was built from exactly this source text.
///
/// Returns `false` for snapshots written without a source digest and for
/// blobs that fail the header or checksum checks.
#[must_use]
pub fn snapshot_is_fresh(bytes: &[u8], source_text: &str) -> bool {
    let Ok(serialized) = decode_payload(bytes) else {
        return false;
    };
    serialized.metadata.source_digest == Some(*blake3::hash(source_text.as_bytes()).as_bytes())
}

impl PricingEngine {
    /// Serialize this engine to a byte vector.
    ///
    /// The optional `source_text` is hashed (BLAKE3) and embedded in the
    /// snapshot so [`snapshot_is_fresh`] can tell when the rule file changed.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`] if encoding fails.
    pub fn to_bytes(&self, source_text: Option<&str>) -> Result<Vec<u8>, SerializeError> {
        encode(self, source_text)
    }

    /// Restore an engine from bytes produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`] on format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DeserializeError> {
        decode(bytes)
    }

    /// Serialize this engine and write it to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`] on encoding or I/O failure.
    pub fn to_binary_file(
        &self,
        path: impl AsRef<std::path::Path>,
        source_text: Option<&str>,
    ) -> Result<(), SerializeError> {
        let bytes = self.to_bytes(source_text)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`] on I/O, format, integrity, or validation failure.
    pub fn from_binary_file(path: impl AsRef<std::path::Path>) -> Result<Self, DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_keeps_scale() {
        let value = Decimal::new(1050, 2);
        let restored = deserialize_decimal(serialize_decimal(value)).unwrap();
        assert_eq!(restored, value);
        assert_eq!(restored.scale(), 2);
    }

    #[test]
    fn decimal_out_of_range_rejected() {
        let bad = SerializedDecimal {
            mantissa: 1,
            scale: 99,
        };
        assert!(matches!(
            deserialize_decimal(bad),
            Err(DeserializeError::Validation(_))
        ));
    }

    #[test]
    fn extension_field_does_not_collapse_into_builtin() {
        let field = FieldPath::Extension("quantity".into());
        assert_eq!(deserialize_field(serialize_field(&field)), field);
    }

    #[test]
    fn nested_list_value() {
        let value = Value::List(vec![
            Value::Int(1),
            Value::List(vec![Value::Decimal(Decimal::new(5, 1))]),
        ]);
        assert_eq!(deserialize_value(serialize_value(&value)).unwrap(), value);
    }

    #[test]
    fn unknown_adjustment_kind_survives() {
        let adjustment = Adjustment::new(AdjustmentKind::Unknown("halve".into()), Decimal::ONE);
        let restored = deserialize_adjustment(serialize_adjustment(&adjustment)).unwrap();
        assert_eq!(restored, adjustment);
    }

    // -- Header --

    #[test]
    fn header_round_trip() {
        let payload = b"test payload data";
        let mut buf = Vec::new();
        write_header(&mut buf, payload);
        assert_eq!(buf.len(), HEADER_SIZE);

        let (format_version, payload_len, hash) = read_header(&buf).unwrap();
        assert_eq!(format_version, FORMAT_VERSION);
        assert_eq!(payload_len as usize, payload.len());
        assert_eq!(&hash, &blake3::hash(payload).as_bytes()[..16]);
    }

    #[test]
    fn header_bad_magic() {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(b"BAAD");
        assert!(matches!(read_header(&buf), Err(DeserializeError::BadMagic)));
    }

    #[test]
    fn header_too_short() {
        let buf = vec![0u8; 10];
        assert!(matches!(
            read_header(&buf),
            Err(DeserializeError::LengthMismatch { .. })
        ));
    }

    // -- Validation --

    fn serialized_rule(name: &str, priority: i64) -> SerializedRule {
        SerializedRule {
            id: None,
            name: name.into(),
            priority,
            exclusive: false,
            conditions: vec![],
            variant: SerializedVariant::Generic(None),
        }
    }

    fn serialized(rules: Vec<SerializedRule>, rule_count: usize) -> SerializedEngine {
        SerializedEngine {
            metadata: SnapshotMetadata {
                rule_count,
                source_digest: None,
            },
            rules,
            config: serialize_config(&EngineConfig::default()),
        }
    }

    #[test]
    fn validate_rule_count() {
        let ser = serialized(vec![serialized_rule("a", 1)], 2);
        assert!(matches!(validate(&ser), Err(DeserializeError::Validation(_))));
    }

    #[test]
    fn validate_priority_order() {
        let ser = serialized(vec![serialized_rule("low", 1), serialized_rule("high", 5)], 2);
        assert!(matches!(validate(&ser), Err(DeserializeError::Validation(_))));

        let ok = serialized(vec![serialized_rule("high", 5), serialized_rule("low", 1)], 2);
        assert!(validate(&ok).is_ok());
    }

    #[test]
    fn invalid_config_rejected() {
        let mut ser = serialized(vec![], 0);
        ser.config.volume_tiers.clear();
        assert!(matches!(
            serialized_to_engine(ser),
            Err(DeserializeError::Validation(_))
        ));
    }
}
