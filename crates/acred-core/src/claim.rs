//! # Claims and Attribute Paths
//!
//! A [`Claim`] is the attribute set a claimer asks an issuer to attest. It is
//! a non-empty JSON object whose leaves are strings, integers, booleans,
//! null, or arrays of those. Nested objects are addressed with dotted
//! attribute paths: in `{"contents": {"age": 30}}` the path `contents.age`
//! names the value `30`.
//!
//! ## Security Invariant
//!
//! Validation runs on every construction path, including deserialization,
//! so a `Claim` that exists is always canonicalizable. Its digest binds the
//! issuer's signature to exactly these attributes.
//!
//! Attribute names are unique at every level. Deserialization rejects a
//! repeated key instead of keeping the last value.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::canonical::CanonicalBytes;
use crate::digest::{sha256_digest, ContentDigest};
use crate::error::{ClaimerError, MessageKind, ValidationError};

/// Separator between nested attribute names.
pub const PATH_SEPARATOR: char = '.';

/// A validated attribute claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "Value")]
pub struct Claim {
    attributes: Map<String, Value>,
    canonical: CanonicalBytes,
}

impl Claim {
    /// Validate a JSON value as a claim.
    pub fn new(value: Value) -> Result<Self, ValidationError> {
        let map = match value {
            Value::Object(map) => map,
            other => return Err(ValidationError::NotAnObject(json_type_name(&other))),
        };
        if map.is_empty() {
            return Err(ValidationError::EmptyClaim);
        }
        validate_names(&map)?;
        let canonical = CanonicalBytes::from_value(Value::Object(map.clone()))?;
        Ok(Self {
            attributes: map,
            canonical,
        })
    }

    /// Decode a claim from JSON text. Syntax errors and repeated keys are
    /// malformed messages; a well-formed value that is not a valid claim is
    /// an invalid claim.
    pub fn from_json(text: &str) -> Result<Self, ClaimerError> {
        let UniqueKeys(value) = serde_json::from_str(text)
            .map_err(|e| ClaimerError::malformed(MessageKind::Claim, e.to_string()))?;
        Self::new(value).map_err(ClaimerError::InvalidClaim)
    }

    /// Look up an attribute by dotted path.
    pub fn attribute(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split(PATH_SEPARATOR);
        let first = segments.next()?;
        let mut current = self.attributes.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Every leaf attribute path, in sorted order.
    pub fn attribute_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_paths(&self.attributes, "", &mut out);
        out
    }

    /// Number of top-level attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Always false for a validated claim.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// The claim as a JSON object.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Canonical encoding of the claim.
    pub fn canonical_bytes(&self) -> &CanonicalBytes {
        &self.canonical
    }

    /// SHA-256 digest of the canonical encoding.
    pub fn digest(&self) -> ContentDigest {
        sha256_digest(&self.canonical)
    }
}

impl TryFrom<Value> for Claim {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Claim {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let UniqueKeys(value) = UniqueKeys::deserialize(deserializer)?;
        Self::new(value).map_err(de::Error::custom)
    }
}

/// A JSON value whose objects never repeat a key.
struct UniqueKeys(Value);

impl<'de> Deserialize<'de> for UniqueKeys {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(UniqueKeysVisitor).map(UniqueKeys)
    }
}

struct UniqueKeysVisitor;

impl<'de> Visitor<'de> for UniqueKeysVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Value, E> {
        Ok(Value::Number(v.into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Number::from_f64(v)
            .map(Value::Number)
            .ok_or_else(|| E::custom("non-finite number"))
    }

    fn visit_str<E>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Value, D::Error> {
        UniqueKeys::deserialize(d).map(|v| v.0)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(UniqueKeys(item)) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = Map::new();
        while let Some(key) = access.next_key::<String>()? {
            let UniqueKeys(value) = access.next_value()?;
            if map.contains_key(&key) {
                return Err(de::Error::custom(format!("duplicate attribute \"{key}\"")));
            }
            map.insert(key, value);
        }
        Ok(Value::Object(map))
    }
}

impl From<Claim> for Value {
    fn from(claim: Claim) -> Self {
        Value::Object(claim.attributes)
    }
}

fn validate_names(map: &Map<String, Value>) -> Result<(), ValidationError> {
    for (name, value) in map {
        if name.is_empty() || name.contains(PATH_SEPARATOR) {
            return Err(ValidationError::InvalidAttributeName(name.clone()));
        }
        if let Value::Object(nested) = value {
            validate_names(nested)?;
        }
    }
    Ok(())
}

fn collect_paths(map: &Map<String, Value>, prefix: &str, out: &mut Vec<String>) {
    for (name, value) in map {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}{PATH_SEPARATOR}{name}")
        };
        match value {
            Value::Object(nested) if !nested.is_empty() => collect_paths(nested, &path, out),
            _ => out.push(path),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn flat_claim_is_accepted() {
        let claim = Claim::new(json!({"age": "30", "name": "alice"})).unwrap();
        assert_eq!(claim.len(), 2);
        assert_eq!(claim.attribute("age"), Some(&json!("30")));
    }

    #[test]
    fn empty_object_is_rejected() {
        assert!(matches!(
            Claim::new(json!({})),
            Err(ValidationError::EmptyClaim)
        ));
    }

    #[test]
    fn non_object_is_rejected() {
        let err = Claim::new(json!(["age"])).unwrap_err();
        assert!(matches!(err, ValidationError::NotAnObject("array")));
        let err = Claim::new(json!("age")).unwrap_err();
        assert!(matches!(err, ValidationError::NotAnObject("string")));
    }

    #[test]
    fn floats_are_rejected() {
        let err = Claim::new(json!({"height": 1.82})).unwrap_err();
        assert!(matches!(err, ValidationError::Canonicalization(_)));
    }

    #[test]
    fn dotted_names_are_rejected() {
        let err = Claim::new(json!({"contents": {"a.b": 1}})).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidAttributeName(n) if n == "a.b"));
        let err = Claim::new(json!({"": 1})).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidAttributeName(_)));
    }

    #[test]
    fn nested_lookup_by_path() {
        let claim = Claim::new(json!({
            "contents": {"age": 30, "address": {"city": "Berlin"}},
            "ctype": "kyc"
        }))
        .unwrap();
        assert_eq!(claim.attribute("contents.age"), Some(&json!(30)));
        assert_eq!(
            claim.attribute("contents.address.city"),
            Some(&json!("Berlin"))
        );
        assert_eq!(claim.attribute("contents.missing"), None);
        assert_eq!(claim.attribute("ctype.age"), None);
    }

    #[test]
    fn attribute_paths_are_flattened_and_sorted() {
        let claim = Claim::new(json!({"b": {"y": 1, "x": 2}, "a": [1, 2], "c": {}})).unwrap();
        assert_eq!(claim.attribute_paths(), vec!["a", "b.x", "b.y", "c"]);
    }

    #[test]
    fn deserialization_validates() {
        let ok: Claim = serde_json::from_str(r#"{"age":"30"}"#).unwrap();
        assert_eq!(ok.attribute("age"), Some(&json!("30")));
        assert!(serde_json::from_str::<Claim>("{}").is_err());
        assert!(serde_json::from_str::<Claim>(r#"{"x":0.5}"#).is_err());
    }

    #[test]
    fn repeated_keys_are_rejected_at_any_depth() {
        let err = serde_json::from_str::<Claim>(r#"{"age":"30","age":"99"}"#).unwrap_err();
        assert!(err.to_string().contains("duplicate attribute \"age\""));
        assert!(serde_json::from_str::<Claim>(r#"{"contents":{"a":1,"a":2}}"#).is_err());
        assert!(serde_json::from_str::<Claim>(r#"{"a":{"x":1},"b":{"x":2}}"#).is_ok());
    }

    #[test]
    fn from_json_separates_malformed_from_invalid() {
        let claim = Claim::from_json(r#"{"age":"30","tags":[1,null,true]}"#).unwrap();
        assert_eq!(claim.attribute("tags"), Some(&json!([1, null, true])));

        assert!(matches!(
            Claim::from_json("{not json"),
            Err(ClaimerError::MalformedMessage { kind: MessageKind::Claim, .. })
        ));
        assert!(matches!(
            Claim::from_json(r#"{"age":"30","age":"99"}"#),
            Err(ClaimerError::MalformedMessage { kind: MessageKind::Claim, .. })
        ));
        assert!(matches!(
            Claim::from_json("{}"),
            Err(ClaimerError::InvalidClaim(ValidationError::EmptyClaim))
        ));
        assert!(matches!(
            Claim::from_json(r#"{"height":1.5}"#),
            Err(ClaimerError::InvalidClaim(ValidationError::Canonicalization(_)))
        ));
    }

    #[test]
    fn serializes_as_plain_object() {
        let claim = Claim::new(json!({"age": "30"})).unwrap();
        assert_eq!(serde_json::to_string(&claim).unwrap(), r#"{"age":"30"}"#);
    }

    #[test]
    fn digest_ignores_key_order() {
        let a = Claim::new(json!({"a": 1, "b": 2})).unwrap();
        let mut map = Map::new();
        map.insert("b".into(), json!(2));
        map.insert("a".into(), json!(1));
        let b = Claim::new(Value::Object(map)).unwrap();
        assert_eq!(a.digest(), b.digest());
    }

    proptest! {
        #[test]
        fn every_listed_path_resolves(
            entries in proptest::collection::btree_map("[a-z]{1,5}", any::<i64>(), 1..6),
            group in "[a-z]{1,5}",
        ) {
            let mut nested = Map::new();
            for (k, v) in &entries {
                nested.insert(k.clone(), json!(v));
            }
            let mut outer = Map::new();
            outer.insert(group, Value::Object(nested));
            let claim = Claim::new(Value::Object(outer)).unwrap();
            for path in claim.attribute_paths() {
                prop_assert!(claim.attribute(&path).is_some());
            }
            prop_assert_eq!(claim.attribute_paths().len(), entries.len());
        }
    }
}
