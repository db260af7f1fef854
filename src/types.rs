//! Type Definitions for DIDs and DID Documents, compatible with JSON

mod did_parser;
mod did_url;
mod document;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

pub use did_parser::*;
pub use did_url::*;
pub use document::*;

use crate::error::DocumentError;

/// A DID Document, based on the did specification, [DID Document Properties](https://www.w3.org/TR/did-core/#did-document-properties)
///
/// Every verification relationship holds either embedded verification methods or string
/// references to methods defined elsewhere in the document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DidDocument {
    #[serde(
        rename = "@context",
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub context: Vec<String>,
    #[serde(deserialize_with = "required_id")]
    id: String,
    #[serde(default, rename = "alsoKnownAs", skip_serializing_if = "Vec::is_empty")]
    pub also_known_as: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(
        default,
        rename = "verificationMethod",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<VerificationMethodEntry>,
    #[serde(
        default,
        rename = "assertionMethod",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub assertion_method: Vec<VerificationMethodEntry>,
    #[serde(
        default,
        rename = "keyAgreement",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub key_agreement: Vec<VerificationMethodEntry>,
    #[serde(
        default,
        rename = "capabilityInvocation",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub capability_invocation: Vec<VerificationMethodEntry>,
    #[serde(
        default,
        rename = "capabilityDelegation",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub capability_delegation: Vec<VerificationMethodEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,
}

/// `@context` may be a single string or a list of them
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(context) => vec![context],
        OneOrMany::Many(contexts) => contexts,
    })
}

fn required_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let id = String::deserialize(deserializer)?;
    if id.is_empty() {
        return Err(serde::de::Error::custom(DocumentError::MissingId));
    }
    Ok(id)
}

/// A service endpoint advertised by the DID subject, [Services](https://www.w3.org/TR/did-core/#services)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(rename = "serviceEndpoint")]
    pub service_endpoint: Url,
}

/// A verification method, [Verification Methods](https://www.w3.org/TR/did-core/#verification-methods)
///
/// Key material (`publicKeyMultibase`, `publicKeyJwk`, ...) is kept as-is in `properties`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VerificationMethod {
    pub id: String,
    pub controller: String,
    #[serde(rename = "type")]
    pub method_type: String,
    #[serde(flatten)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl VerificationMethod {
    pub fn new<S: Into<String>>(id: S, controller: S, method_type: S) -> Self {
        Self {
            id: id.into(),
            controller: controller.into(),
            method_type: method_type.into(),
            properties: Default::default(),
        }
    }

    /// Attach a key material property, e.g. `publicKeyMultibase`.
    pub fn with_property<V: Into<serde_json::Value>>(mut self, name: &str, value: V) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }
}

/// An item of a verification relationship, either the method itself or a reference to it by id.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum VerificationMethodEntry {
    Reference(String),
    Embedded(VerificationMethod),
}

impl VerificationMethodEntry {
    /// The id of the method, whether referenced or embedded
    pub fn id(&self) -> &str {
        match self {
            VerificationMethodEntry::Reference(id) => id,
            VerificationMethodEntry::Embedded(method) => &method.id,
        }
    }

    pub fn as_embedded(&self) -> Option<&VerificationMethod> {
        match self {
            VerificationMethodEntry::Embedded(method) => Some(method),
            VerificationMethodEntry::Reference(_) => None,
        }
    }
}

impl From<VerificationMethod> for VerificationMethodEntry {
    fn from(method: VerificationMethod) -> Self {
        Self::Embedded(method)
    }
}

/// Verification relationships (proof purposes), [Verification Relationships](https://www.w3.org/TR/did-core/#verification-relationships)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerificationRelationship {
    Authentication,
    AssertionMethod,
    KeyAgreement,
    CapabilityInvocation,
    CapabilityDelegation,
}

impl VerificationRelationship {
    /// Every relationship, in the order documents are searched.
    pub const ALL: [VerificationRelationship; 5] = [
        VerificationRelationship::Authentication,
        VerificationRelationship::AssertionMethod,
        VerificationRelationship::KeyAgreement,
        VerificationRelationship::CapabilityInvocation,
        VerificationRelationship::CapabilityDelegation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationRelationship::Authentication => "authentication",
            VerificationRelationship::AssertionMethod => "assertionMethod",
            VerificationRelationship::KeyAgreement => "keyAgreement",
            VerificationRelationship::CapabilityInvocation => "capabilityInvocation",
            VerificationRelationship::CapabilityDelegation => "capabilityDelegation",
        }
    }

    /// Whether `purpose` names a known verification relationship
    ///
    /// # Examples
    /// ```
    /// use lib_didresolver::types::VerificationRelationship;
    ///
    /// assert!(VerificationRelationship::has("keyAgreement"));
    /// assert!(!VerificationRelationship::has("contractAgreement"));
    /// ```
    pub fn has(purpose: &str) -> bool {
        purpose.parse::<VerificationRelationship>().is_ok()
    }
}

impl fmt::Display for VerificationRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationRelationship {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|relationship| relationship.as_str() == s)
            .ok_or_else(|| DocumentError::UnsupportedPurpose(s.to_string()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    pub fn sample_document() -> serde_json::Value {
        json!({
            "@context": [
                "https://www.w3.org/ns/did/v1",
                "https://w3id.org/security/suites/ed25519-2020/v1"
            ],
            "id": "did:example:123",
            "controller": "did:example:123",
            "verificationMethod": [
                {
                    "id": "did:example:123#keys-1",
                    "controller": "did:example:123",
                    "type": "Ed25519VerificationKey2020",
                    "publicKeyMultibase": "z6MkpTHR8VNsBxYAAWHut2Geadd9jSwuBV8xRoAnwWsdvktH"
                }
            ],
            "authentication": [
                "did:example:123#keys-1",
                {
                    "id": "did:example:123#keys-2",
                    "controller": "did:example:123",
                    "type": "Ed25519VerificationKey2020",
                    "publicKeyMultibase": "z6MknGc3ocHs3zdPiJbnaaqDi58NGb4pk1Sp9WxWufuXSdxf"
                }
            ],
            "service": [
                {
                    "id": "did:example:123#linked-domain",
                    "type": "LinkedDomains",
                    "serviceEndpoint": "https://bar.example.com/"
                }
            ]
        })
    }

    #[test]
    fn test_serialization_of_document() {
        let sample = sample_document();
        let doc: DidDocument = serde_json::from_value(sample.clone()).unwrap();

        let mut expected = DidDocument::new("did:example:123").unwrap();
        expected.context = vec![
            "https://www.w3.org/ns/did/v1".to_string(),
            "https://w3id.org/security/suites/ed25519-2020/v1".to_string(),
        ];
        expected.controller = Some("did:example:123".to_string());
        expected.verification_method = vec![VerificationMethod::new(
            "did:example:123#keys-1",
            "did:example:123",
            "Ed25519VerificationKey2020",
        )
        .with_property(
            "publicKeyMultibase",
            "z6MkpTHR8VNsBxYAAWHut2Geadd9jSwuBV8xRoAnwWsdvktH",
        )];
        expected.authentication = vec![
            VerificationMethodEntry::Reference("did:example:123#keys-1".to_string()),
            VerificationMethod::new(
                "did:example:123#keys-2",
                "did:example:123",
                "Ed25519VerificationKey2020",
            )
            .with_property(
                "publicKeyMultibase",
                "z6MknGc3ocHs3zdPiJbnaaqDi58NGb4pk1Sp9WxWufuXSdxf",
            )
            .into(),
        ];
        expected.service = vec![Service {
            id: "did:example:123#linked-domain".to_string(),
            service_type: "LinkedDomains".to_string(),
            service_endpoint: Url::parse("https://bar.example.com/").unwrap(),
        }];

        assert_eq!(doc, expected);
        assert_eq!(serde_json::to_value(doc).unwrap(), sample);
    }

    #[test]
    fn test_single_context() {
        let doc: DidDocument = serde_json::from_value(json!({
            "@context": "https://w3id.org/identity/v1",
            "id": "did:example:123"
        }))
        .unwrap();
        assert_eq!(doc.context, vec!["https://w3id.org/identity/v1"]);
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({"@context": ["https://w3id.org/identity/v1"], "id": "did:example:123"})
        );

        let doc: DidDocument = serde_json::from_value(json!({"id": "did:example:123"})).unwrap();
        assert!(doc.context.is_empty());
    }

    #[test]
    fn test_document_requires_id() {
        let err = serde_json::from_value::<DidDocument>(json!({"id": ""})).unwrap_err();
        assert!(err.to_string().contains("`id` property is required"), "{err}");
        assert!(serde_json::from_value::<DidDocument>(json!({"service": []})).is_err());
    }

    #[test]
    fn test_relationship_names() {
        for relationship in VerificationRelationship::ALL {
            assert_eq!(
                relationship.as_str().parse::<VerificationRelationship>().unwrap(),
                relationship
            );
            assert_eq!(
                serde_json::to_value(relationship).unwrap(),
                json!(relationship.as_str())
            );
        }
        assert!(matches!(
            "contractAgreement".parse::<VerificationRelationship>(),
            Err(DocumentError::UnsupportedPurpose(p)) if p == "contractAgreement"
        ));
    }
}
