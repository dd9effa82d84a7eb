//! Core data models for the APOD proxy
//!
//! This module contains the data types used throughout the application for
//! representing Astronomy Picture of the Day records fetched from the
//! upstream NASA API.

pub mod apod;

pub use apod::{ApodClient, ApodError};

use serde::{Deserialize, Serialize};

/// An Astronomy Picture of the Day record
///
/// The `id` is assigned by the caller (it comes from the relational store
/// that maps date strings to identifiers) and is opaque to this crate. The
/// `date` string is the lookup key for caching.
///
/// A distinguished empty variant, built with [`Apod::empty`], signals that
/// the upstream API could not be reached; it is the only value for which
/// [`Apod::is_empty`] returns true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Apod {
    /// Identifier assigned by the persistence layer
    pub id: String,
    /// Date string the record was fetched for (e.g. "2019-01-10")
    pub date: String,
    /// Title of the picture
    pub title: String,
    /// Explanatory text accompanying the picture
    pub explanation: String,
    /// URL of the picture
    pub url: String,
    /// URL of the high-definition variant, if the upstream provides one
    pub hdurl: Option<String>,
}

impl Apod {
    /// Builds the empty sentinel record used on the failure path
    ///
    /// The sentinel is returned to callers instead of an error when the
    /// upstream API is unavailable. It must never be cached.
    pub fn empty() -> Self {
        Self {
            id: String::new(),
            date: String::new(),
            title: String::new(),
            explanation: String::new(),
            url: String::new(),
            hdurl: None,
        }
    }

    /// Returns true only for the empty sentinel
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.date.is_empty() && self.title.is_empty() && self.url.is_empty()
    }

    /// Attaches the caller-supplied identifier to this record
    ///
    /// The upstream response carries no identifier; it is supplied by the
    /// caller after its own lookup-or-insert against the relational store.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Wire representation of the upstream APOD response body
///
/// Only the fields this crate consumes are listed; everything else the API
/// returns (`media_type`, `service_version`, `copyright`, ...) is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ApodResponse {
    /// Title of the picture
    pub title: String,
    /// Explanatory text
    #[serde(default)]
    pub explanation: String,
    /// URL of the picture
    pub url: String,
    /// URL of the high-definition variant
    #[serde(default)]
    pub hdurl: Option<String>,
}

impl ApodResponse {
    /// Converts the wire representation into a domain record
    ///
    /// The identifier is left empty; callers attach it via [`Apod::with_id`].
    pub fn into_apod(self, date: impl Into<String>) -> Apod {
        Apod {
            id: String::new(),
            date: date.into(),
            title: self.title,
            explanation: self.explanation,
            url: self.url,
            hdurl: self.hdurl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sentinel_is_empty() {
        assert!(Apod::empty().is_empty());
    }

    #[test]
    fn test_populated_record_is_not_empty() {
        let apod = Apod {
            id: "0".to_string(),
            date: "2019-01-10".to_string(),
            title: "Sharpless 308".to_string(),
            explanation: "Blown by fast winds from a hot, massive star...".to_string(),
            url: "https://apod.nasa.gov/apod/image/1901/sh308.jpg".to_string(),
            hdurl: None,
        };

        assert!(!apod.is_empty());
    }

    #[test]
    fn test_with_id_attaches_identifier() {
        let apod = ApodResponse {
            title: "X".to_string(),
            explanation: String::new(),
            url: "http://img".to_string(),
            hdurl: None,
        }
        .into_apod("2019-01-10")
        .with_id("42");

        assert_eq!(apod.id, "42");
        assert_eq!(apod.date, "2019-01-10");
        assert_eq!(apod.title, "X");
    }

    #[test]
    fn test_response_deserializes_without_optional_fields() {
        let json = r#"{"title": "X", "url": "http://img"}"#;
        let response: ApodResponse = serde_json::from_str(json).expect("should parse");

        assert_eq!(response.title, "X");
        assert_eq!(response.url, "http://img");
        assert!(response.explanation.is_empty());
        assert!(response.hdurl.is_none());
    }

    #[test]
    fn test_response_ignores_unknown_fields() {
        let json = r#"{
            "title": "X",
            "url": "http://img",
            "hdurl": "http://img-hd",
            "explanation": "a picture",
            "media_type": "image",
            "service_version": "v1",
            "date": "2019-01-10"
        }"#;
        let response: ApodResponse = serde_json::from_str(json).expect("should parse");

        assert_eq!(response.hdurl.as_deref(), Some("http://img-hd"));
        assert_eq!(response.explanation, "a picture");
    }

    #[test]
    fn test_apod_serialization_roundtrip() {
        let apod = Apod {
            id: "1".to_string(),
            date: "2018-07-01".to_string(),
            title: "Moon".to_string(),
            explanation: "The Moon.".to_string(),
            url: "https://apod.nasa.gov/apod/image/moon.jpg".to_string(),
            hdurl: Some("https://apod.nasa.gov/apod/image/moon_hd.jpg".to_string()),
        };

        let json = serde_json::to_string(&apod).expect("Failed to serialize Apod");
        let deserialized: Apod = serde_json::from_str(&json).expect("Failed to deserialize Apod");

        assert_eq!(deserialized, apod);
    }
}
