//! Users: authenticated identity, stored profile and photos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub uid: String,
    pub email: Option<String>,
}

/// Profile document stored at `users/{uid}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub display_name: String,
    /// URL of the main photo. The photo itself lives in `users/{uid}/photos`.
    #[serde(rename = "photoURL", default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            photo_url: None,
            created_at: None,
        }
    }

    #[must_use]
    pub fn with_photo(mut self, photo_url: impl Into<String>) -> Self {
        self.photo_url = Some(photo_url.into());
        self
    }

    /// Main photo, or `placeholder` when the user has none.
    pub fn photo_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.photo_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(placeholder)
    }
}

/// The user on whose behalf a domain operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub identity: UserIdentity,
    pub profile: UserProfile,
}

impl Actor {
    pub fn new(identity: UserIdentity, profile: UserProfile) -> Self {
        Self { identity, profile }
    }

    pub fn uid(&self) -> &str {
        &self.identity.uid
    }
}

/// One uploaded photo in `users/{uid}/photos/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub url: String,
}

/// Collection path holding a user's photos.
pub fn photos_collection(uid: &str) -> String {
    format!("{}/{uid}/photos", super::USERS_COLLECTION)
}

/// Photos to show in the gallery: everything except the current main photo.
pub fn gallery_photos<'a>(profile: &UserProfile, photos: &'a [Photo]) -> Vec<&'a Photo> {
    photos
        .iter()
        .filter(|photo| profile.photo_url.as_deref() != Some(photo.url.as_str()))
        .collect()
}
