use serde::Deserialize;

use super::models::ProfileChanges;
use crate::error::FieldErrors;

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CreatePostForm {
    #[serde(default)]
    pub caption: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct UpdatePostForm {
    #[serde(default)]
    pub caption: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct UpdateProfileForm {
    #[serde(default)]
    pub bio_text: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub profile_image_url: String,
}

impl UpdateProfileForm {
    pub fn validate(self) -> Result<ProfileChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let url = self.profile_image_url.trim().to_string();
        if !url.is_empty() && !is_web_url(&url) {
            errors
                .entry("profile_image_url".into())
                .or_default()
                .push("Enter a valid URL.".into());
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ProfileChanges {
            display_name: self.display_name,
            profile_image_url: url,
            bio_text: self.bio_text,
        })
    }
}

impl CreatePostForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(url) = self.image_url.as_deref().map(str::trim) {
            if !url.is_empty() && !is_web_url(url) {
                errors
                    .entry("image_url".into())
                    .or_default()
                    .push("Enter a valid URL.".into());
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// http(s) scheme followed by a host with no whitespace.
fn is_web_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
