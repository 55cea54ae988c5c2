// ABOUTME: Source resolution for recipe jobs: links, oEmbed metadata, transcripts, media
// ABOUTME: Defines SourceMaterial, the text and image context handed to recipe extraction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Clipchef Contributors

//! # Sources
//!
//! Everything a job needs before the LLM sees it:
//!
//! - **link**: video URL parsing, normalization, and short-link expansion
//! - **oembed**: public title/creator metadata for `YouTube` and `TikTok`
//! - **transcript**: third-party transcript service client
//! - **download**: `yt-dlp` audio download for the ASR fallback
//! - **asr**: speech-to-text over an `OpenAI`-compatible endpoint
//!
//! Each external dependency sits behind a trait so the job runner can be
//! exercised with scripted fakes.

/// Speech-to-text over `/audio/transcriptions`
pub mod asr;
/// Audio download through `yt-dlp`
pub mod download;
/// Video link parsing and normalization
pub mod link;
/// oEmbed metadata lookups
pub mod oembed;
/// Third-party transcript service
pub mod transcript;

pub use asr::{SpeechToText, WhisperTranscriber};
pub use download::{VideoDownloader, YtDlpDownloader};
pub use link::{LinkError, LinkResolver, Platform, VideoLink};
pub use oembed::{MetadataProvider, OEmbedClient, VideoMetadata};
pub use transcript::{HttpTranscriptService, Transcript, TranscriptProvider};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use clipchef_core::constants::limits::MAX_TRANSCRIPT_CHARS;
use clipchef_core::errors::AppError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::path::Path;

/// Kind of uploaded media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A video file, sent through speech-to-text
    Video,
    /// A still image of a dish or recipe card, sent to a vision model
    Image,
}

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v", "webm", "mkv", "avi", "3gp"];
const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
];

impl MediaKind {
    /// Detect the media kind from a MIME type, then from the file extension
    ///
    /// Generic types like `application/octet-stream` defer to the extension.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedMediaType` when neither identifies a video or image.
    pub fn detect(content_type: Option<&str>, filename: Option<&str>) -> Result<Self, AppError> {
        let mime = content_type
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_lowercase())
            .filter(|ct| !ct.is_empty());

        if let Some(ref mime) = mime {
            if mime.starts_with("video/") {
                return Ok(Self::Video);
            }
            if mime.starts_with("image/") {
                return Ok(Self::Image);
            }
        }

        if let Some(ext) = filename.and_then(extension_of) {
            if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
                return Ok(Self::Video);
            }
            if IMAGE_EXTENSIONS.iter().any(|(known, _)| *known == ext) {
                return Ok(Self::Image);
            }
        }

        Err(AppError::unsupported_media(
            mime.or_else(|| filename.map(ToOwned::to_owned))
                .unwrap_or_else(|| "unknown".to_owned()),
        ))
    }

    /// Lowercase name used in job records and logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

/// Image MIME type for a file name, defaulting to JPEG
#[must_use]
pub fn image_mime_for(filename: &str) -> &'static str {
    extension_of(filename)
        .and_then(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, mime)| *mime)
        })
        .unwrap_or("image/jpeg")
}

/// Image bytes ready for a vision model
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    /// MIME type (`image/jpeg`, `image/png`, ...)
    pub content_type: String,
    /// Base64 payload
    pub data_base64: String,
}

impl ImageAttachment {
    /// Encode raw image bytes
    #[must_use]
    pub fn from_bytes(content_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            content_type: content_type.into(),
            data_base64: STANDARD.encode(bytes),
        }
    }

    /// `data:` URL accepted by `OpenAI`-compatible vision endpoints
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, self.data_base64)
    }
}

/// Where the text in a [`SourceMaterial`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "media")]
pub enum SourceKind {
    /// Spoken transcript (transcript service or speech-to-text)
    Transcript,
    /// Only title/caption metadata was available
    Caption,
    /// Uploaded media
    Upload(MediaKind),
}

/// Everything recipe extraction knows about a job's input
#[derive(Debug, Clone)]
pub struct SourceMaterial {
    /// Provenance of `text`
    pub kind: SourceKind,
    /// Transcript or caption text (may be empty for image uploads)
    pub text: String,
    /// Public metadata for link jobs
    pub metadata: Option<VideoMetadata>,
    /// Image for vision extraction
    pub image: Option<ImageAttachment>,
    /// Canonical link, when the job came from one
    pub source_url: Option<String>,
    /// Transcript language reported by the provider
    pub language: Option<String>,
    /// Free-text note supplied by the user at submission
    pub note: Option<String>,
}

impl SourceMaterial {
    /// Material built from a spoken transcript
    #[must_use]
    pub fn from_transcript(
        transcript: Transcript,
        metadata: Option<VideoMetadata>,
        source_url: Option<String>,
    ) -> Self {
        Self {
            kind: SourceKind::Transcript,
            text: transcript.text,
            metadata,
            image: None,
            source_url,
            language: transcript.language,
            note: None,
        }
    }

    /// Material built from metadata alone
    ///
    /// Returns `None` unless the metadata carries a non-empty title.
    #[must_use]
    pub fn caption_only(metadata: VideoMetadata, source_url: Option<String>) -> Option<Self> {
        let title = metadata.title.as_deref().map(str::trim).unwrap_or_default();
        if title.is_empty() {
            return None;
        }
        Some(Self {
            kind: SourceKind::Caption,
            text: title.to_owned(),
            metadata: Some(metadata),
            image: None,
            source_url,
            language: None,
            note: None,
        })
    }

    /// Material built from an uploaded video's speech-to-text output
    #[must_use]
    pub fn from_uploaded_video(transcript: Transcript) -> Self {
        Self {
            kind: SourceKind::Upload(MediaKind::Video),
            text: transcript.text,
            metadata: None,
            image: None,
            source_url: None,
            language: transcript.language,
            note: None,
        }
    }

    /// Material built from an uploaded image
    #[must_use]
    pub fn from_image(image: ImageAttachment) -> Self {
        Self {
            kind: SourceKind::Upload(MediaKind::Image),
            text: String::new(),
            metadata: None,
            image: Some(image),
            source_url: None,
            language: None,
            note: None,
        }
    }

    /// Attach the user's note
    #[must_use]
    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note.filter(|n| !n.trim().is_empty());
        self
    }

    /// True when extraction should be marked low confidence up front
    #[must_use]
    pub const fn is_caption_only(&self) -> bool {
        matches!(self.kind, SourceKind::Caption)
    }

    /// Render the material as the user message for recipe extraction
    ///
    /// Transcript text is cut at a character limit on a char boundary.
    #[must_use]
    pub fn prompt_context(&self) -> String {
        let mut context = String::new();

        let label = match self.kind {
            SourceKind::Transcript => "spoken transcript of a cooking video",
            SourceKind::Caption => "video title and caption only (no transcript available)",
            SourceKind::Upload(MediaKind::Video) => "transcript of an uploaded cooking video",
            SourceKind::Upload(MediaKind::Image) => "photo of a dish or recipe (attached)",
        };
        let _ = writeln!(context, "Source: {label}");

        if let Some(ref url) = self.source_url {
            let _ = writeln!(context, "URL: {url}");
        }
        if let Some(ref metadata) = self.metadata {
            if let Some(ref title) = metadata.title {
                let _ = writeln!(context, "Title: {title}");
            }
            if let Some(ref author) = metadata.author_name {
                let _ = writeln!(context, "Creator: {author}");
            }
        }
        if let Some(ref language) = self.language {
            let _ = writeln!(context, "Language: {language}");
        }
        if let Some(ref note) = self.note {
            let _ = writeln!(context, "User note: {}", note.trim());
        }

        let text = self.text.trim();
        if !text.is_empty() && !self.is_caption_only() {
            let truncated: String = text.chars().take(MAX_TRANSCRIPT_CHARS).collect();
            let _ = write!(context, "\nTranscript:\n{truncated}");
            if truncated.len() < text.len() {
                context.push_str("\n[transcript truncated]");
            }
        }

        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipchef_core::errors::ErrorCode;

    #[test]
    fn test_media_kind_from_mime() {
        assert_eq!(MediaKind::detect(Some("video/mp4"), None).unwrap(), MediaKind::Video);
        assert_eq!(
            MediaKind::detect(Some("image/png; charset=binary"), Some("x.bin")).unwrap(),
            MediaKind::Image
        );
    }

    #[test]
    fn test_media_kind_from_extension() {
        assert_eq!(
            MediaKind::detect(Some("application/octet-stream"), Some("clip.MOV")).unwrap(),
            MediaKind::Video
        );
        assert_eq!(MediaKind::detect(None, Some("plate.heic")).unwrap(), MediaKind::Image);
    }

    #[test]
    fn test_media_kind_rejects_other_types() {
        let error = MediaKind::detect(Some("application/pdf"), Some("recipe.pdf")).unwrap_err();
        assert_eq!(error.code, ErrorCode::UnsupportedMediaType);
    }

    #[test]
    fn test_caption_only_requires_title() {
        let empty = VideoMetadata {
            title: Some("   ".to_owned()),
            ..VideoMetadata::default()
        };
        assert!(SourceMaterial::caption_only(empty, None).is_none());
    }

    #[test]
    fn test_prompt_context_includes_metadata_and_note() {
        let material = SourceMaterial::from_transcript(
            Transcript::new("Sear the steak for two minutes."),
            Some(VideoMetadata {
                title: Some("Steak bites".to_owned()),
                author_name: Some("chef_jo".to_owned()),
                ..VideoMetadata::default()
            }),
            Some("https://www.youtube.com/watch?v=abc".to_owned()),
        )
        .with_note(Some("make it spicy".to_owned()));

        let context = material.prompt_context();
        assert!(context.contains("Title: Steak bites"));
        assert!(context.contains("Creator: chef_jo"));
        assert!(context.contains("User note: make it spicy"));
        assert!(context.contains("Sear the steak"));
    }

    #[test]
    fn test_image_data_url() {
        let image = ImageAttachment::from_bytes("image/png", b"abc");
        assert_eq!(image.data_url(), "data:image/png;base64,YWJj");
    }
}
