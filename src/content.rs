use teloxide::types::{FileId, Message};
use teloxide::utils::html;

/// A user submission, classified once at intake.
///
/// Telegram sends photos as an array of size variants ordered smallest
/// first; the first variant is kept.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionContent {
    Text(String),
    Photo {
        file_id: FileId,
        caption: Option<String>,
    },
    Video {
        file_id: FileId,
        caption: Option<String>,
    },
}

impl SubmissionContent {
    /// Classify an incoming message. Checks are mutually exclusive and
    /// ordered: text, then video, then photo. Anything else is unsupported.
    pub fn classify(msg: &Message) -> Option<Self> {
        if let Some(text) = msg.text() {
            Some(Self::Text(text.to_owned()))
        } else if let Some(video) = msg.video() {
            Some(Self::Video {
                file_id: video.file.id.clone(),
                caption: msg.caption().map(str::to_owned),
            })
        } else if let Some(sizes) = msg.photo() {
            sizes.first().map(|photo| Self::Photo {
                file_id: photo.file.id.clone(),
                caption: msg.caption().map(str::to_owned),
            })
        } else {
            None
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Photo { .. } => "photo",
            Self::Video { .. } => "video",
        }
    }

    /// Body shown to the moderator, with the sender attribution attached.
    pub fn moderation_caption(&self, user_link: &str) -> String {
        match self {
            Self::Text(text) => format!("{text}\nСообщение от пользователя: {user_link}"),
            Self::Photo { caption, .. } => {
                format!("Фото от пользователя {user_link}{}", caption_suffix(caption))
            }
            Self::Video { caption, .. } => {
                format!("Видео от пользователя {user_link}{}", caption_suffix(caption))
            }
        }
    }

    /// Body published to the channel: HTML-escaped original content plus
    /// the promotional footer. Media without a caption gets the footer alone.
    pub fn channel_caption(&self, footer: &str) -> String {
        match self {
            Self::Text(text) => format!("{}{footer}", html::escape(text)),
            Self::Photo { caption, .. } | Self::Video { caption, .. } => match caption {
                Some(caption) => format!("{}{footer}", html::escape(caption)),
                None => footer.trim_start().to_owned(),
            },
        }
    }
}

fn caption_suffix(caption: &Option<String>) -> String {
    match caption {
        Some(caption) => format!("\n{caption}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(caption: Option<&str>) -> SubmissionContent {
        SubmissionContent::Photo {
            file_id: FileId("photo-file-id".to_owned()),
            caption: caption.map(str::to_owned),
        }
    }

    #[test]
    fn test_text_moderation_caption_appends_attribution() {
        let content = SubmissionContent::Text("привет всем".to_owned());
        assert_eq!(
            content.moderation_caption("@alice"),
            "привет всем\nСообщение от пользователя: @alice"
        );
    }

    #[test]
    fn test_photo_moderation_caption_with_caption() {
        assert_eq!(
            photo(Some("hi")).moderation_caption("A"),
            "Фото от пользователя A\nhi"
        );
    }

    #[test]
    fn test_photo_moderation_caption_without_caption() {
        assert_eq!(photo(None).moderation_caption("@bob"), "Фото от пользователя @bob");
    }

    #[test]
    fn test_video_moderation_caption() {
        let content = SubmissionContent::Video {
            file_id: FileId("vid".to_owned()),
            caption: Some("смотрите".to_owned()),
        };
        assert_eq!(
            content.moderation_caption("@carol"),
            "Видео от пользователя @carol\nсмотрите"
        );
    }

    #[test]
    fn test_channel_caption_appends_footer_to_text() {
        let content = SubmissionContent::Text("news".to_owned());
        assert_eq!(content.channel_caption("\n\nfooter"), "news\n\nfooter");
    }

    #[test]
    fn test_channel_caption_escapes_html_in_text() {
        let content = SubmissionContent::Text("a < b & c".to_owned());
        assert_eq!(
            content.channel_caption("\n\nfooter"),
            "a &lt; b &amp; c\n\nfooter"
        );
    }

    #[test]
    fn test_channel_caption_for_captioned_photo() {
        assert_eq!(photo(Some("hi")).channel_caption("\n\nfooter"), "hi\n\nfooter");
    }

    #[test]
    fn test_channel_caption_for_bare_photo_is_footer_only() {
        assert_eq!(photo(None).channel_caption("\n\nfooter"), "footer");
    }

    fn message(json: &str) -> Message {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_classify_text_message() {
        let msg = message(
            r#"{"message_id":1,"date":1700000000,"chat":{"id":10,"type":"private"},"text":"привет"}"#,
        );
        assert_eq!(
            SubmissionContent::classify(&msg),
            Some(SubmissionContent::Text("привет".to_owned()))
        );
    }

    #[test]
    fn test_classify_video_with_caption() {
        let msg = message(
            r#"{"message_id":2,"date":1700000000,"chat":{"id":10,"type":"private"},
                "video":{"file_id":"vid-1","file_unique_id":"u1","width":640,"height":480,"duration":10,"mime_type":"video/mp4"},
                "caption":"смотрите"}"#,
        );
        assert_eq!(
            SubmissionContent::classify(&msg),
            Some(SubmissionContent::Video {
                file_id: FileId("vid-1".to_owned()),
                caption: Some("смотрите".to_owned()),
            })
        );
    }

    #[test]
    fn test_classify_photo_takes_smallest_variant() {
        // Telegram orders the size variants smallest first.
        let msg = message(
            r#"{"message_id":3,"date":1700000000,"chat":{"id":10,"type":"private"},
                "photo":[
                    {"file_id":"small","file_unique_id":"s","width":90,"height":90},
                    {"file_id":"large","file_unique_id":"l","width":800,"height":800}
                ],
                "caption":"hi"}"#,
        );
        assert_eq!(
            SubmissionContent::classify(&msg),
            Some(SubmissionContent::Photo {
                file_id: FileId("small".to_owned()),
                caption: Some("hi".to_owned()),
            })
        );
    }

    #[test]
    fn test_classify_uncaptioned_photo() {
        let msg = message(
            r#"{"message_id":4,"date":1700000000,"chat":{"id":10,"type":"private"},
                "photo":[{"file_id":"only","file_unique_id":"o","width":90,"height":90}]}"#,
        );
        assert_eq!(
            SubmissionContent::classify(&msg),
            Some(SubmissionContent::Photo {
                file_id: FileId("only".to_owned()),
                caption: None,
            })
        );
    }

    #[test]
    fn test_classify_voice_is_unsupported() {
        let msg = message(
            r#"{"message_id":5,"date":1700000000,"chat":{"id":10,"type":"private"},
                "voice":{"file_id":"v","file_unique_id":"uv","duration":3}}"#,
        );
        assert_eq!(SubmissionContent::classify(&msg), None);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(SubmissionContent::Text(String::new()).kind(), "text");
        assert_eq!(photo(None).kind(), "photo");
    }
}
