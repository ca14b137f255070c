use std::path::Path;

use chrono::Utc;

use super::WriteError;
use crate::api::{initials, Species, SupernovaClient, User};
use crate::session::SessionContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileAttachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }

    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    Upload(FileAttachment),
    Url(String),
}

/// The single attachment a post may carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    Image(FileAttachment),
    Video(VideoSource),
    File(FileAttachment),
    Link(String),
}

impl Attachment {
    fn is_empty(&self) -> bool {
        match self {
            Attachment::Image(file)
            | Attachment::File(file)
            | Attachment::Video(VideoSource::Upload(file)) => file.is_empty(),
            Attachment::Video(VideoSource::Url(url)) | Attachment::Link(url) => {
                url.trim().is_empty()
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalDraft {
    pub title: String,
    pub body: String,
    pub attachment: Option<Attachment>,
}

impl ProposalDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn validate(&self) -> Result<(), WriteError> {
        if self.title.trim().is_empty() {
            return Err(WriteError::Invalid("A title is required.".to_string()));
        }

        let has_attachment = self.attachment.as_ref().is_some_and(|a| !a.is_empty());
        if self.body.trim().is_empty() && !has_attachment {
            return Err(WriteError::Invalid(
                "Add some text or an attachment before posting.".to_string(),
            ));
        }
        Ok(())
    }
}

/// Author metadata sent alongside a new post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorFields {
    pub author: String,
    pub user_name: String,
    pub user_initials: String,
    pub author_type: Species,
    pub author_img: String,
    pub date: String,
}

impl AuthorFields {
    pub fn from_profile(profile: Option<&User>) -> Self {
        let name = profile
            .map(|p| p.username.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or("Traveler")
            .to_string();

        Self {
            author: name.clone(),
            user_initials: initials(&name),
            user_name: name,
            author_type: profile.map(|p| p.species).unwrap_or_default(),
            author_img: profile.and_then(|p| p.avatar.clone()).unwrap_or_default(),
            date: Utc::now().to_rfc3339(),
        }
    }
}

/// Validates and submits a new proposal under the current profile.
pub async fn publish(
    client: &SupernovaClient,
    session: &SessionContext,
    draft: &ProposalDraft,
) -> Result<serde_json::Value, WriteError> {
    draft.validate()?;

    let profile = session.profile().await;
    let author = AuthorFields::from_profile(profile.as_ref());

    let created = client
        .create_proposal(draft, &author)
        .await
        .map_err(|e| WriteError::rejected("create post", e))?;

    tracing::info!(author = %author.user_name, title = %draft.title, "Proposal published");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ApiConfig;
    use std::sync::Arc;
    use futures::TryStreamExt;
    use tokio_test::{assert_err, assert_ok};
    use warp::{Buf, Filter};

    #[test]
    fn test_author_defaults_to_traveler() {
        let author = AuthorFields::from_profile(None);
        assert_eq!(author.author, "Traveler");
        assert_eq!(author.user_initials, "TR");
        assert_eq!(author.author_type, Species::Human);
        assert!(author.author_img.is_empty());
    }

    #[test]
    fn test_author_from_profile() {
        let mut user = User::traveler();
        user.username = "ada lovelace".to_string();
        user.species = Species::Ai;
        user.avatar = Some("/uploads/ada.png".to_string());

        let author = AuthorFields::from_profile(Some(&user));
        assert_eq!(author.user_name, "ada lovelace");
        assert_eq!(author.user_initials, "AL");
        assert_eq!(author.author_type, Species::Ai);
        assert_eq!(author.author_img, "/uploads/ada.png");
    }

    #[test]
    fn test_draft_validation() {
        assert_ok!(ProposalDraft::new("Solar", "Panels on every roof").validate());
        assert_err!(ProposalDraft::new("", "body").validate());
        assert_err!(ProposalDraft::new("Solar", "  ").validate());

        let link_only = ProposalDraft::new("Solar", "")
            .with_attachment(Attachment::Link("https://example.org".to_string()));
        assert_ok!(link_only.validate());

        let empty_image = ProposalDraft::new("Solar", "")
            .with_attachment(Attachment::Image(FileAttachment::new("a.png", Vec::new())));
        assert!(matches!(empty_image.validate(), Err(WriteError::Invalid(_))));
    }

    /// Echoes each multipart field back as text, and file parts by name.
    async fn echo_form(form: warp::multipart::FormData) -> Result<impl warp::Reply, warp::Rejection> {
        let parts: Vec<(String, Option<String>, Vec<u8>)> = form
            .and_then(|mut part| async move {
                let mut bytes = Vec::new();
                while let Some(chunk) = part.data().await {
                    bytes.extend_from_slice(chunk?.chunk());
                }
                Ok((part.name().to_string(), part.filename().map(str::to_string), bytes))
            })
            .try_collect()
            .await
            .map_err(|_| warp::reject::not_found())?;

        let mut fields = serde_json::Map::new();
        let mut files = serde_json::Map::new();
        for (name, file_name, bytes) in parts {
            match file_name {
                Some(file_name) => {
                    files.insert(name, serde_json::json!({"name": file_name, "size": bytes.len()}));
                }
                None => {
                    fields.insert(name, String::from_utf8_lossy(&bytes).into_owned().into());
                }
            }
        }
        Ok(warp::reply::json(&serde_json::json!({
            "id": 12,
            "fields": fields,
            "files": files
        })))
    }

    async fn client_for_echo() -> (SupernovaClient, Arc<SessionContext>) {
        let route = warp::post()
            .and(warp::path("proposals"))
            .and(warp::multipart::form())
            .and_then(echo_form);
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let session = Arc::new(SessionContext::in_memory());
        let config = ApiConfig {
            base_url: format!("http://{}", addr),
            request_timeout_secs: 5,
        };
        (SupernovaClient::new(&config, session.clone()).unwrap(), session)
    }

    #[tokio::test]
    async fn test_publish_sends_author_fields_and_image() {
        let (client, session) = client_for_echo().await;
        let mut user = User::traveler();
        user.username = "ada lovelace".to_string();
        user.species = Species::Company;
        session.set_profile(user).await.unwrap();

        let draft = ProposalDraft::new("Solar", "").with_attachment(Attachment::Image(
            FileAttachment::new("roof.png", vec![1, 2, 3]).with_content_type("image/png"),
        ));
        let created = publish(&client, &session, &draft).await.unwrap();

        assert_eq!(created["id"], 12);
        let fields = &created["fields"];
        assert_eq!(fields["title"], "Solar");
        assert_eq!(fields["body"], "");
        assert_eq!(fields["author"], "ada lovelace");
        assert_eq!(fields["userName"], "ada lovelace");
        assert_eq!(fields["userInitials"], "AL");
        assert_eq!(fields["author_type"], "company");
        assert_eq!(created["files"]["image"]["name"], "roof.png");
        assert_eq!(created["files"]["image"]["size"], 3);
    }

    #[tokio::test]
    async fn test_publish_signed_out_posts_as_traveler_with_link() {
        let (client, session) = client_for_echo().await;

        let draft = ProposalDraft::new("Parks", "More trees")
            .with_attachment(Attachment::Link("https://example.org/parks".to_string()));
        let created = publish(&client, &session, &draft).await.unwrap();

        let fields = &created["fields"];
        assert_eq!(fields["userName"], "Traveler");
        assert_eq!(fields["userInitials"], "TR");
        assert_eq!(fields["author_type"], "human");
        assert_eq!(fields["link"], "https://example.org/parks");
        assert!(created["files"].as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_backend() {
        let (client, session) = client_for_echo().await;
        let err = publish(&client, &session, &ProposalDraft::new("", "body"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "A title is required.");
    }
}
