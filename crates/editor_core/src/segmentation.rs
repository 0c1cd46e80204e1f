//! Turning raw narrative text into talk actions.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::ActionId,
    error::ApiException,
    project::{Action, ProjectFile, TalkAction},
    protocol::{SegmentTextRequest, SegmentTextResponse, ServiceReply},
    text::{segment_paragraphs, split_speaker_prefix},
};
use tracing::debug;
use url::Url;

use crate::roster::CharacterRoster;

#[async_trait]
pub trait TextSegmenter: Send + Sync {
    async fn segment(&self, text: &str) -> Result<Vec<String>>;
}

/// Splits in-process; no network involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSegmenter;

#[async_trait]
impl TextSegmenter for LocalSegmenter {
    async fn segment(&self, text: &str) -> Result<Vec<String>> {
        Ok(segment_paragraphs(text))
    }
}

/// Calls `POST {base}/api/segment-text`.
#[derive(Debug, Clone)]
pub struct HttpSegmenter {
    http: Client,
    endpoint: Url,
}

impl HttpSegmenter {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url).with_context(|| format!("invalid base url {base_url}"))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join("api/segment-text")
            .context("failed to build segmentation endpoint")?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl TextSegmenter for HttpSegmenter {
    async fn segment(&self, text: &str) -> Result<Vec<String>> {
        debug!(endpoint = %self.endpoint, bytes = text.len(), "requesting segmentation");
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&SegmentTextRequest {
                text: text.to_string(),
            })
            .send()
            .await
            .context("segmentation request failed")?;

        let status = response.status();
        let reply: ServiceReply<SegmentTextResponse> = response
            .json()
            .await
            .with_context(|| format!("unreadable segmentation response ({status})"))?;

        match reply {
            ServiceReply::Ok(body) if status.is_success() => Ok(body.segments),
            ServiceReply::Ok(_) => Err(anyhow!("segmentation service returned {status}")),
            ServiceReply::Error(err) => Err(ApiException::from(err).into()),
        }
    }
}

/// One talk action per segment. A leading `Name:` whose name is in the roster
/// becomes the action's speaker and is stripped from the text.
pub fn project_from_segments(segments: &[String], roster: &CharacterRoster) -> ProjectFile {
    let actions = segments
        .iter()
        .map(|segment| {
            let (speakers, text) = match split_speaker_prefix(segment) {
                Some((name, rest)) => match roster.speaker_for(name) {
                    Some(speaker) => (vec![speaker], rest.to_string()),
                    None => (Vec::new(), segment.clone()),
                },
                None => (Vec::new(), segment.clone()),
            };
            Action::Talk(TalkAction::new(ActionId::generate("action"), text, speakers))
        })
        .collect();
    ProjectFile::new(actions)
}

#[cfg(test)]
#[path = "tests/segmentation_tests.rs"]
mod tests;
