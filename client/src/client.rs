use futures_util::Stream;
use futures_util::StreamExt;
use reqwest::Response;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use slide_protocol::GenerateRequest;
use slide_protocol::GenerationEvent;
use slide_protocol::Presentation;
use slide_protocol::PresentationSummary;
use slide_protocol::PresentationUpdate;
use slide_protocol::ShareLink;
use slide_protocol::SlidePatch;
use slide_protocol::Template;
use slide_protocol::TemplateCreate;
use slide_protocol::TemplateGenerateRequest;
use slide_protocol::TemplateSummary;
use slide_protocol::TemplateUpdate;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::error::ClientError;
use crate::interpret::events;

/// Buffered events between the reader task and the consumer.
const STREAM_CAPACITY: usize = 64;

/// Events of one generation run, read by a background task.
///
/// Dropping the stream aborts the reader, which drops the response body even
/// while the server is silent.
pub struct GenerationStream {
    rx: mpsc::Receiver<Result<GenerationEvent, ClientError>>,
    reader: Option<AbortHandle>,
}

impl GenerationStream {
    /// `None` once the server closed the body or a transport error was
    /// delivered.
    pub async fn next(&mut self) -> Option<Result<GenerationEvent, ClientError>> {
        self.rx.recv().await
    }

    /// Wraps an already-decoded event source, mostly for tests and replays.
    pub fn from_receiver(rx: mpsc::Receiver<Result<GenerationEvent, ClientError>>) -> Self {
        Self { rx, reader: None }
    }

    /// Decodes `body` on a spawned task, `STREAM_CAPACITY` events ahead of
    /// the consumer.
    pub fn spawn<S, B, E>(body: S) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
        E: Into<ClientError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        let reader = tokio::spawn(async move {
            let mut stream = Box::pin(events(body));
            let mut delivered = 0usize;
            while let Some(item) = stream.next().await {
                let failed = item.is_err();
                if tx.send(item.map_err(Into::into)).await.is_err() {
                    tracing::debug!("generation stream dropped by consumer after {delivered} events");
                    return;
                }
                if failed {
                    tracing::warn!("generation stream failed after {delivered} events");
                    return;
                }
                delivered += 1;
            }
            tracing::debug!("generation stream finished after {delivered} events");
        });
        Self {
            rx,
            reader: Some(reader.abort_handle()),
        }
    }
}

impl Drop for GenerationStream {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

#[derive(Debug, Clone)]
pub struct SlidesClient {
    http: reqwest::Client,
    base_url: String,
}

impl SlidesClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn generate_stream(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerationStream, ClientError> {
        self.open_stream("/api/v1/slides/generate/stream", request)
            .await
    }

    pub async fn generate_from_template_stream(
        &self,
        template_id: i64,
        request: &TemplateGenerateRequest,
    ) -> Result<GenerationStream, ClientError> {
        self.open_stream(
            &format!("/api/v1/templates/{template_id}/generate/stream"),
            request,
        )
        .await
    }

    async fn open_stream<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<GenerationStream, ClientError> {
        let url = self.url(path);
        tracing::info!("opening generation stream: {url}");
        let resp = self.http.post(&url).json(body).send().await?;
        let resp = check(resp).await?;
        Ok(GenerationStream::spawn(resp.bytes_stream()))
    }

    pub async fn list_presentations(
        &self,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<PresentationSummary>, ClientError> {
        self.get_json(&format!("/api/v1/presentations?skip={skip}&limit={limit}"))
            .await
    }

    pub async fn get_presentation(&self, id: i64) -> Result<Presentation, ClientError> {
        self.get_json(&format!("/api/v1/presentations/{id}")).await
    }

    pub async fn update_presentation(
        &self,
        id: i64,
        update: &PresentationUpdate,
    ) -> Result<Presentation, ClientError> {
        let resp = self
            .http
            .put(self.url(&format!("/api/v1/presentations/{id}")))
            .json(update)
            .send()
            .await?;
        decode(check(resp).await?).await
    }

    pub async fn delete_presentation(&self, id: i64) -> Result<(), ClientError> {
        let resp = self
            .http
            .delete(self.url(&format!("/api/v1/presentations/{id}")))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    /// `PUT` the changed fields of one slide. Returns the server's copy of
    /// the whole presentation.
    pub async fn update_slide(
        &self,
        presentation_id: i64,
        slide_index: usize,
        patch: &SlidePatch,
    ) -> Result<Presentation, ClientError> {
        let url = self.url(&format!(
            "/api/v1/presentations/{presentation_id}/slides/{slide_index}"
        ));
        let resp = self.http.put(url).json(patch).send().await?;
        decode(check(resp).await?).await
    }

    pub async fn create_share_link(&self, presentation_id: i64) -> Result<ShareLink, ClientError> {
        let resp = self
            .http
            .post(self.url(&format!("/api/v1/export/link/{presentation_id}")))
            .send()
            .await?;
        decode(check(resp).await?).await
    }

    /// The PDF is served directly; callers only need its address.
    pub fn pdf_export_url(&self, presentation_id: i64) -> String {
        self.url(&format!("/api/v1/export/pdf/{presentation_id}"))
    }

    pub async fn list_templates(&self) -> Result<Vec<TemplateSummary>, ClientError> {
        self.get_json("/api/v1/templates").await
    }

    pub async fn get_template(&self, id: i64) -> Result<Template, ClientError> {
        self.get_json(&format!("/api/v1/templates/{id}")).await
    }

    pub async fn create_template(&self, template: &TemplateCreate) -> Result<Template, ClientError> {
        let resp = self
            .http
            .post(self.url("/api/v1/templates"))
            .json(template)
            .send()
            .await?;
        decode(check(resp).await?).await
    }

    pub async fn update_template(
        &self,
        id: i64,
        update: &TemplateUpdate,
    ) -> Result<Template, ClientError> {
        let resp = self
            .http
            .put(self.url(&format!("/api/v1/templates/{id}")))
            .json(update)
            .send()
            .await?;
        decode(check(resp).await?).await
    }

    pub async fn delete_template(&self, id: i64) -> Result<(), ClientError> {
        let resp = self
            .http
            .delete(self.url(&format!("/api/v1/templates/{id}")))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self.http.get(self.url(path)).send().await?;
        decode(check(resp).await?).await
    }
}

async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let detail = error_detail(status.as_u16(), &text);
    tracing::warn!("http {status}: {detail}");
    Err(ClientError::Http {
        status: status.as_u16(),
        detail,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn error_detail(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| match value.get("detail") {
            Some(Value::String(detail)) => Some(detail.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        })
        .unwrap_or_else(|| format!("HTTP {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[test]
    fn error_detail_prefers_server_message() {
        assert_eq!(
            error_detail(404, r#"{"detail":"Presentation not found"}"#),
            "Presentation not found"
        );
        assert_eq!(error_detail(502, "<html>bad gateway</html>"), "HTTP 502");
        assert_eq!(error_detail(500, r#"{"detail":null}"#), "HTTP 500");
    }

    #[test]
    fn urls_are_joined_without_double_slash() {
        let client = SlidesClient::new("http://example.test:18000/");
        assert_eq!(client.base_url(), "http://example.test:18000");
        assert_eq!(
            client.pdf_export_url(12),
            "http://example.test:18000/api/v1/export/pdf/12"
        );
    }

    #[tokio::test]
    async fn stream_from_receiver_ends_when_sender_drops() {
        let (tx, rx) = mpsc::channel(4);
        let mut stream = GenerationStream::from_receiver(rx);
        tx.send(Ok(GenerationEvent::Error { message: None }))
            .await
            .unwrap();
        drop(tx);
        assert!(matches!(stream.next().await, Some(Ok(GenerationEvent::Error { .. }))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn spawned_stream_decodes_the_body() {
        let body: Vec<Result<Vec<u8>, ClientError>> = vec![
            Ok(b"data: {\"type\":\"thinking\",\"message\":\"hi\"}\n\n".to_vec()),
            Ok(b"data: {\"type\":\"error\"}\n\n".to_vec()),
        ];
        let mut stream = GenerationStream::spawn(stream::iter(body));
        assert!(matches!(
            stream.next().await,
            Some(Ok(GenerationEvent::Thinking { .. }))
        ));
        assert!(matches!(stream.next().await, Some(Ok(GenerationEvent::Error { .. }))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn dropping_the_stream_stops_a_stalled_reader() {
        // the body holds `guard` until the reader task is gone
        let (guard, released) = oneshot::channel::<()>();
        let body = stream::unfold(guard, |guard| async move {
            std::future::pending::<()>().await;
            Some((Ok::<Vec<u8>, ClientError>(Vec::new()), guard))
        });
        let stream = GenerationStream::spawn(body);
        tokio::task::yield_now().await;
        drop(stream);
        let released = tokio::time::timeout(Duration::from_secs(1), released).await;
        assert!(released.is_ok());
    }
}
