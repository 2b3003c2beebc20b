use async_trait::async_trait;
use slide_client::ClientError;
use slide_client::GenerationStream;
use slide_client::SlidesClient;
use slide_protocol::GenerateRequest;
use slide_protocol::Presentation;
use slide_protocol::SlidePatch;
use slide_protocol::TemplateGenerateRequest;

/// What to generate from.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationInput {
    Text(GenerateRequest),
    Template {
        template_id: i64,
        request: TemplateGenerateRequest,
        /// Known ahead of time from the template's slide list.
        slide_count: Option<u32>,
    },
}

impl GenerationInput {
    pub fn theme(&self) -> Option<String> {
        match self {
            GenerationInput::Text(request) => request.theme.clone(),
            GenerationInput::Template { request, .. } => request.theme.clone(),
        }
    }

    pub fn slide_count(&self) -> Option<u32> {
        match self {
            GenerationInput::Text(request) => request.slide_count,
            GenerationInput::Template { slide_count, .. } => *slide_count,
        }
    }
}

/// Remote side of a session: the generation stream plus the two
/// persistence calls the session itself needs.
#[async_trait]
pub trait SlidesBackend: Send + Sync {
    async fn open_generation(
        &self,
        input: &GenerationInput,
    ) -> Result<GenerationStream, ClientError>;

    async fn get_presentation(&self, id: i64) -> Result<Presentation, ClientError>;

    async fn update_slide(
        &self,
        presentation_id: i64,
        index: usize,
        patch: &SlidePatch,
    ) -> Result<(), ClientError>;
}

#[async_trait]
impl SlidesBackend for SlidesClient {
    async fn open_generation(
        &self,
        input: &GenerationInput,
    ) -> Result<GenerationStream, ClientError> {
        match input {
            GenerationInput::Text(request) => self.generate_stream(request).await,
            GenerationInput::Template {
                template_id,
                request,
                ..
            } => {
                self.generate_from_template_stream(*template_id, request)
                    .await
            }
        }
    }

    async fn get_presentation(&self, id: i64) -> Result<Presentation, ClientError> {
        SlidesClient::get_presentation(self, id).await
    }

    async fn update_slide(
        &self,
        presentation_id: i64,
        index: usize,
        patch: &SlidePatch,
    ) -> Result<(), ClientError> {
        SlidesClient::update_slide(self, presentation_id, index, patch).await?;
        Ok(())
    }
}
