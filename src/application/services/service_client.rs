use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::{
    domain::{
        classify, is_quota_message, ClientError, ConnectionStatus, ContentPart, EmbeddingInput,
        Embeddings, Generated, QUOTA_LIMIT_MESSAGE,
    },
    infrastructure::imaging::load_image,
};

/// Model used for answers and OCR unless configured otherwise.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Model used by `verify_connection` unless configured otherwise.
pub const DEFAULT_VERIFY_MODEL: &str = "gemini-flash";

const VERIFY_PROMPT: &str = "Test connection";

/// Model names the client talks to.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub model: String,
    pub verify_model: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            verify_model: DEFAULT_VERIFY_MODEL.into(),
        }
    }
}

impl ServiceConfig {
    pub fn new(model: impl Into<String>, verify_model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            verify_model: verify_model.into(),
        }
    }
}

/// Abstraction over the remote generative API.
pub trait GenerativeModel: Send + Sync {
    /// Send the ordered parts to `model`. `Ok(None)` means the call succeeded
    /// but produced no text.
    fn generate(&self, model: &str, parts: &[ContentPart]) -> Result<Option<String>, ClientError>;
}

/// Abstraction over any sentence-embedding engine (FastEmbed, hash embedder, etc).
pub trait EmbeddingEngine: Send + Sync {
    /// Embed every text, returning vectors in input order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ClientError>;

    fn embed(&self, text: &str) -> Result<Vec<f32>, ClientError> {
        self.embed_batch(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::embedding("engine returned no embedding"))
    }

    fn model_name(&self) -> &str;

    fn dims(&self) -> Option<usize> {
        None
    }
}

/// Thin client forwarding prompts and images to the generative API and text
/// to the embedding engine.
pub struct ServiceClient {
    generator: Arc<dyn GenerativeModel>,
    embedder: Arc<dyn EmbeddingEngine>,
    config: ServiceConfig,
}

impl ServiceClient {
    pub fn new(
        generator: Arc<dyn GenerativeModel>,
        embedder: Arc<dyn EmbeddingEngine>,
        config: ServiceConfig,
    ) -> Self {
        info!(
            model = %config.model,
            verify_model = %config.verify_model,
            embedding_model = %embedder.model_name(),
            "service client ready"
        );
        Self {
            generator,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn embedding_dimensions(&self) -> Option<usize> {
        self.embedder.dims()
    }

    /// Send a free-form prompt. Quota failures come back as
    /// [`Generated::QuotaLimited`]; everything else propagates.
    pub fn answer(&self, prompt: &str, language: &str) -> Result<Generated, ClientError> {
        debug!(model = %self.config.model, language, "answering prompt");
        match self
            .generator
            .generate(&self.config.model, &[ContentPart::text(prompt)])
        {
            Ok(text) => Ok(Generated::Text(text.unwrap_or_default())),
            Err(err) => {
                warn!(error = %err, "answer request failed");
                classify(err)
            }
        }
    }

    /// Transcribe the text visible in the image at `image_path`.
    ///
    /// Image load failures are returned as [`ClientError::ImageLoad`] and are
    /// never treated as quota conditions.
    pub fn extract_text(
        &self,
        image_path: impl AsRef<Path>,
        language: &str,
    ) -> Result<Generated, ClientError> {
        let image_path = image_path.as_ref();
        let image = load_image(image_path).map_err(|err| {
            error!(path = %image_path.display(), error = %err, "image conversion failed");
            err
        })?;

        debug!(
            model = %self.config.model,
            language,
            mime = %image.mime_type,
            bytes = image.bytes.len(),
            "extracting text from image"
        );
        let parts = [
            ContentPart::Text(ocr_prompt(language)),
            ContentPart::Image(image),
        ];
        match self.generator.generate(&self.config.model, &parts) {
            Ok(Some(text)) => Ok(Generated::Text(text.trim().to_string())),
            Ok(None) => Ok(Generated::Text(String::new())),
            Err(err) => {
                warn!(error = %err, "ocr request failed");
                classify(err)
            }
        }
    }

    /// Embed one string or a list of strings. Failures are logged and
    /// reported as an empty result.
    pub fn get_embeddings(&self, input: impl Into<EmbeddingInput>) -> Embeddings {
        match self.try_embeddings(input.into()) {
            Ok(embeddings) => embeddings,
            Err(err) => {
                error!(error = %err, "embedding generation failed");
                Embeddings::empty()
            }
        }
    }

    fn try_embeddings(&self, input: EmbeddingInput) -> Result<Embeddings, ClientError> {
        match input {
            EmbeddingInput::Single(text) => self.embedder.embed(&text).map(Embeddings::Single),
            EmbeddingInput::Batch(texts) if texts.is_empty() => Ok(Embeddings::empty()),
            EmbeddingInput::Batch(texts) => {
                let vectors = self.embedder.embed_batch(&texts)?;
                if vectors.len() != texts.len() {
                    return Err(ClientError::embedding(format!(
                        "expected {} embeddings, got {}",
                        texts.len(),
                        vectors.len()
                    )));
                }
                Ok(Embeddings::Batch(vectors))
            }
        }
    }

    /// Check the API with a tiny prompt against the verification model.
    pub fn verify_connection(&self) -> ConnectionStatus {
        match self
            .generator
            .generate(&self.config.verify_model, &[ContentPart::text(VERIFY_PROMPT)])
        {
            Ok(_) => ConnectionStatus::Connected,
            Err(err) => {
                warn!(
                    model = %self.config.verify_model,
                    error = %err,
                    "API connection verification failed"
                );
                if is_quota_message(&err.to_string()) {
                    ConnectionStatus::QuotaLimited(QUOTA_LIMIT_MESSAGE.to_string())
                } else {
                    ConnectionStatus::Failed
                }
            }
        }
    }
}

pub(crate) fn ocr_prompt(language: &str) -> String {
    format!("What's written in this image in {language}. Give me only the OCR text.")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use parking_lot::Mutex;

    use super::*;
    use crate::infrastructure::SimpleEmbedEngine;

    /// Scripted generator recording every call it receives.
    struct FakeGenerator {
        reply: Mutex<Option<Result<Option<String>, ClientError>>>,
        calls: Mutex<Vec<(String, Vec<ContentPart>)>>,
    }

    impl FakeGenerator {
        fn replying(reply: Result<Option<String>, ClientError>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, Vec<ContentPart>)> {
            self.calls.lock().clone()
        }
    }

    impl GenerativeModel for FakeGenerator {
        fn generate(
            &self,
            model: &str,
            parts: &[ContentPart],
        ) -> Result<Option<String>, ClientError> {
            self.calls.lock().push((model.to_string(), parts.to_vec()));
            self.reply
                .lock()
                .take()
                .unwrap_or_else(|| Err(ClientError::other("no scripted reply left")))
        }
    }

    struct FailingEmbedder;

    impl EmbeddingEngine for FailingEmbedder {
        fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, ClientError> {
            Err(ClientError::embedding("model weights missing"))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    const DIMS: usize = 32;

    fn client_with(generator: Arc<FakeGenerator>) -> ServiceClient {
        let embedder = SimpleEmbedEngine::try_new("test/simple", DIMS).unwrap();
        ServiceClient::new(generator, Arc::new(embedder), ServiceConfig::default())
    }

    fn png_file() -> tempfile::NamedTempFile {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([255, 255, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(bytes.get_ref()).unwrap();
        file
    }

    #[test]
    fn answer_returns_model_text() {
        let generator = FakeGenerator::replying(Ok(Some("Paris".into())));
        let client = client_with(generator.clone());

        let answer = client.answer("Capital of France?", "English").unwrap();
        assert_eq!(answer, Generated::Text("Paris".into()));

        let calls = generator.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, DEFAULT_MODEL);
        assert_eq!(calls[0].1, vec![ContentPart::text("Capital of France?")]);
    }

    #[test]
    fn answer_converts_quota_failures() {
        for message in [
            "429 Too Many Requests",
            "Quota exceeded for requests per day",
            "RESOURCE_EXHAUSTED",
            "You have reached the FREE LIMIT",
        ] {
            let generator = FakeGenerator::replying(Err(ClientError::remote(None, message)));
            let answer = client_with(generator).answer("hi", "English").unwrap();
            assert_eq!(answer.as_str(), QUOTA_LIMIT_MESSAGE);
            assert!(answer.is_quota_limited());
        }
    }

    #[test]
    fn answer_propagates_other_failures_unchanged() {
        let generator = FakeGenerator::replying(Err(ClientError::remote(
            Some(500),
            "500 INTERNAL: upstream failure",
        )));
        let err = client_with(generator).answer("hi", "English").unwrap_err();
        match err {
            ClientError::Remote { status, message } => {
                assert_eq!(status, Some(500));
                assert_eq!(message, "500 INTERNAL: upstream failure");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn extract_text_sends_prompt_and_image_and_trims() {
        let generator = FakeGenerator::replying(Ok(Some("  Hello world \n".into())));
        let client = client_with(generator.clone());
        let file = png_file();

        let text = client.extract_text(file.path(), "German").unwrap();
        assert_eq!(text, Generated::Text("Hello world".into()));

        let calls = generator.calls();
        let parts = &calls[0].1;
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            ContentPart::text("What's written in this image in German. Give me only the OCR text.")
        );
        match &parts[1] {
            ContentPart::Image(image) => assert_eq!(image.mime_type, "image/png"),
            other => panic!("expected image part, got {other:?}"),
        }
    }

    #[test]
    fn extract_text_returns_empty_string_without_model_text() {
        let generator = FakeGenerator::replying(Ok(None));
        let file = png_file();
        let text = client_with(generator).extract_text(file.path(), "English").unwrap();
        assert_eq!(text, Generated::Text(String::new()));
    }

    #[test]
    fn extract_text_converts_quota_failures() {
        let generator =
            FakeGenerator::replying(Err(ClientError::remote(Some(429), "429 Too Many Requests")));
        let file = png_file();
        let text = client_with(generator).extract_text(file.path(), "English").unwrap();
        assert_eq!(text.as_str(), QUOTA_LIMIT_MESSAGE);
    }

    #[test]
    fn extract_text_propagates_other_failures_unchanged() {
        let generator = FakeGenerator::replying(Err(ClientError::remote(
            Some(400),
            "400 INVALID_ARGUMENT: image too large",
        )));
        let client = client_with(generator.clone());
        let file = png_file();

        let err = client.extract_text(file.path(), "English").unwrap_err();
        match err {
            ClientError::Remote { status, message } => {
                assert_eq!(status, Some(400));
                assert_eq!(message, "400 INVALID_ARGUMENT: image too large");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(generator.calls().len(), 1);
    }

    #[test]
    fn extract_text_propagates_corrupt_images_without_calling_the_model() {
        let generator = FakeGenerator::replying(Ok(Some("unused".into())));
        let client = client_with(generator.clone());
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"429 definitely not an image").unwrap();

        let err = client.extract_text(file.path(), "English").unwrap_err();
        assert!(matches!(err, ClientError::ImageLoad(_)));
        assert!(generator.calls().is_empty());
    }

    #[test]
    fn extract_text_propagates_missing_files() {
        let generator = FakeGenerator::replying(Ok(Some("unused".into())));
        let err = client_with(generator)
            .extract_text("/nonexistent/scan.png", "English")
            .unwrap_err();
        assert!(matches!(err, ClientError::ImageLoad(_)));
    }

    #[test]
    fn embeddings_follow_input_shape() {
        let client = client_with(FakeGenerator::replying(Ok(None)));

        match client.get_embeddings("hello") {
            Embeddings::Single(vector) => assert_eq!(vector.len(), DIMS),
            other => panic!("expected single vector, got {other:?}"),
        }

        let a = client.get_embeddings("a").into_vectors();
        let b = client.get_embeddings("b").into_vectors();
        match client.get_embeddings(vec!["a", "b"]) {
            Embeddings::Batch(vectors) => {
                assert_eq!(vectors.len(), 2);
                assert!(vectors.iter().all(|v| v.len() == DIMS));
                assert_eq!(vectors[0], a[0]);
                assert_eq!(vectors[1], b[0]);
            }
            other => panic!("expected batch, got {other:?}"),
        }
    }

    #[test]
    fn embeddings_of_an_empty_list_are_empty() {
        let client = client_with(FakeGenerator::replying(Ok(None)));
        assert_eq!(client.get_embeddings(Vec::<String>::new()), Embeddings::empty());
    }

    #[test]
    fn embedding_failures_degrade_to_empty() {
        let client = ServiceClient::new(
            FakeGenerator::replying(Ok(None)),
            Arc::new(FailingEmbedder),
            ServiceConfig::default(),
        );
        assert!(client.get_embeddings("hello").is_empty());
        assert_eq!(client.get_embeddings(vec!["a", "b"]), Embeddings::empty());
    }

    #[test]
    fn verify_connection_reports_success_on_the_verify_model() {
        let generator = FakeGenerator::replying(Ok(Some("ok".into())));
        let client = ServiceClient::new(
            generator.clone(),
            Arc::new(SimpleEmbedEngine::default()),
            ServiceConfig::new("gemini-2.5-flash", "gemini-check"),
        );
        assert_eq!(client.verify_connection(), ConnectionStatus::Connected);

        let calls = generator.calls();
        assert_eq!(calls[0].0, "gemini-check");
        assert_eq!(calls[0].1, vec![ContentPart::text(VERIFY_PROMPT)]);
    }

    #[test]
    fn verify_connection_reports_generic_failure() {
        let generator = FakeGenerator::replying(Err(ClientError::remote(
            Some(404),
            "404 NOT_FOUND: models/gemini-flash is not found",
        )));
        assert_eq!(client_with(generator).verify_connection(), ConnectionStatus::Failed);
    }

    #[test]
    fn verify_connection_reports_quota_sentence() {
        let generator = FakeGenerator::replying(Err(ClientError::remote(
            Some(429),
            "429 Too Many Requests",
        )));
        assert_eq!(
            client_with(generator).verify_connection(),
            ConnectionStatus::QuotaLimited(QUOTA_LIMIT_MESSAGE.to_string())
        );
    }
}
