//! Typed access to the books API.

use async_trait::async_trait;
use reqwest::StatusCode;
use shelf_app::books::models::{BookId, BookInput, BookResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Transport(e) => e.status(),
            ClientError::Status { status, .. } => Some(*status),
        }
    }
}

/// The five catalog operations as seen from a client.
#[async_trait]
pub trait BookApi: Send + Sync {
    async fn get_all_books(&self) -> Result<Vec<BookResponse>, ClientError>;

    async fn get_book_by_id(&self, id: BookId) -> Result<BookResponse, ClientError>;

    async fn create_book(&self, book: &BookInput) -> Result<BookResponse, ClientError>;

    async fn update_book(&self, id: BookId, book: &BookInput)
        -> Result<BookResponse, ClientError>;

    async fn delete_book(&self, id: BookId) -> Result<(), ClientError>;
}

/// `BookApi` over HTTP.
pub struct HttpBookApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBookApi {
    /// `base_url` points at the books collection, e.g. `http://localhost:8080/api/books`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn book_url(&self, id: BookId) -> String {
        format!("{}/{}", self.base_url, id)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status { status, body })
}

#[async_trait]
impl BookApi for HttpBookApi {
    async fn get_all_books(&self) -> Result<Vec<BookResponse>, ClientError> {
        async {
            let response = self.client.get(&self.base_url).send().await?;
            Ok::<_, ClientError>(ensure_success(response).await?.json().await?)
        }
        .await
        .inspect_err(|e: &ClientError| tracing::error!(error = %e, "error fetching books"))
    }

    async fn get_book_by_id(&self, id: BookId) -> Result<BookResponse, ClientError> {
        async {
            let response = self.client.get(self.book_url(id)).send().await?;
            Ok::<_, ClientError>(ensure_success(response).await?.json().await?)
        }
        .await
        .inspect_err(|e: &ClientError| tracing::error!(id, error = %e, "error fetching book"))
    }

    async fn create_book(&self, book: &BookInput) -> Result<BookResponse, ClientError> {
        async {
            let response = self.client.post(&self.base_url).json(book).send().await?;
            Ok::<_, ClientError>(ensure_success(response).await?.json().await?)
        }
        .await
        .inspect_err(|e: &ClientError| tracing::error!(error = %e, "error creating book"))
    }

    async fn update_book(
        &self,
        id: BookId,
        book: &BookInput,
    ) -> Result<BookResponse, ClientError> {
        async {
            let response = self.client.put(self.book_url(id)).json(book).send().await?;
            Ok::<_, ClientError>(ensure_success(response).await?.json().await?)
        }
        .await
        .inspect_err(|e: &ClientError| tracing::error!(id, error = %e, "error updating book"))
    }

    async fn delete_book(&self, id: BookId) -> Result<(), ClientError> {
        async {
            let response = self.client.delete(self.book_url(id)).send().await?;
            ensure_success(response).await?;
            Ok::<_, ClientError>(())
        }
        .await
        .inspect_err(|e: &ClientError| tracing::error!(id, error = %e, "error deleting book"))
    }
}
