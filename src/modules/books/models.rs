use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// Store-assigned book identifier.
pub type BookId = i64;

/// A book as persisted in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
    /// Absent until the first update.
    pub updated_at: Option<OffsetDateTime>,
}

/// Request body for both creating and replacing a book.
///
/// Missing or null `title`/`author` deserialize as empty strings so that they
/// surface as validation failures rather than decoding errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInput {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BookInput {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            description,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Book as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub updated_at: Option<OffsetDateTime>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            description: book.description,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

/// Body of a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub message: String,
    pub id: BookId,
}

impl DeleteConfirmation {
    pub fn for_book(book: &Book) -> Self {
        Self {
            message: format!("Book '{}' has been successfully deleted", book.title),
            id: book.id,
        }
    }
}
