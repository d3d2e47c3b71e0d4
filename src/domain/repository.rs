use async_trait::async_trait;
use super::book::{Book, BookId, NewBook};

/// Keyed storage for books. Absence is reported as `None`/`false`, never as
/// an error.
#[async_trait]
pub trait BookRepository: Send + Sync + 'static {
    async fn init(&self) -> anyhow::Result<()>;
    /// Assigns the id and both timestamps.
    async fn insert(&self, input: NewBook) -> anyhow::Result<Book>;
    async fn get(&self, id: BookId) -> anyhow::Result<Option<Book>>;
    /// All books in insertion order.
    async fn list(&self) -> anyhow::Result<Vec<Book>>;
    /// Writes an already merged record over the stored one with the same id.
    /// Every mutable column is replaced, so a stored record is always one the
    /// caller checked as a whole.
    async fn update(&self, book: Book) -> anyhow::Result<Option<Book>>;
    async fn delete(&self, id: BookId) -> anyhow::Result<bool>;
}
