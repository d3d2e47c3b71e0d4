use crate::domain::book::{Book, BookId, BookPatch, NewBook};
use crate::domain::error::BookError;
use crate::domain::repository::BookRepository;
use crate::domain::validation;
use async_trait::async_trait;

#[async_trait]
pub trait BookService: Send + Sync + 'static {
    async fn create(&self, input: NewBook) -> Result<Book, BookError>;
    async fn find_all(&self) -> Result<Vec<Book>, BookError>;
    /// Ids that cannot exist in the store are reported as `NotFound`.
    async fn find_one(&self, id: &str) -> Result<Book, BookError>;
    async fn update(&self, id: &str, patch: BookPatch) -> Result<Book, BookError>;
    async fn remove(&self, id: &str) -> Result<(), BookError>;
}

#[derive(Clone)]
pub struct BookServiceImpl<R: BookRepository> {
    repo: R,
}

impl<R: BookRepository> BookServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

fn parse_id(id: &str) -> Result<BookId, BookError> { BookId::parse(id).ok_or_else(|| BookError::not_found(id)) }

#[async_trait]
impl<R: BookRepository> BookService for BookServiceImpl<R> {
    async fn create(&self, input: NewBook) -> Result<Book, BookError> {
        validation::validate_new(&input)?;
        let book = self.repo.insert(input).await?;
        tracing::info!(id = %book.id, status = %book.status, "book created");
        Ok(book)
    }

    async fn find_all(&self) -> Result<Vec<Book>, BookError> { Ok(self.repo.list().await?) }

    async fn find_one(&self, id: &str) -> Result<Book, BookError> {
        let book_id = parse_id(id)?;
        self.repo.get(book_id).await?.ok_or_else(|| BookError::not_found(id))
    }

    async fn update(&self, id: &str, patch: BookPatch) -> Result<Book, BookError> {
        validation::validate_patch(&patch)?;
        let book_id = parse_id(id)?;
        let Some(mut merged) = self.repo.get(book_id).await? else { return Err(BookError::not_found(id)) };
        merged.apply(&patch);
        validation::status_rules(merged.status, merged.start_date, merged.end_date, merged.rating)?;
        merged.touch();

        // The checked record is written whole; a concurrent update wins or loses entirely.
        let book = self.repo.update(merged).await?.ok_or_else(|| BookError::not_found(id))?;
        tracing::info!(id = %book.id, status = %book.status, "book updated");
        Ok(book)
    }

    async fn remove(&self, id: &str) -> Result<(), BookError> {
        let book_id = parse_id(id)?;
        if !self.repo.delete(book_id).await? { return Err(BookError::not_found(id)); }
        tracing::info!(id = %book_id, "book removed");
        Ok(())
    }
}
