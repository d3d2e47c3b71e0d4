use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::{sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow}, Pool, Row, Sqlite};

use crate::domain::{
    book::{self, Book, BookId, NewBook, ReadingStatus},
    repository::BookRepository,
};

const COLUMNS: &str = "id, title, author, status, start_date, end_date, rating, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteBookRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteBookRepository {
    /// Opens the pool, creating the database file when it does not exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url {database_url}"))?
            .create_if_missing(true);
        // Every connection to an in-memory database sees its own empty store.
        let pool = if is_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool.connect_with(options).await.context("failed to open book store")?;
        Ok(Self { pool: Arc::new(pool) })
    }
}

fn is_memory(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

#[async_trait]
impl BookRepository for SqliteBookRepository {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS books (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'quero_ler',
                start_date TEXT,
                end_date TEXT,
                rating INTEGER CHECK (rating BETWEEN 1 AND 5),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn insert(&self, input: NewBook) -> Result<Book> {
        let book = Book::from_new(BookId::new(), input, book::now());
        sqlx::query(
            "INSERT INTO books (id, title, author, status, start_date, end_date, rating, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(book.id.to_string())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.status.as_str())
        .bind(book.start_date.map(|d| d.to_string()))
        .bind(book.end_date.map(|d| d.to_string()))
        .bind(book.rating.map(i64::from))
        .bind(timestamp(book.created_at))
        .bind(timestamp(book.updated_at))
        .execute(&*self.pool)
        .await?;
        Ok(book)
    }

    async fn get(&self, id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM books WHERE id = ?1"))
            .bind(id.to_string())
            .fetch_optional(&*self.pool)
            .await?;
        row.map(row_to_book).transpose()
    }

    async fn list(&self) -> Result<Vec<Book>> {
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM books ORDER BY rowid"))
            .fetch_all(&*self.pool)
            .await?;
        rows.into_iter().map(row_to_book).collect()
    }

    async fn update(&self, book: Book) -> Result<Option<Book>> {
        let result = sqlx::query(
            "UPDATE books SET title = ?2, author = ?3, status = ?4, start_date = ?5, end_date = ?6, rating = ?7, updated_at = ?8
             WHERE id = ?1",
        )
        .bind(book.id.to_string())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.status.as_str())
        .bind(book.start_date.map(|d| d.to_string()))
        .bind(book.end_date.map(|d| d.to_string()))
        .bind(book.rating.map(i64::from))
        .bind(timestamp(book.updated_at))
        .execute(&*self.pool)
        .await?;

        if result.rows_affected() == 0 { return Ok(None); }
        Ok(Some(book))
    }

    async fn delete(&self, id: BookId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?1")
            .bind(id.to_string())
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn timestamp(at: DateTime<Utc>) -> String { at.to_rfc3339_opts(SecondsFormat::Millis, true) }

fn row_to_book(row: SqliteRow) -> Result<Book> {
    let id_str: String = row.try_get("id")?;
    let status_str: String = row.try_get("status")?;
    let start_date: Option<String> = row.try_get("start_date")?;
    let end_date: Option<String> = row.try_get("end_date")?;
    let rating: Option<i64> = row.try_get("rating")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Book {
        id: BookId::parse(&id_str).with_context(|| format!("stored id {id_str} is not a uuid"))?,
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        status: status_str.parse::<ReadingStatus>().with_context(|| format!("book {id_str}"))?,
        start_date: start_date.as_deref().map(parse_stored_date).transpose()?,
        end_date: end_date.as_deref().map(parse_stored_date).transpose()?,
        rating: rating.map(u8::try_from).transpose().context("stored rating out of range")?,
        created_at: parse_stored_timestamp(&created_at)?,
        updated_at: parse_stored_timestamp(&updated_at)?,
    })
}

fn parse_stored_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("stored date {s} is malformed"))
}

fn parse_stored_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("stored timestamp {s} is malformed"))?
        .with_timezone(&Utc))
}
