use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::domain::book::{Book, BookId};
use crate::http::{routing::API_PREFIX, types::ApiError};

pub const DEFAULT_API_URL: &str = "http://localhost:3001";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered {status}: {message}")]
    Api { status: StatusCode, message: String },
}

/// HTTP client for the book API.
#[derive(Clone)]
pub struct BooksClient {
    http: reqwest::Client,
    base_url: String,
}

impl BooksClient {
    /// `base_url` is the server root, without the API prefix.
    pub fn new(base_url: &str) -> Self {
        Self { http: reqwest::Client::new(), base_url: format!("{}{API_PREFIX}", base_url.trim_end_matches('/')) }
    }

    /// Uses `BOOKS_API_URL`, falling back to the local default.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::new(&std::env::var("BOOKS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()))
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    fn books_url(&self, id: Option<&BookId>) -> String {
        match id {
            Some(id) => format!("{}/books/{id}", self.base_url),
            None => format!("{}/books", self.base_url),
        }
    }

    pub async fn list(&self) -> Result<Vec<Book>, ClientError> {
        json(self.http.get(self.books_url(None)).send().await?).await
    }

    pub async fn get(&self, id: &BookId) -> Result<Book, ClientError> {
        json(self.http.get(self.books_url(Some(id))).send().await?).await
    }

    pub async fn create(&self, body: &Value) -> Result<Book, ClientError> {
        json(self.http.post(self.books_url(None)).json(body).send().await?).await
    }

    pub async fn update(&self, id: &BookId, body: &Value) -> Result<Book, ClientError> {
        json(self.http.put(self.books_url(Some(id))).json(body).send().await?).await
    }

    pub async fn delete(&self, id: &BookId) -> Result<(), ClientError> {
        success(self.http.delete(self.books_url(Some(id))).send().await?).await?;
        Ok(())
    }
}

async fn json<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    Ok(success(resp).await?.json().await?)
}

async fn success(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() { return Ok(resp); }
    let text = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiError>(&text) {
        Ok(err) => err.message,
        Err(_) => text,
    };
    Err(ClientError::Api { status, message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_carry_the_api_prefix() {
        let client = BooksClient::new("http://localhost:3001/");
        assert_eq!(client.base_url(), "http://localhost:3001/api");
        assert_eq!(client.books_url(None), "http://localhost:3001/api/books");
        let id = BookId::parse("6f1c2f1e-3b7a-4d2c-9a51-0d7f3e2b8c11").unwrap();
        assert_eq!(client.books_url(Some(&id)), "http://localhost:3001/api/books/6f1c2f1e-3b7a-4d2c-9a51-0d7f3e2b8c11");
    }
}
