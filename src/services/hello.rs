/*
 * Responsibility
 * - サンプルの業務ロジック (挨拶の生成・保存・取得)
 * - 永続化は HelloStore trait の裏に隠す (ここではインメモリ実装のみ)
 */
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ApiError;

pub const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Greeting {
    pub id: Uuid,
    pub name: String,
    pub created_by: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait HelloStore: Send + Sync {
    async fn insert(&self, greeting: Greeting) -> Result<(), StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<Greeting>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryHelloStore {
    greetings: RwLock<HashMap<Uuid, Greeting>>,
}

#[async_trait]
impl HelloStore for MemoryHelloStore {
    async fn insert(&self, greeting: Greeting) -> Result<(), StoreError> {
        self.greetings.write().await.insert(greeting.id, greeting);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Greeting>, StoreError> {
        Ok(self.greetings.read().await.get(&id).cloned())
    }
}

#[derive(Debug, Error)]
pub enum HelloError {
    #[error("invalid name: {0}")]
    InvalidName(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<HelloError> for ApiError {
    fn from(e: HelloError) -> Self {
        match e {
            HelloError::InvalidName(reason) => {
                ApiError::bad_request(reason).with_context("field", "name")
            }
            HelloError::Store(err) => {
                tracing::error!(error = %err, "hello store failure");
                ApiError::internal("internal server error")
            }
        }
    }
}

#[derive(Clone)]
pub struct HelloService {
    store: Arc<dyn HelloStore>,
}

impl HelloService {
    pub fn new(store: Arc<dyn HelloStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryHelloStore::default()))
    }

    pub fn say_hello(&self) -> &'static str {
        "Hello"
    }

    pub async fn save_hello(&self, name: &str, created_by: &str) -> Result<Greeting, HelloError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HelloError::InvalidName("name must not be empty"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(HelloError::InvalidName("name must be at most 64 characters"));
        }

        let greeting = Greeting {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_by: created_by.to_string(),
        };
        self.store.insert(greeting.clone()).await?;
        Ok(greeting)
    }

    pub async fn get_hello(&self, id: Uuid) -> Result<Option<Greeting>, HelloError> {
        Ok(self.store.get(id).await?)
    }
}
