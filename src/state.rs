/*
 * Responsibility
 * - 各 endpoint に渡す共有コンテキスト (AppState)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 * - handle(): 認可要件 + endpoint → Router に登録できる Service
 */
use std::sync::Arc;

use crate::handler::{self, Endpoint, RequestHandler, Requirement};
use crate::services::{auth::TokenCodec, hello::HelloService};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<TokenCodec>,
    pub hello: HelloService,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(auth: Arc<TokenCodec>, hello: HelloService, max_body_bytes: usize) -> Self {
        Self {
            auth,
            hello,
            max_body_bytes,
        }
    }

    pub fn handle<E>(&self, requirement: Requirement, endpoint: E) -> RequestHandler<AppState, E>
    where
        E: Endpoint<AppState>,
    {
        handler::handle(self.auth.clone(), self.clone(), requirement, endpoint)
    }
}
