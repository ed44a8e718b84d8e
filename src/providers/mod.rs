use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::types::{GenerateRequest, GenerateResponse};

pub mod mock;
pub mod openai_compat;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Mock,
    OpenaiCompat,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Mock => "mock",
            ProviderKind::OpenaiCompat => "openai_compat",
        }
    }
}

#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn generate(&self, req: GenerateRequest) -> anyhow::Result<GenerateResponse>;
}

#[async_trait]
impl<P: ModelProvider + ?Sized> ModelProvider for Box<P> {
    async fn generate(&self, req: GenerateRequest) -> anyhow::Result<GenerateResponse> {
        (**self).generate(req).await
    }
}
