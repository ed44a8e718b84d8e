use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use chefagent::providers::ProviderKind;
use chefagent::runtime_config::ChefConfig;
use chefagent::transcript::Verbosity;

#[derive(Debug, Parser)]
#[command(
    name = "chefagent",
    version,
    about = "Chat with a cooking agent that only knows your last grocery order"
)]
pub(crate) struct Cli {
    /// YAML config file (version: 1).
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,
    /// Debug-level logs on stderr (RUST_LOG overrides).
    #[arg(long, short, global = true)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Interactive chat on stdin/stdout.
    Chat(ChatArgs),
    /// Ask a single question and print the reply.
    Ask(AskArgs),
    /// Read a raw agent transcript and print the sanitized answer.
    Sanitize(SanitizeArgs),
    /// Look up recipes directly, without the agent.
    Recipes(RecipesArgs),
    /// Print build metadata.
    Version,
}

#[derive(Debug, Clone, Default, Args)]
pub(crate) struct ProviderArgs {
    #[arg(long, value_enum)]
    pub(crate) provider: Option<ProviderKind>,
    #[arg(long)]
    pub(crate) base_url: Option<String>,
    #[arg(long)]
    pub(crate) model: Option<String>,
    /// Environment variable holding the API key.
    #[arg(long)]
    pub(crate) api_key_env: Option<String>,
    #[arg(long)]
    pub(crate) max_tokens: Option<u32>,
    #[arg(long)]
    pub(crate) temperature: Option<f32>,
    #[arg(long)]
    pub(crate) max_steps: Option<usize>,
    /// How much of the agent's step log goes into the transcript.
    #[arg(long, value_enum)]
    pub(crate) verbosity: Option<Verbosity>,
    /// 0 disables the request timeout.
    #[arg(long)]
    pub(crate) http_timeout_ms: Option<u64>,
}

impl ProviderArgs {
    pub(crate) fn apply(&self, cfg: &mut ChefConfig) {
        if let Some(v) = self.provider {
            cfg.provider.kind = v;
        }
        if let Some(v) = &self.base_url {
            cfg.provider.base_url = v.clone();
        }
        if let Some(v) = &self.model {
            cfg.provider.model = v.clone();
        }
        if let Some(v) = &self.api_key_env {
            cfg.provider.api_key_env = v.clone();
        }
        if let Some(v) = self.max_tokens {
            cfg.provider.max_tokens = v;
        }
        if let Some(v) = self.temperature {
            cfg.provider.temperature = v;
        }
        if let Some(v) = self.max_steps {
            cfg.agent.max_steps = v;
        }
        if let Some(v) = self.verbosity {
            cfg.agent.verbosity = v;
        }
        if let Some(v) = self.http_timeout_ms {
            cfg.provider.http_timeout_ms = v;
        }
    }
}

#[derive(Debug, Args)]
pub(crate) struct ChatArgs {
    #[command(flatten)]
    pub(crate) provider: ProviderArgs,
    /// Start with debug replies (raw agent output, no sanitizing).
    #[arg(long)]
    pub(crate) debug: bool,
}

#[derive(Debug, Args)]
pub(crate) struct AskArgs {
    pub(crate) message: String,
    #[command(flatten)]
    pub(crate) provider: ProviderArgs,
    #[arg(long)]
    pub(crate) debug: bool,
}

#[derive(Debug, Args)]
pub(crate) struct SanitizeArgs {
    /// Transcript file; stdin when omitted.
    #[arg(long)]
    pub(crate) input: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub(crate) struct RecipesArgs {
    /// Cuisine key (mexicana, colombiana, argentina, española); all when omitted.
    #[arg(long)]
    pub(crate) cuisine: Option<String>,
    /// Available ingredient; repeatable. Defaults to the last order.
    #[arg(long = "ingredient")]
    pub(crate) ingredients: Vec<String>,
}
