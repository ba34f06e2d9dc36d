use std::path::Path;

use anyhow::bail;
use clap::Parser;
use reqwest::Url;

pub const DEFAULT_API_ENDPOINT: &str = "https://openrouter.ai/api/v1";
pub const API_KEY_VAR: &str = "ASKLLM_API_KEY";
pub const DEFAULTS_VAR: &str = "ASKLLM_DEFAULTS";

/// Send a prompt to an LLM provider.
///
/// Options stored with `--store` are reapplied on later runs unless given
/// again on the command line.
#[derive(Parser, Debug, Clone)]
#[clap(name = "askllm", version)]
pub struct CliArgs {
    /// The model identifier to send the request to
    #[clap(long, value_name = "model_name")]
    pub model: Option<String>,

    /// The prompt text to send to the model
    #[clap(long, value_name = "prompt")]
    pub prompt: Option<String>,

    /// Optional file path that supplies the prompt text
    #[clap(long, value_name = "path")]
    pub input_file: Option<String>,

    /// Optional file path to write the response to
    #[clap(long, value_name = "path")]
    pub output_file: Option<String>,

    /// Optional console color name used when rendering responses
    #[clap(long, value_name = "color")]
    pub color: Option<String>,

    /// Store provided options (excluding --prompt) for future runs
    #[clap(long)]
    pub store: bool,

    /// API key for the chat endpoint
    #[clap(long, env = "ASKLLM_API_KEY", hide_env_values = true, hide = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[clap(long, env = "ASKLLM_API_ENDPOINT", hide = true)]
    pub api_endpoint: Option<String>,
}

impl CliArgs {
    /// Check that the invocation carries enough to build a request.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let has_prompt = !is_blank(self.prompt.as_deref());
        let has_input_file = !is_blank(self.input_file.as_deref());

        if !has_prompt && !has_input_file {
            bail!(
                "A prompt must be provided or an input file must be specified using --input-file."
            );
        }

        if let Some(input_file) = self.input_file.as_deref().filter(|_| has_input_file) {
            if !Path::new(input_file).is_file() {
                bail!("The file specified by --input-file does not exist.");
            }
        }

        if is_blank(self.model.as_deref()) {
            bail!("A model must be specified using --model.");
        }

        Ok(())
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or_default().trim()
    }

    pub fn endpoint_settings(&self) -> EndpointSettings {
        EndpointSettings::new(self.api_key.as_deref(), self.api_endpoint.as_deref())
    }
}

/// Where chat requests go and how they authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSettings {
    pub api_key: String,
    pub api_endpoint: String,
}

impl EndpointSettings {
    pub fn new(api_key: Option<&str>, api_endpoint: Option<&str>) -> Self {
        let api_endpoint = api_endpoint
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .unwrap_or(DEFAULT_API_ENDPOINT);

        EndpointSettings {
            api_key: api_key.unwrap_or_default().trim().to_string(),
            api_endpoint: api_endpoint.to_string(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.api_key.is_empty() && Url::parse(&self.api_endpoint).is_ok()
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}
