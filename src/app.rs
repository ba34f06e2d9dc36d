use std::path::Path;

use anyhow::anyhow;
use tracing::{error, info};

use crate::chat::{ChatEndpoint, ChatRequest};
use crate::config::{CliArgs, API_KEY_VAR, DEFAULTS_VAR};
use crate::defaults::build_defaults_string;
use crate::render::{self, Spinner};
use crate::store::DefaultsStore;

const SPINNER_MESSAGE: &str = "Requesting response from the LLM...";

pub struct App {
    settings: CliArgs,
    chat: Box<dyn ChatEndpoint>,
    defaults: Box<dyn DefaultsStore>,
    show_spinner: bool,
}

impl App {
    pub fn new(
        settings: CliArgs,
        chat: Box<dyn ChatEndpoint>,
        defaults: Box<dyn DefaultsStore>,
    ) -> App {
        App {
            settings,
            chat,
            defaults,
            show_spinner: true,
        }
    }

    pub async fn run(&self) -> Result<(), anyhow::Error> {
        self.settings.validate()?;

        if self.settings.store {
            self.store_command_defaults()?;
        }

        let color = render::resolve_color(self.settings.color.as_deref())?;

        if !self.chat.is_configured() {
            return Err(anyhow!(
                "The {} environment variable is not configured.",
                API_KEY_VAR
            ));
        }

        let message = self.prompt_text().await?;
        let request = ChatRequest::new(&message, self.settings.model());

        let spinner = self.show_spinner.then(|| Spinner::start(SPINNER_MESSAGE));
        let reply = self.chat.send_chat_request(&request).await;
        if let Some(spinner) = spinner {
            spinner.stop().await;
        }
        let reply = reply?;
        info!("Received {} characters from {}", reply.content.len(), reply.model);

        match self.settings.output_file.as_deref().map(str::trim) {
            Some(output_file) if !output_file.is_empty() => {
                self.write_output_file(output_file, &reply.content).await
            }
            _ => render::print_response(&reply.content, color),
        }
    }

    fn store_command_defaults(&self) -> Result<(), anyhow::Error> {
        let defaults = build_defaults_string(&self.settings);
        self.defaults.store(&defaults).map_err(|e| {
            error!("Failed to store command defaults: {:#}", e);
            anyhow!(
                "Unable to store the command defaults in the {} environment variable.",
                DEFAULTS_VAR
            )
        })?;

        if defaults.is_empty() {
            render::print_success("Cleared stored command defaults.");
        } else {
            render::print_success(&format!("Stored command defaults in {}.", DEFAULTS_VAR));
        }
        Ok(())
    }

    async fn prompt_text(&self) -> Result<String, anyhow::Error> {
        if let Some(input_file) = self
            .settings
            .input_file
            .as_deref()
            .filter(|f| !f.trim().is_empty())
        {
            return tokio::fs::read_to_string(input_file).await.map_err(|e| {
                error!("Failed to read input file {}: {}", input_file, e);
                anyhow!("Unable to read the input file specified by --input-file.")
            });
        }

        Ok(self
            .settings
            .prompt
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    async fn write_output_file(
        &self,
        output_file: &str,
        content: &str,
    ) -> Result<(), anyhow::Error> {
        write_file(Path::new(output_file), content)
            .await
            .map_err(|e| {
                error!("Failed to write output file {}: {}", output_file, e);
                anyhow!("Unable to write the response to the specified output file.")
            })?;

        render::print_success(&format!("Response written to {}", output_file));
        Ok(())
    }
}

async fn write_file(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, content).await
}
