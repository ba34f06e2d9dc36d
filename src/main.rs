use std::ffi::OsString;
use std::process::ExitCode;

use app::App;
use chat::OpenAiChatClient;
use clap::Parser;
use store::{DefaultsStore, ShellProfileStore};
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub mod app;
pub mod chat;
pub mod config;
pub mod defaults;
pub mod render;
pub mod store;

#[tokio::main]
async fn main() -> ExitCode {
    init_logging_and_env();

    let (bin, live_args) = split_argv(std::env::args_os());

    let store = ShellProfileStore::from_env();
    let stored_defaults = store.load();
    let live_args = defaults::bare_prompt_args(&live_args);
    let merged = defaults::merge_with_stored_defaults(&live_args, &stored_defaults);
    debug!("Merged arguments: {:?}", merged);

    let cli_args = config::CliArgs::parse_from(std::iter::once(bin).chain(merged));
    let chat = OpenAiChatClient::new(cli_args.endpoint_settings());
    let app = App::new(cli_args, Box::new(chat), Box::new(store));

    match app.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("askllm failed: {:?}", e);
            render::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Program name and live arguments, with non-UTF-8 bytes replaced.
fn split_argv(argv: impl IntoIterator<Item = OsString>) -> (String, Vec<String>) {
    let mut argv = argv
        .into_iter()
        .map(|argument| argument.to_string_lossy().into_owned());
    let bin = argv.next().unwrap_or_else(|| "askllm".to_string());
    (bin, argv.collect())
}

fn init_logging_and_env() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}
