//! The `snapmap stream` command: live token-by-token description.

use clap::Args;
use snapmap_core::{ClientManager, Config, StreamAdapter, StreamEvent};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the `stream` command.
#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Image file to describe
    #[arg(required = true)]
    pub image: PathBuf,
}

/// Execute the stream command.
///
/// Prints fragments to stdout as they arrive. Unlike the sync path there
/// is no retry: a stream error is surfaced as the command's failure.
pub async fn execute(args: StreamArgs, config: Config) -> anyhow::Result<()> {
    let image = super::read_image(&args.image)?;

    let clients = Arc::new(ClientManager::from_config(&config.provider));
    let adapter = StreamAdapter::from_config(clients, &config);

    let mut stream = adapter.stream(&image).await;
    let mut stdout = std::io::stdout();

    while let Some(event) = stream.next_event().await {
        match event {
            StreamEvent::Fragment(text) => {
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
            }
            StreamEvent::Completed => {
                writeln!(stdout)?;
                tracing::debug!("Stream completed");
                return Ok(());
            }
            StreamEvent::Errored(message) => {
                writeln!(stdout)?;
                anyhow::bail!("Stream failed: {message}");
            }
        }
    }

    Ok(())
}
