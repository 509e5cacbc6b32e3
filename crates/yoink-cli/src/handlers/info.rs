//! `yoink info`: resolve a URL and print what it points at.

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::presentation::print_media;

/// Execute the info command.
pub async fn execute(ctx: &CliContext, url: &str) -> Result<(), CliError> {
    println!("Fetching info for: {url}\n");
    let info = ctx.manager().resolve_metadata(url).await?;
    print_media(&info);
    Ok(())
}
