use serde_json::json;
use tracing::info;

use crate::cli::utils::{output_page, output_success};
use crate::cli::CliContext;
use crate::pages::page_for;
use crate::routing::Navigation;

// `/` -> login is the longest chain the router produces
const MAX_REDIRECTS: usize = 3;

pub async fn handle(path: &str, ctx: &CliContext) -> anyhow::Result<()> {
    let mut current = path.to_string();

    for _ in 0..MAX_REDIRECTS {
        match ctx.router.navigate(&current) {
            Navigation::Redirect { to, reason } => {
                info!(from = %current, %to, %reason, "Redirected");
                output_success(
                    &ctx.output_format,
                    &format!("Redirected to {} ({})", to, reason),
                    Some(json!({ "redirect": to, "reason": reason.to_string() })),
                )?;
                current = to;
            }
            Navigation::Render { route, session } => {
                let mut page = page_for(&route, session.as_ref(), &ctx.config.pages);
                page.mount(&ctx.api).await;
                return output_page(&ctx.output_format, &route.to_string(), session.as_ref(), page.as_ref());
            }
        }
    }

    Err(anyhow::anyhow!("Too many redirects starting from {}", path))
}
