use anyhow::Result;
use argocd_token_provider::runtime::initialization::initialize;
use argocd_token_provider::runtime::watch_loop::run_watch_loop;

#[tokio::main]
async fn main() -> Result<()> {
    let init_result = initialize().await?;

    run_watch_loop(
        init_result.client,
        init_result.token_reconciler,
        init_result.provider_config_reconciler,
        init_result.server_state,
    )
    .await
}
