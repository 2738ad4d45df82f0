#[tokio::main]
async fn main() -> anyhow::Result<()> {
    usergroups::tracing::init();
    usergroups::app::run().await
}
