#[tokio::main]
async fn main() -> anyhow::Result<()> {
    certsync_provider_test::run().await
}
