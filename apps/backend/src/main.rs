#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vocab_srs_backend::run().await
}
