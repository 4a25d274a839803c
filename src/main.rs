#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wayfarer::run().await
}
