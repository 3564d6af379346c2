//! Identity service binary.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    identity_service::server::run().await
}
