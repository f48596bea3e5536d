use space_drain::{run, Config};
use space_drain_service_common::app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app!();
}
