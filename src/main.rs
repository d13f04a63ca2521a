#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = courseware_rust::run().await {
        eprintln!("courseware-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
