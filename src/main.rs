#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = student_lab::run().await {
        eprintln!("student-lab fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
