use anyhow::Result;

fn main() -> Result<()> {
    proofgate::cli::run()
}
