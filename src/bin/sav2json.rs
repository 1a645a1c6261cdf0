use sfsave::SatisfactorySave;
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let data = std::fs::read(&args[1])?;
    let save = SatisfactorySave::from_slice(&data)?;
    serde_json::to_writer_pretty(std::io::stdout(), &save)?;
    Ok(())
}
