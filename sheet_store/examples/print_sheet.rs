use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
struct Args {
    path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let sheet = sheet_store::load_sheet_json_from_path(args.path)?;
    println!("events={}", sheet.len());
    println!("duration={:.3}", sheet.duration());
    println!("ordered={}", sheet.is_time_ordered());
    Ok(())
}
