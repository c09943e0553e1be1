use crate::cli::ScoreArgs;
use anyhow::Result;
use concord_core::similarity;

pub async fn run(args: ScoreArgs) -> Result<()> {
    println!("{}", similarity::score(&args.a, &args.b));
    Ok(())
}
