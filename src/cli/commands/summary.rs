use crate::cli::args::SummaryArgs;
use crate::error::Result;
use crate::network::{diagram, summary};

pub fn run_summary(args: SummaryArgs) -> Result<()> {
    let network = args.arch.spec().build(0);
    println!("{}", summary::summary(&network));
    if let Some(path) = &args.diagram {
        diagram::render_diagram(&network, path)?;
    }
    Ok(())
}
