use crate::cli::args::LsmapArgs;
use crate::error::Result;
use crate::lsmap::{extract_to_dir, saved_summary, ExifTool, ExtractOptions};

pub fn run_extract_lsmap(args: LsmapArgs) -> Result<()> {
    let tool = ExifTool::custom(&args.exiftool, Vec::new(), args.decoder);
    let opts = ExtractOptions { rectify: args.rectify, preview: args.preview };
    for input in &args.inputs {
        let mat = extract_to_dir(&tool, input, args.out_dir.as_deref(), &opts)?;
        println!("{} -> {}: {}", input.display(), mat.display(), saved_summary(&mat)?);
    }
    Ok(())
}
