use crate::calibration::{extract_to_file, RawDecoder};
use crate::cli::args::MetadataArgs;
use crate::error::Result;
use crate::lsmap::output_path;

pub fn run_extract_metadata(args: MetadataArgs) -> Result<()> {
    for input in &args.inputs {
        let txt = output_path(input, args.out_dir.as_deref(), "txt")?;
        extract_to_file(&RawDecoder, input, &txt)?;
        println!("{} -> {}", input.display(), txt.display());
    }
    Ok(())
}
