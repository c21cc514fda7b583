//! Running ExifTool (and `od`) to pull the `OpcodeList2` block out of a DNG.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use clap::ValueEnum;

use crate::error::{Error, Result};
use crate::lsmap::dump::OpcodeDump;

/// How the binary opcode list is turned into numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Decoder {
    /// Pipe ExifTool through `od` twice: once as `u32` words, once as floats.
    #[default]
    Od,
    /// Read ExifTool's binary output and decode it in-process.
    Native,
}

/// Anything that can produce the opcode dump of a raw file.
pub trait OpcodeSource {
    fn opcode_dump(&self, path: &Path) -> Result<OpcodeDump>;
}

/// An ExifTool invocation. `program` plus `leading_args` stand in for
/// `exiftool`; the opcode-list arguments are appended per file.
#[derive(Debug, Clone)]
pub struct ExifTool {
    pub program: PathBuf,
    pub leading_args: Vec<String>,
    pub decoder: Decoder,
}

impl Default for ExifTool {
    fn default() -> Self {
        ExifTool::new(Decoder::default())
    }
}

const OD_HEADER_ARGS: &[&str] = &["--format=u4", "-v", "-An", "--endian=big"];
const OD_PAYLOAD_ARGS: &[&str] = &["-f", "-v", "-An", "--endian=big"];

fn tool_error(tool: &str, message: impl Into<String>) -> Error {
    Error::ExternalTool { tool: tool.to_string(), message: message.into() }
}

impl ExifTool {
    pub fn new(decoder: Decoder) -> ExifTool {
        ExifTool { program: PathBuf::from("exiftool"), leading_args: Vec::new(), decoder }
    }

    /// A different executable, e.g. a wrapper script or a bundled copy.
    pub fn custom(program: impl Into<PathBuf>, leading_args: Vec<String>, decoder: Decoder) -> ExifTool {
        ExifTool { program: program.into(), leading_args, decoder }
    }

    fn tool_name(&self) -> String {
        self.program.display().to_string()
    }

    fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .arg("-opcodelist2")
            .arg(path)
            .arg("-b")
            .stdin(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }

    /// The raw opcode-list bytes as printed by ExifTool.
    pub fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        let tool = self.tool_name();
        let output = self
            .command(path)
            .output()
            .map_err(|e| tool_error(&tool, format!("could not start: {}", e)))?;
        if !output.status.success() {
            return Err(tool_error(&tool, format!("exited with {} on {}", output.status, path.display())));
        }
        if output.stdout.is_empty() {
            return Err(tool_error(&tool, format!("no OpcodeList2 in {}", path.display())));
        }
        Ok(output.stdout)
    }

    /// Runs `exiftool | od <od_args>` and returns od's text output.
    fn piped_through_od(&self, path: &Path, od_args: &[&str]) -> Result<String> {
        let tool = self.tool_name();
        let mut exiftool: Child = self
            .command(path)
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| tool_error(&tool, format!("could not start: {}", e)))?;
        let stdout = exiftool
            .stdout
            .take()
            .ok_or_else(|| tool_error(&tool, "stdout was not captured"))?;

        let od = Command::new("od")
            .args(od_args)
            .stdin(Stdio::from(stdout))
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn();
        let mut od = match od {
            Ok(child) => child,
            Err(e) => {
                let _ = exiftool.kill();
                let _ = exiftool.wait();
                return Err(tool_error("od", format!("could not start: {}", e)));
            }
        };

        let mut text = String::new();
        if let Some(mut out) = od.stdout.take() {
            out.read_to_string(&mut text)
                .map_err(|e| tool_error("od", format!("reading output: {}", e)))?;
        }
        let od_status = od.wait().map_err(|e| tool_error("od", e.to_string()))?;
        let exif_status = exiftool.wait().map_err(|e| tool_error(&tool, e.to_string()))?;

        if !exif_status.success() {
            return Err(tool_error(&tool, format!("exited with {} on {}", exif_status, path.display())));
        }
        if !od_status.success() {
            return Err(tool_error("od", format!("exited with {}", od_status)));
        }
        if text.trim().is_empty() {
            return Err(tool_error(&tool, format!("no OpcodeList2 in {}", path.display())));
        }
        Ok(text)
    }
}

impl OpcodeSource for ExifTool {
    fn opcode_dump(&self, path: &Path) -> Result<OpcodeDump> {
        match self.decoder {
            Decoder::Native => Ok(OpcodeDump::from_bytes(&self.read_bytes(path)?)),
            Decoder::Od => {
                let header = self.piped_through_od(path, OD_HEADER_ARGS)?;
                let payload = self.piped_through_od(path, OD_PAYLOAD_ARGS)?;
                log::debug!(
                    "{}: {} header bytes, {} payload bytes of od output",
                    path.display(),
                    header.len(),
                    payload.len()
                );
                OpcodeDump::parse(&header, &payload)
            }
        }
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;
    use crate::lsmap::gain_map::{encode_gain_maps, synthetic_gain_map, LensShadingMap};

    /// `sh -c 'cat <fixture>'` ignores the extra exiftool arguments, which
    /// land in `$0`, `$1`, ...
    fn fake_exiftool(fixture: &Path, decoder: Decoder) -> ExifTool {
        ExifTool::custom(
            "sh",
            vec!["-c".into(), format!("cat '{}'", fixture.display())],
            decoder,
        )
    }

    fn fixture(dir: &Path) -> PathBuf {
        let maps: Vec<_> = [(0, 0), (0, 1), (1, 0), (1, 1)]
            .iter()
            .enumerate()
            .map(|(c, &(t, l))| synthetic_gain_map(t, l, 3, 4, 1.0 + c as f32 * 0.25))
            .collect();
        let path = dir.join("opcodes.bin");
        std::fs::write(&path, encode_gain_maps(&maps)).unwrap();
        path
    }

    #[test]
    fn native_and_od_decoders_agree() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fixture(dir.path());
        let dng = dir.path().join("IMG_0001.dng");

        let native = fake_exiftool(&bin, Decoder::Native).opcode_dump(&dng).unwrap();
        let od = fake_exiftool(&bin, Decoder::Od).opcode_dump(&dng).unwrap();
        assert_eq!(native.words, od.words);

        let a = LensShadingMap::from_dump(&native).unwrap();
        let b = LensShadingMap::from_dump(&od).unwrap();
        assert_eq!(a.shape(), (3, 4, 4));
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn failing_tool_is_reported() {
        let tool = ExifTool::custom("sh", vec!["-c".into(), "exit 3".into()], Decoder::Od);
        let err = tool.opcode_dump(Path::new("missing.dng")).unwrap_err();
        assert!(matches!(err, Error::ExternalTool { .. }));
    }

    #[test]
    fn empty_output_is_an_error() {
        let tool = ExifTool::custom("sh", vec!["-c".into(), "true".into()], Decoder::Native);
        assert!(tool.opcode_dump(Path::new("plain.dng")).is_err());
    }

    #[test]
    fn missing_program_is_an_error() {
        let tool = ExifTool::custom("/nonexistent/exiftool", Vec::new(), Decoder::Native);
        assert!(matches!(
            tool.opcode_dump(Path::new("x.dng")),
            Err(Error::ExternalTool { .. })
        ));
    }
}
