//! Command line arguments

use std::path::PathBuf;

use nurbs_core::FormatVersion;
use thiserror::Error;

pub const USAGE: &str = r#"brep2nurbs
------------------------------------------------------------
Converts every face of a B-Rep model to a rational B-spline
surface with trimming curves and writes the whole model as
one .nurbs file.
------------------------------------------------------------
Required:
  --file_path <path>   model to convert (.ron)
  --save_dir <path>    directory for output files

Optional:
  --version <200|300>  .nurbs format version (default 300)
  --no_nurbs           do not write the .nurbs file
  --log_fails          write Fails/fails.txt, Fails/stats.txt
                       and a dump of every failed face or solid
  --conv               write <name>_conv.ron with the converted
                       surfaces and trimming curves
  --conv_no_trim       write <name>_conv_notrim.ron with the
                       converted surfaces only
  -h, --help           show this help

Log verbosity follows RUST_LOG.
"#;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgsError {
    #[error("invalid argument: {0}")]
    Unknown(String),
    #[error("{0} expects a value")]
    MissingValue(&'static str),
    #[error("{0} is not specified")]
    Required(&'static str),
    #[error("{0}")]
    Version(String),
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Convert(ConvertArgs),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertArgs {
    pub file_path: PathBuf,
    pub save_dir: PathBuf,
    pub version: FormatVersion,
    pub write_nurbs: bool,
    pub log_fails: bool,
    pub conv: bool,
    pub conv_no_trim: bool,
}

/// Parse arguments without the program name
pub fn parse<I>(args: I) -> Result<Command, ArgsError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut file_path = None;
    let mut save_dir = None;
    let mut version = FormatVersion::default();
    let mut write_nurbs = true;
    let mut log_fails = false;
    let mut conv = false;
    let mut conv_no_trim = false;
    let mut help = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--file_path" => {
                file_path = Some(PathBuf::from(
                    args.next().ok_or(ArgsError::MissingValue("--file_path"))?,
                ))
            }
            "--save_dir" => {
                save_dir = Some(PathBuf::from(
                    args.next().ok_or(ArgsError::MissingValue("--save_dir"))?,
                ))
            }
            "--version" => {
                let value = args.next().ok_or(ArgsError::MissingValue("--version"))?;
                version = value.parse().map_err(ArgsError::Version)?;
            }
            "--no_nurbs" => write_nurbs = false,
            "--log_fails" => log_fails = true,
            "--conv" => conv = true,
            "--conv_no_trim" => conv_no_trim = true,
            "-h" | "--help" => help = true,
            _ => return Err(ArgsError::Unknown(arg)),
        }
    }

    if help {
        return Ok(Command::Help);
    }
    Ok(Command::Convert(ConvertArgs {
        file_path: file_path.ok_or(ArgsError::Required("--file_path"))?,
        save_dir: save_dir.ok_or(ArgsError::Required("--save_dir"))?,
        version,
        write_nurbs,
        log_fails,
        conv,
        conv_no_trim,
    }))
}
