use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use assetry_md2::{DecodeOptions, IndexPolicy};

#[derive(Parser)]
#[command(name = "assetry", about = "Inspect and validate MD2 model files", version)]
pub struct Cli {
    /// Log decoder and validator progress (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Decode a file and print a summary of the resulting scene
    Inspect {
        #[command(flatten)]
        input: Input,
    },
    /// Run the full import pipeline and report validation results
    Validate {
        #[command(flatten)]
        input: Input,
    },
}

#[derive(Args)]
pub struct Input {
    /// Path to the .md2 file
    pub file: PathBuf,
    /// Keyframe to decode
    #[arg(short, long, default_value_t = 0)]
    pub frame: usize,
    /// Reject out-of-range vertex, normal and texture-coordinate indices instead of clamping
    #[arg(long)]
    pub strict: bool,
}

impl Input {
    pub fn options(&self) -> DecodeOptions {
        DecodeOptions {
            frame: self.frame,
            index_policy: if self.strict { IndexPolicy::Strict } else { IndexPolicy::Lenient },
            source_name: file_name(&self.file),
        }
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}
