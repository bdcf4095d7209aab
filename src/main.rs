//! # flowpress CLI
//!
//! Usage:
//!   flowpress input.json -o output.pdf
//!   echo '{ ... }' | flowpress -o output.pdf
//!   flowpress --example > letter.json

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::{error, info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use flowpress::model::Document;
use flowpress::units::mm;
use flowpress::{Orientation, PaperSize, PdfRenderer, RenderConfig, RenderError};

#[derive(Parser, Debug)]
#[command(name = "flowpress", version, about = "Render a flowpress JSON document to PDF")]
struct Args {
    /// Input JSON document. Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Where to write the PDF.
    #[arg(short, long, default_value = "output.pdf")]
    output: PathBuf,

    /// Override the document's paper size.
    #[arg(long, value_enum, ignore_case = true)]
    size: Option<SizeArg>,

    /// Lay pages out in landscape.
    #[arg(long)]
    landscape: bool,

    /// Override the document's margin, in millimeters.
    #[arg(long)]
    margin_mm: Option<f64>,

    /// Print an example document and exit.
    #[arg(long)]
    example: bool,

    /// More logging (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SizeArg {
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    Letter,
}

impl From<SizeArg> for PaperSize {
    fn from(size: SizeArg) -> Self {
        match size {
            SizeArg::A0 => PaperSize::A0,
            SizeArg::A1 => PaperSize::A1,
            SizeArg::A2 => PaperSize::A2,
            SizeArg::A3 => PaperSize::A3,
            SizeArg::A4 => PaperSize::A4,
            SizeArg::A5 => PaperSize::A5,
            SizeArg::A6 => PaperSize::A6,
            SizeArg::Letter => PaperSize::Letter,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.quiet {
        LevelFilter::Error
    } else {
        match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };
    // A logger can only fail to install if one is already set.
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto);

    if args.example {
        print!("{}", example_letter_json());
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(bytes) => {
            eprintln!("✓ Written {} bytes to {}", bytes, args.output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<usize, RenderError> {
    let input = match &args.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let document: Document = serde_json::from_str(&input)?;
    let mut config = RenderConfig::from(&document);
    if let Some(size) = args.size {
        config.format.size = size.into();
    }
    if args.landscape {
        config.format.orientation = Orientation::Landscape;
    }
    if let Some(margin) = args.margin_mm {
        config.format.margin = mm(margin);
    }
    info!(
        "Rendering on {:?} {:?} with {:.1}pt margins",
        config.format.size, config.format.orientation, config.format.margin
    );

    let pdf_bytes = PdfRenderer::new(config, document.content).render_bytes()?;
    fs::write(&args.output, &pdf_bytes)?;
    Ok(pdf_bytes.len())
}

fn example_letter_json() -> &'static str {
    r##"{
  "format": { "size": "A4", "orientation": "Portrait", "margin": 28.35 },
  "metadata": { "title": "Quarterly Letter", "author": "Company" },
  "content": {
    "type": "Column",
    "spacing": 8,
    "children": [
      {
        "type": "OnPage",
        "page": 1,
        "child": {
          "type": "Row",
          "spacing": 28,
          "children": [
            { "type": "Block", "height": 60, "color": { "r": 0.12, "g": 0.12, "b": 0.18 } },
            { "type": "Text", "content": "www.company.com\ninfo@company.ch\n+1 234 567 890", "fontSize": 9, "color": { "r": 0.5, "g": 0.5, "b": 0.5 } },
            { "type": "Text", "content": "Company\nSome Street\nSome City\nSome Postcode", "fontSize": 9, "padding": { "top": 0, "right": 0, "bottom": 40, "left": 0 } }
          ]
        }
      },
      {
        "type": "Flow",
        "name": "default",
        "children": [
          { "type": "Text", "content": "Some city, 12.01.1984", "fontSize": 9 },
          { "type": "Text", "content": "Fugiat nulla pariatur", "fontSize": 30, "bold": true, "padding": { "top": 14, "right": 0, "bottom": 14, "left": 0 } },
          { "type": "Text", "content": "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat. Duis aute irure dolor in reprehenderit in voluptate velit esse cillum dolore eu fugiat nulla pariatur.", "fontSize": 9 },
          { "type": "Block", "height": 142, "color": { "r": 0.8, "g": 0.85, "b": 0.95 } },
          { "type": "Text", "content": "Aliquet bibendum enim facilisis gravida neque convallis a cras semper. Et malesuada fames ac turpis. Quis ipsum suspendisse ultrices gravida dictum fusce ut placerat.", "fontSize": 9 },
          { "type": "Block", "height": 0.5, "color": { "r": 0.6, "g": 0.6, "b": 0.6 } },
          { "type": "Text", "content": "In hac habitasse", "fontSize": 20, "bold": true, "padding": { "top": 14, "right": 0, "bottom": 14, "left": 0 } },
          { "type": "Row", "children": [ { "type": "Text", "content": "10", "fontSize": 9 }, { "type": "Text", "content": "oiua lhaslfk s", "fontSize": 9 }, { "type": "Text", "content": "asjpaosfasdf", "fontSize": 9 } ] },
          { "type": "Row", "children": [ { "type": "Text", "content": "20", "fontSize": 9 }, { "type": "Text", "content": "oiua lhaslfk s", "fontSize": 9 }, { "type": "Text", "content": "asjpaosfasdf", "fontSize": 9 } ] },
          { "type": "Row", "children": [ { "type": "Text", "content": "30", "fontSize": 9 }, { "type": "Text", "content": "oiua lhaslfk s", "fontSize": 9 }, { "type": "Text", "content": "asjpaosfasdf", "fontSize": 9 } ] },
          { "type": "Block", "height": 400, "color": { "r": 0.9, "g": 0.9, "b": 0.9 } },
          { "type": "Text", "content": "Vestibulum lectus mauris ultrices eros in cursus turpis. Vel orci porta non pulvinar neque laoreet suspendisse.", "fontSize": 9 }
        ]
      },
      { "type": "Text", "content": "Page {page} of {pages}", "fontSize": 9, "padding": { "top": 8, "right": 0, "bottom": 0, "left": 0 } }
    ]
  }
}
"##
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_document_renders() {
        let bytes = flowpress::render_json(example_letter_json()).unwrap();
        let doc = flowpress::PdfDocument::parse(bytes).unwrap();
        assert!(doc.page_count() >= 2);
    }

    #[test]
    fn args_parse_overrides() {
        let args = Args::parse_from(["flowpress", "in.json", "-o", "out.pdf", "--size", "letter", "--landscape", "-vv"]);
        assert_eq!(args.input, Some(PathBuf::from("in.json")));
        assert!(matches!(args.size, Some(SizeArg::Letter)));
        assert!(args.landscape);
        assert_eq!(args.verbose, 2);
    }
}
