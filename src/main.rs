use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;
use receipt_ocr::report::{self, OutcomeReport, EXIT_REPORTED, EXIT_USAGE, NO_IMAGE_PATH};

#[derive(Parser, Debug)]
#[command(
    name = "receipt-ocr",
    version,
    about = "Extract text from a receipt image, trying all four orientations"
)]
struct Cli {
    /// Image file to read. Options must come before it; anything after the
    /// first path is ignored.
    #[arg(
        value_name = "IMAGE",
        num_args = 0..,
        allow_hyphen_values = true,
        trailing_var_arg = true
    )]
    inputs: Vec<PathBuf>,

    /// Merge settings from a TOML file over the built-in defaults
    #[arg(short = 's', long = "settings")]
    settings: Option<String>,

    /// Log pipeline and engine diagnostics to stderr
    #[arg(long = "verbose")]
    verbose: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            let message = err.to_string();
            let first_line = message.lines().next().unwrap_or_default();
            let first_line = first_line.trim_start_matches("error: ").trim();
            report::emit_and_exit(&OutcomeReport::failure(first_line), EXIT_REPORTED)
        }
    };

    let Some(image_path) = cli.inputs.into_iter().next() else {
        report::emit_and_exit(&OutcomeReport::failure(NO_IMAGE_PATH), EXIT_USAGE)
    };

    if let Err(err) = receipt_ocr::logging::init(cli.verbose) {
        report::emit_and_exit(&OutcomeReport::failure(format!("{:#}", err)), EXIT_REPORTED)
    }

    // keep the default panic message off stdout; the report carries it instead
    std::panic::set_hook(Box::new(|info| {
        tracing::error!("{}", info);
    }));

    let outcome = receipt_ocr::run(receipt_ocr::Config {
        image_path,
        settings_path: cli.settings,
        verbose: cli.verbose,
    });
    report::emit_and_exit(&outcome, EXIT_REPORTED)
}
