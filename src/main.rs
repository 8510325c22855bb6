use std::io::{self, IsTerminal, Read};

use anyhow::{Context, Result, anyhow};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "layout-refiner",
    version,
    about = "Refine a model-proposed ad layout into clean text, logo and underlay boxes"
)]
struct Cli {
    /// File holding the model reply (reads stdin when omitted)
    #[arg(short = 'r', long = "response")]
    response: Option<String>,

    /// Product image; supplies pixel size and palette
    #[arg(short = 'i', long = "image")]
    image: Option<String>,

    /// Image width in pixels (overrides --image)
    #[arg(long = "width", requires = "height")]
    width: Option<u32>,

    /// Image height in pixels (overrides --image)
    #[arg(long = "height", requires = "width")]
    height: Option<u32>,

    /// Write the refined JSON to this file instead of stdout
    #[arg(short = 's', long = "save")]
    save: Option<String>,

    /// Attach the image's dominant colours as background.palette
    #[arg(
        long = "with-palette",
        num_args = 0..=1,
        requires = "image",
        value_parser = parse_color_count
    )]
    with_palette: Option<Option<usize>>,

    /// Attach a free-space summary for background generation
    #[arg(long = "with-summary")]
    with_summary: bool,

    /// Attach the regions a background compositor must keep clean
    #[arg(long = "with-reserved")]
    with_reserved: bool,

    /// Read extra settings from a local TOML file
    #[arg(long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

fn parse_color_count(value: &str) -> Result<usize, String> {
    let count: usize = value
        .parse()
        .map_err(|_| format!("`{}` is not a colour count", value))?;
    if count == 0 {
        return Err("at least one colour is required".to_string());
    }
    Ok(count)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    layout_refiner::logging::init(cli.verbose)?;

    let input = if cli.response.is_some() {
        None
    } else {
        if io::stdin().is_terminal() {
            return Err(anyhow!("no model response given (use --response or pipe it to stdin)"));
        }
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .with_context(|| "stdin must be UTF-8 text")?;
        Some(buffer)
    };

    let output = layout_refiner::run(
        layout_refiner::Config {
            response_path: cli.response,
            image_path: cli.image,
            width: cli.width,
            height: cli.height,
            save_path: cli.save,
            palette: cli.with_palette,
            with_summary: cli.with_summary,
            with_reserved: cli.with_reserved,
            settings_path: cli.read_settings,
        },
        input,
    )?;

    println!("{}", output);
    Ok(())
}
