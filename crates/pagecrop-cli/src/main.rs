// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagecrop — Overlay crop and whiteout for PDF documents
//
// Entry point. Initialises logging, loads the configuration, and runs the
// requested edits headlessly: whiteout, then page deletion, then crop, then
// save. Rectangles are given in overlay pixels at the configured render zoom.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use pagecrop_core::config::{CONFIG_FILE, config_dir};
use pagecrop_core::human_errors::humanize_error;
use pagecrop_core::{EditorConfig, LayoutMode, OverlayRect, PageGroup, Rgb};
use pagecrop_document::default_rasterizer;
use pagecrop_editor::{CropSelection, Editor, WhiteoutTarget};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "pagecrop")]
#[command(author, version, about = "Crop and white out PDF pages through page overlays", long_about = None)]
struct Args {
    /// PDF file to edit
    #[arg(short, long)]
    input: PathBuf,

    /// Directory to save into (must exist)
    #[arg(long = "save-to")]
    save_to: Option<PathBuf>,

    /// File name to save as inside the save directory
    #[arg(long = "save-as")]
    save_as: Option<String>,

    /// Exact output path; overrides --save-to/--save-as
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overlay layout the crop rectangles refer to
    #[arg(long, value_enum)]
    layout: Option<CliLayout>,

    /// Crop rectangle X,Y,W,H (all pages, or odd pages with --layout odd-even)
    #[arg(long, value_parser = parse_rect)]
    crop: Option<OverlayRect>,

    /// Crop rectangle X,Y,W,H for even pages (--layout odd-even)
    #[arg(long = "crop-even", value_parser = parse_rect)]
    crop_even: Option<OverlayRect>,

    /// Whiteout rectangle X,Y,W,H
    #[arg(long, value_parser = parse_rect)]
    whiteout: Option<OverlayRect>,

    /// Pages the whiteout applies to: all, odd, even, or a 1-based page number
    #[arg(long = "whiteout-pages", default_value = "all", value_parser = parse_target)]
    whiteout_pages: WhiteoutTarget,

    /// Whiteout fill color as RRGGBB
    #[arg(long, value_parser = parse_color)]
    fill: Option<Rgb>,

    /// 1-based page numbers to delete, comma separated
    #[arg(long, value_parser = parse_pages)]
    delete: Option<BTreeSet<usize>>,

    /// Compress streams on save (slower, smaller)
    #[arg(long)]
    compress: bool,

    /// Also write the final overlay as PNG
    #[arg(long = "overlay-png")]
    overlay_png: Option<PathBuf>,

    /// Configuration file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliLayout {
    All,
    OddEven,
}

impl From<CliLayout> for LayoutMode {
    fn from(layout: CliLayout) -> Self {
        match layout {
            CliLayout::All => LayoutMode::AllOverlay,
            CliLayout::OddEven => LayoutMode::OddEvenSplit,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("pagecrop starting");

    if !args.input.is_file() {
        bail!("input file does not exist: {}", args.input.display());
    }
    if let Some(dir) = &args.save_to {
        if !dir.is_dir() {
            bail!("save directory does not exist: {}", dir.display());
        }
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir().join(CONFIG_FILE));
    let config = apply_overrides(EditorConfig::load(&config_path), &args)?;
    let layout = config.default_layout;

    let mut editor = Editor::new(config, default_rasterizer());
    let summary = humane(editor.open_path(&args.input).await)?;
    report_failures(&summary.failed);
    info!(pages = editor.session().page_count(), "Document ready");

    if let Some(rect) = args.whiteout {
        let summary = humane(editor.whiteout(args.whiteout_pages, rect).await)?;
        report_failures(&summary.failed);
        println!("Whiteout applied.");
    }

    if let Some(pages) = &args.delete {
        let indices: BTreeSet<usize> = pages.iter().map(|page| page - 1).collect();
        let report = humane(editor.delete_pages(&indices))?;
        println!(
            "Deleted {} page(s); {} remaining.",
            report.deleted.len(),
            report.remaining
        );
    }

    if let Some(selection) = crop_selection(layout, args.crop, args.crop_even)? {
        let summary = humane(editor.crop_with(selection).await)?;
        report_failures(&summary.failed);
        println!("PDF cropped successfully!");
    }

    if let Some(path) = &args.overlay_png {
        for written in humane(editor.export_overlay(path))? {
            println!("Overlay written to {}", written.display());
        }
    }

    let report = humane(editor.save(args.output.clone()).await)?;
    println!("PDF saved successfully! {}", report.path.display());
    Ok(())
}

/// Fold command-line settings into the loaded configuration.
fn apply_overrides(mut config: EditorConfig, args: &Args) -> anyhow::Result<EditorConfig> {
    if let Some(layout) = args.layout {
        config.default_layout = layout.into();
    }
    if let Some(fill) = args.fill {
        config.fill_color = fill;
    }
    if args.compress {
        config.fast_save = false;
    }
    if let Some(dir) = &args.save_to {
        config.save_directory = Some(dir.clone());
    }
    if let Some(name) = &args.save_as {
        config.save_filename = Some(name.clone());
    }
    if config.save_directory.is_none() && args.output.is_none() {
        // Save next to the input as <stem>_modified.pdf.
        let parent = args
            .input
            .parent()
            .map(|dir| dir.to_path_buf())
            .context("input path has no parent directory")?;
        config.save_directory = Some(parent);
    }
    Ok(config)
}

/// The crop the rectangles describe under `layout`, if any.
fn crop_selection(
    layout: LayoutMode,
    crop: Option<OverlayRect>,
    crop_even: Option<OverlayRect>,
) -> anyhow::Result<Option<CropSelection>> {
    match (layout, crop, crop_even) {
        (_, None, None) => Ok(None),
        (LayoutMode::OddEvenSplit, odd, even) => Ok(Some(CropSelection::Split { odd, even })),
        (_, Some(_), Some(_)) | (_, None, Some(_)) => {
            bail!("--crop-even needs --layout odd-even")
        }
        (_, Some(rect), None) => Ok(Some(CropSelection::All(rect))),
    }
}

fn report_failures(failed: &[(usize, String)]) {
    for (page_index, detail) in failed {
        warn!(page = page_index + 1, %detail, "Page could not be rendered");
    }
}

/// Attach the user-facing wording to an editor error.
fn humane<T>(result: pagecrop_core::Result<T>) -> anyhow::Result<T> {
    result.map_err(|err| {
        let notice = humanize_error(&err);
        anyhow::Error::new(err).context(notice.message)
    })
}

// -- Argument parsers ----------------------------------------------------------

fn parse_rect(text: &str) -> Result<OverlayRect, String> {
    let values: Vec<f64> = text
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|err| format!("expected X,Y,W,H: {err}"))?;
    let [x, y, width, height] = values[..] else {
        return Err(format!("expected four values X,Y,W,H, got {}", values.len()));
    };
    let rect = OverlayRect::new(x, y, width, height);
    if !rect.is_valid() {
        return Err("rectangle must have a positive width and height".into());
    }
    Ok(rect)
}

fn parse_pages(text: &str) -> Result<BTreeSet<usize>, String> {
    text.split(',')
        .map(|part| match part.trim().parse::<usize>() {
            Ok(0) => Err("page numbers start at 1".to_string()),
            Ok(page) => Ok(page),
            Err(err) => Err(format!("invalid page number {part:?}: {err}")),
        })
        .collect()
}

fn parse_target(text: &str) -> Result<WhiteoutTarget, String> {
    match text {
        "all" => Ok(WhiteoutTarget::All),
        "odd" => Ok(WhiteoutTarget::Group(PageGroup::Odd)),
        "even" => Ok(WhiteoutTarget::Group(PageGroup::Even)),
        page => match page.parse::<usize>() {
            Ok(0) | Err(_) => Err(format!("expected all, odd, even or a page number, got {page:?}")),
            Ok(page) => Ok(WhiteoutTarget::Page(page - 1)),
        },
    }
}

fn parse_color(text: &str) -> Result<Rgb, String> {
    Rgb::from_hex(text).ok_or_else(|| format!("expected RRGGBB, got {text:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangles_parse() {
        assert_eq!(
            parse_rect("10, 20,30.5,40").unwrap(),
            OverlayRect::new(10.0, 20.0, 30.5, 40.0)
        );
        assert!(parse_rect("1,2,3").is_err());
        assert!(parse_rect("1,2,0,4").is_err());
        assert!(parse_rect("a,b,c,d").is_err());
    }

    #[test]
    fn pages_are_one_based() {
        assert_eq!(parse_pages("3,1,3").unwrap(), BTreeSet::from([1, 3]));
        assert!(parse_pages("0,2").is_err());
        assert!(parse_pages("x").is_err());
    }

    #[test]
    fn whiteout_targets_parse() {
        assert_eq!(parse_target("all").unwrap(), WhiteoutTarget::All);
        assert_eq!(
            parse_target("even").unwrap(),
            WhiteoutTarget::Group(PageGroup::Even)
        );
        assert_eq!(parse_target("4").unwrap(), WhiteoutTarget::Page(3));
        assert!(parse_target("0").is_err());
        assert!(parse_target("first").is_err());
    }

    #[test]
    fn crop_rectangles_follow_the_layout() {
        let rect = OverlayRect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(
            crop_selection(LayoutMode::AllOverlay, Some(rect), None).unwrap(),
            Some(CropSelection::All(rect))
        );
        assert_eq!(
            crop_selection(LayoutMode::OddEvenSplit, None, Some(rect)).unwrap(),
            Some(CropSelection::Split {
                odd: None,
                even: Some(rect)
            })
        );
        assert!(crop_selection(LayoutMode::AllOverlay, None, Some(rect)).is_err());
        assert_eq!(crop_selection(LayoutMode::AllOverlay, None, None).unwrap(), None);
    }

    #[test]
    fn overrides_default_the_save_directory_to_the_input() {
        let args = Args::parse_from([
            "pagecrop",
            "--input",
            "/docs/scan.pdf",
            "--layout",
            "all",
            "--fill",
            "ff0000",
            "--compress",
        ]);

        let config = apply_overrides(EditorConfig::default(), &args).unwrap();

        assert_eq!(config.default_layout, LayoutMode::AllOverlay);
        assert_eq!(config.fill_color, Rgb::new(255, 0, 0));
        assert!(!config.fast_save);
        assert_eq!(
            config.resolve_save_path(Some(&args.input)),
            Some(PathBuf::from("/docs/scan_modified.pdf"))
        );
    }

    #[test]
    fn arguments_are_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
