//! capforge command line front end.
//!
//! Builds a template from flags, then exports it, inspects the timeline at
//! given times, or plays the preview clock in real time.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;

use capforge_lib::core::export::ExportKind;
use capforge_lib::core::settings::{SettingsManager, StudioSettings};
use capforge_lib::core::template::{ElementKindTag, ElementPatch, Template, TemplateField};
use capforge_lib::core::timeline::{self, PlaybackState};
use capforge_lib::core::{AspectRatio, TimeSec};
use capforge_lib::Studio;

#[derive(Parser, Debug)]
#[command(name = "capforge", version, about = "Build and export short-video templates")]
struct Cli {
    /// Settings file (defaults to the platform config directory).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Also write logs to a daily rolling file in this directory.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a template and print or write its export.
    Build(BuildArgs),
    /// Show which elements are visible at given times.
    Inspect(InspectArgs),
    /// Play the preview in real time until it reaches the end.
    Play(TemplateArgs),
}

#[derive(Args, Debug)]
struct TemplateArgs {
    /// Template name.
    #[arg(long)]
    name: String,

    /// Duration in seconds (non-numeric input falls back to 15).
    #[arg(long)]
    duration: Option<String>,

    /// Aspect ratio: 9:16, 16:9 or 1:1.
    #[arg(long, value_parser = parse_aspect_ratio)]
    aspect_ratio: Option<AspectRatio>,

    /// Background color (hex).
    #[arg(long)]
    background: Option<String>,

    /// Text overlay, `CONTENT` or `CONTENT@START-END`. Repeatable.
    #[arg(long = "text")]
    texts: Vec<OverlayArg>,

    /// Image overlay, `URL` or `URL@START-END`. Repeatable.
    #[arg(long = "image")]
    images: Vec<OverlayArg>,
}

#[derive(Args, Debug)]
struct BuildArgs {
    #[command(flatten)]
    template: TemplateArgs,

    /// Export document: capcut or template.
    #[arg(long, value_parser = parse_export_kind)]
    format: Option<ExportKind>,

    /// Write the export into this directory instead of printing it.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    #[command(flatten)]
    template: TemplateArgs,

    /// Playback time in seconds. Repeatable.
    #[arg(long = "at", default_values_t = vec![0.0])]
    at: Vec<TimeSec>,
}

// =============================================================================
// Argument Parsing
// =============================================================================

#[derive(Error, Debug, PartialEq)]
enum ArgError {
    #[error("overlay content cannot be empty")]
    EmptyOverlay,

    #[error("invalid time window {0:?} (expected START-END with START <= END)")]
    InvalidWindow(String),
}

/// One `--text` / `--image` value
#[derive(Clone, Debug, PartialEq)]
struct OverlayArg {
    content: String,
    window: Option<(TimeSec, TimeSec)>,
}

impl FromStr for OverlayArg {
    type Err = ArgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only treat the suffix as a window when it looks like one, so that
        // content such as an email address or a URL with `@` survives.
        if let Some((content, window)) = s.rsplit_once('@') {
            if let Some((start, end)) = window.split_once('-') {
                if let (Ok(start), Ok(end)) =
                    (start.trim().parse::<TimeSec>(), end.trim().parse::<TimeSec>())
                {
                    if content.is_empty() {
                        return Err(ArgError::EmptyOverlay);
                    }
                    if start > end {
                        return Err(ArgError::InvalidWindow(window.to_string()));
                    }
                    return Ok(Self {
                        content: content.to_string(),
                        window: Some((start, end)),
                    });
                }
            }
        }

        if s.is_empty() {
            return Err(ArgError::EmptyOverlay);
        }
        Ok(Self {
            content: s.to_string(),
            window: None,
        })
    }
}

fn parse_aspect_ratio(s: &str) -> Result<AspectRatio, String> {
    s.parse().map_err(|e: capforge_lib::CoreError| e.to_string())
}

fn parse_export_kind(s: &str) -> Result<ExportKind, String> {
    s.parse().map_err(|e: capforge_lib::CoreError| e.to_string())
}

// =============================================================================
// Logging
// =============================================================================

fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    // Logs go to stderr; stdout carries command output.
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let _ = std::fs::create_dir_all(dir);
            let file_appender = tracing_appender::rolling::daily(dir, "capforge.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer);

    let _ = tracing::subscriber::set_global_default(subscriber);
    guard
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<StudioSettings> {
    let manager = match path {
        Some(path) => SettingsManager::with_path(path.to_path_buf()),
        None => SettingsManager::in_config_dir()?,
    };
    Ok(manager.load())
}

// =============================================================================
// Commands
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.log_dir.as_deref());
    let settings = load_settings(cli.settings.as_deref())?;

    match cli.cmd {
        Command::Build(args) => cmd_build(settings, args),
        Command::Inspect(args) => cmd_inspect(settings, args),
        Command::Play(args) => cmd_play(settings, args).await,
    }
}

/// Drives the editor with the flag values and saves the result
fn build_template(studio: &mut Studio, args: &TemplateArgs) -> anyhow::Result<String> {
    let editor = studio.editor_mut();
    editor.set_field(TemplateField::Name(args.name.clone()));
    if let Some(duration) = &args.duration {
        editor.set_field(TemplateField::Duration(duration.clone()));
    }
    if let Some(ratio) = args.aspect_ratio {
        editor.set_field(TemplateField::AspectRatio(ratio));
    }
    if let Some(color) = &args.background {
        editor.set_field(TemplateField::BackgroundColor(color.clone()));
    }

    for text in &args.texts {
        let id = editor.add_element(ElementKindTag::Text);
        editor.update_element(id, &overlay_patch(text, ElementPatch::new().content(&text.content)));
    }
    for image in &args.images {
        let id = editor.add_element(ElementKindTag::Image);
        editor.update_element(id, &overlay_patch(image, ElementPatch::new().src(&image.content)));
    }

    let saved = studio.save().context("save template")?;
    saved
        .id
        .clone()
        .context("saved template has no id")
}

fn overlay_patch(overlay: &OverlayArg, patch: ElementPatch) -> ElementPatch {
    match overlay.window {
        Some((start, end)) => patch.window(start, end),
        None => patch,
    }
}

fn cmd_build(settings: StudioSettings, args: BuildArgs) -> anyhow::Result<()> {
    let kind = args.format.unwrap_or(settings.export.default_kind);
    let mut studio = Studio::with_settings(settings);
    let id = build_template(&mut studio, &args.template)?;

    match args.out {
        Some(dir) => {
            let path = studio
                .write_export(&id, kind, Some(&dir))
                .with_context(|| format!("write export into '{}'", dir.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{}", studio.export(&id, kind)?),
    }
    Ok(())
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct InspectReport {
    name: String,
    duration: u32,
    aspect_ratio: AspectRatio,
    samples: Vec<InspectSample>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct InspectSample {
    time: TimeSec,
    progress: f64,
    visible: Vec<VisibleElement>,
}

#[derive(Serialize, Debug)]
struct VisibleElement {
    id: u32,
    kind: ElementKindTag,
    content: String,
}

fn inspect(template: &Template, times: &[TimeSec]) -> InspectReport {
    let samples = times
        .iter()
        .map(|&time| InspectSample {
            time,
            progress: timeline::progress_ratio(time, template.duration_sec()),
            visible: timeline::visible_elements(template, time)
                .into_iter()
                .map(|e| VisibleElement {
                    id: e.id,
                    kind: e.tag(),
                    content: e.content_or_src().to_string(),
                })
                .collect(),
        })
        .collect();

    InspectReport {
        name: template.name.clone(),
        duration: template.duration,
        aspect_ratio: template.aspect_ratio,
        samples,
    }
}

fn cmd_inspect(settings: StudioSettings, args: InspectArgs) -> anyhow::Result<()> {
    let mut studio = Studio::with_settings(settings);
    build_template(&mut studio, &args.template)?;
    let template = studio.current().context("no current template")?;

    let report = inspect(template, &args.at);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn cmd_play(settings: StudioSettings, args: TemplateArgs) -> anyhow::Result<()> {
    let mut studio = Studio::with_settings(settings);
    build_template(&mut studio, &args)?;

    let mut clock = studio.preview_clock().context("no current template")?;
    let mut updates = clock.subscribe();
    clock.play()?;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *updates.borrow_and_update();
                let visible: Vec<String> = studio
                    .visible_at(snapshot.current_time)
                    .iter()
                    .map(|e| format!("{}#{}", e.tag(), e.id))
                    .collect();
                println!(
                    "{:>6.1}s {:>5.1}%  {}",
                    snapshot.current_time,
                    snapshot.progress * 100.0,
                    visible.join(" ")
                );
                if snapshot.state == PlaybackState::Stopped {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                clock.reset();
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_args(name: &str) -> TemplateArgs {
        TemplateArgs {
            name: name.to_string(),
            duration: None,
            aspect_ratio: None,
            background: None,
            texts: Vec::new(),
            images: Vec::new(),
        }
    }

    #[test]
    fn test_overlay_arg_plain() {
        let overlay: OverlayArg = "Hello world".parse().unwrap();
        assert_eq!(overlay.content, "Hello world");
        assert_eq!(overlay.window, None);
    }

    #[test]
    fn test_overlay_arg_with_window() {
        let overlay: OverlayArg = "Hi@1.5-4".parse().unwrap();
        assert_eq!(overlay.content, "Hi");
        assert_eq!(overlay.window, Some((1.5, 4.0)));
    }

    #[test]
    fn test_overlay_arg_keeps_at_sign_content() {
        let overlay: OverlayArg = "mail me@example.com".parse().unwrap();
        assert_eq!(overlay.content, "mail me@example.com");
        assert_eq!(overlay.window, None);
    }

    #[test]
    fn test_overlay_arg_errors() {
        assert_eq!("".parse::<OverlayArg>(), Err(ArgError::EmptyOverlay));
        assert_eq!("@0-1".parse::<OverlayArg>(), Err(ArgError::EmptyOverlay));
        assert_eq!(
            "Hi@5-1".parse::<OverlayArg>(),
            Err(ArgError::InvalidWindow("5-1".to_string()))
        );
    }

    #[test]
    fn test_cli_parses_build() {
        let cli = Cli::try_parse_from([
            "capforge",
            "build",
            "--name",
            "Intro",
            "--aspect-ratio",
            "16:9",
            "--text",
            "Hi@0-5",
            "--format",
            "template",
        ])
        .unwrap();

        match cli.cmd {
            Command::Build(args) => {
                assert_eq!(args.template.name, "Intro");
                assert_eq!(args.template.aspect_ratio, Some(AspectRatio::Horizontal));
                assert_eq!(args.template.texts.len(), 1);
                assert_eq!(args.format, Some(ExportKind::Template));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_bad_aspect_ratio() {
        let result = Cli::try_parse_from(["capforge", "play", "--name", "X", "--aspect-ratio", "4:3"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_build_template_applies_flags() {
        let mut args = template_args("Promo");
        args.duration = Some("8".to_string());
        args.texts.push("Sale@1-3".parse().unwrap());
        args.images.push("https://example.com/a.png".parse().unwrap());

        let mut studio = Studio::new();
        let id = build_template(&mut studio, &args).unwrap();
        let template = studio.store().get(&id).unwrap();

        assert_eq!(template.duration, 8);
        assert_eq!(template.elements.len(), 2);
        assert_eq!(template.elements[0].start_time, 1.0);
        assert_eq!(template.elements[0].end_time, 3.0);
        assert_eq!(template.elements[1].content_or_src(), "https://example.com/a.png");
        assert_eq!(template.elements[1].end_time, 8.0);
    }

    #[test]
    fn test_build_template_blank_name_fails() {
        let mut studio = Studio::new();
        assert!(build_template(&mut studio, &template_args("  ")).is_err());
    }

    #[test]
    fn test_inspect_report() {
        let mut args = template_args("Inspect");
        args.duration = Some("10".to_string());
        args.texts.push("A@0-2".parse().unwrap());
        args.texts.push("B@5-10".parse().unwrap());

        let mut studio = Studio::new();
        build_template(&mut studio, &args).unwrap();
        let report = inspect(studio.current().unwrap(), &[1.0, 5.0]);

        assert_eq!(report.samples.len(), 2);
        assert_eq!(report.samples[0].visible.len(), 1);
        assert_eq!(report.samples[0].visible[0].content, "A");
        assert_eq!(report.samples[1].progress, 0.5);
        assert_eq!(report.samples[1].visible[0].content, "B");
    }
}
