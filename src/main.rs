//! snag - construction snag tracker.
//!
//! Provides both human-friendly and agent-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::io;

use clap::{CommandFactory, Parser};
use serde::Serialize;
use tracing::debug;

use snag::cli::{
    Cli, Commands, CompletionsArgs, ConfirmArgs, DeleteArgs, EditArgs, IdArg, ListArgs, NewArgs,
    PhotoAddArgs, PhotoCommands, PhotoExportArgs, SweepArgs,
};
use snag::config::Settings;
use snag::error::{Result, ResultExt, SnagError};
use snag::lifecycle::Tracker;
use snag::logging::init_logging;
use snag::output::{Output, OutputMode, PhotoView, SnagDetail};
use snag::record::Snag;

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn git_sha() -> Option<&'static str> {
        option_env!("VERGEN_GIT_SHA")
    }

    pub fn build_timestamp() -> Option<&'static str> {
        option_env!("VERGEN_BUILD_TIMESTAMP")
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.use_json(), cli.verbose, cli.quiet);

    let out = OutputMode::from_cli(&cli).into_output();
    if let Err(e) = run(&cli, out.as_ref()) {
        out.error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, out: &dyn Output) -> Result<()> {
    match &cli.command {
        None => print_quick_start(cli),
        Some(Commands::Version) => {
            out.version_info(
                build_info::VERSION,
                build_info::git_sha(),
                build_info::build_timestamp(),
            );
            Ok(())
        }
        Some(Commands::Completions(args)) => cmd_completions(args),
        Some(Commands::Config) => cmd_config(cli),
        Some(command) => {
            let settings = Settings::load(&cli.overrides())?;
            let mut tracker = Tracker::open(&settings)?;
            dispatch(command, &settings, &mut tracker, out)
        }
    }
}

fn dispatch(
    command: &Commands,
    settings: &Settings,
    tracker: &mut Tracker,
    out: &dyn Output,
) -> Result<()> {
    match command {
        Commands::New(args) => cmd_new(tracker, out, args),
        Commands::List(args) => cmd_list(tracker, out, args),
        Commands::Show(args) => cmd_show(tracker, out, args),
        Commands::Edit(args) => cmd_edit(tracker, out, args),
        Commands::Delete(args) => cmd_delete(tracker, out, args),
        Commands::Photo(PhotoCommands::Add(args)) => cmd_photo_add(settings, tracker, out, args),
        Commands::Photo(PhotoCommands::Show(args)) => cmd_photo_show(tracker, out, args),
        Commands::Photo(PhotoCommands::Rm(args)) => cmd_photo_rm(tracker, out, args),
        Commands::Photo(PhotoCommands::Export(args)) => cmd_photo_export(tracker, out, args),
        Commands::Storage => {
            out.storage_usage(&tracker.storage_usage()?);
            Ok(())
        }
        Commands::Sweep(args) => cmd_sweep(tracker, out, args),
        Commands::ClearImages(args) => cmd_clear_images(tracker, out, args),
        Commands::Version | Commands::Completions(_) | Commands::Config => Ok(()),
    }
}

// === Snags ===

fn cmd_new(tracker: &mut Tracker, out: &dyn Output, args: &NewArgs) -> Result<()> {
    let title = args.title.trim();
    if title.is_empty() {
        return Err(SnagError::InvalidField {
            field: "title",
            value: args.title.clone(),
        });
    }
    let snag = Snag::new(title)
        .with_location(args.location.trim())
        .with_notes(args.notes.as_str())
        .with_priority(args.priority)
        .with_status(args.status);
    tracker.create_snag(&snag)?;
    out.snag_created(&snag);
    Ok(())
}

fn cmd_list(tracker: &Tracker, out: &dyn Output, args: &ListArgs) -> Result<()> {
    let snags = tracker.db().list_snags(&args.filter())?;
    out.snag_list(&snags);
    Ok(())
}

fn cmd_show(tracker: &Tracker, out: &dyn Output, args: &IdArg) -> Result<()> {
    let id = tracker.db().resolve_snag_id(&args.id)?;
    let snag = tracker.db().require_snag(&id)?;
    out.snag_detail(&SnagDetail::new(snag, tracker.blobs()));
    Ok(())
}

fn cmd_edit(tracker: &mut Tracker, out: &dyn Output, args: &EditArgs) -> Result<()> {
    let patch = args.patch();
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(SnagError::InvalidField {
            field: "title",
            value: String::new(),
        });
    }
    let id = tracker.db().resolve_snag_id(&args.id)?;
    let before = tracker.db().require_snag(&id)?.updated_at;
    let snag = tracker.db_mut().update_snag(&id, &patch)?;
    out.snag_updated(&snag, snag.updated_at != before);
    Ok(())
}

fn cmd_delete(tracker: &mut Tracker, out: &dyn Output, args: &DeleteArgs) -> Result<()> {
    require_confirmation(&args.confirm, "delete a snag")?;
    let id = tracker.db().resolve_snag_id(&args.id)?;
    let outcome = tracker.delete_snag(&id)?;
    if !outcome.deleted {
        return Err(SnagError::SnagNotFound { id: id.to_string() });
    }
    out.snag_deleted(&id, &outcome);
    Ok(())
}

// === Photos ===

fn cmd_photo_add(
    settings: &Settings,
    tracker: &mut Tracker,
    out: &dyn Output,
    args: &PhotoAddArgs,
) -> Result<()> {
    let snag_id = tracker.db().resolve_snag_id(&args.snag)?;
    let quality = args.quality.unwrap_or(settings.jpeg_quality);
    debug!(%snag_id, quality, image = %args.image.display(), "Adding photo");
    let photo = tracker.add_photo_from_path(&snag_id, &args.image, quality)?;
    out.photo_added(&photo);
    Ok(())
}

fn cmd_photo_show(tracker: &Tracker, out: &dyn Output, args: &IdArg) -> Result<()> {
    let id = tracker.db().resolve_photo_id(&args.id)?;
    let photo = tracker.db().require_photo(&id)?;
    out.photo_detail(&PhotoView::new(photo, tracker.blobs()));
    Ok(())
}

fn cmd_photo_rm(tracker: &mut Tracker, out: &dyn Output, args: &IdArg) -> Result<()> {
    let id = tracker.db().resolve_photo_id(&args.id)?;
    let outcome = tracker.delete_photo(&id)?;
    if !outcome.deleted {
        return Err(SnagError::PhotoNotFound { id: id.to_string() });
    }
    out.photo_removed(&id, &outcome);
    Ok(())
}

fn cmd_photo_export(tracker: &Tracker, out: &dyn Output, args: &PhotoExportArgs) -> Result<()> {
    let id = tracker.db().resolve_photo_id(&args.id)?;
    let photo = tracker.db().require_photo(&id)?;
    let bytes = tracker
        .photo_bytes(&photo)
        .ok_or_else(|| SnagError::BlobMissing {
            photo: photo.id.to_string(),
            key: photo.filename.to_string(),
        })?;
    std::fs::write(&args.out, &bytes)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;
    out.photo_exported(&photo, &args.out, bytes.len());
    Ok(())
}

// === Storage ===

fn cmd_sweep(tracker: &mut Tracker, out: &dyn Output, args: &SweepArgs) -> Result<()> {
    let report = tracker.sweep_orphans(args.dry_run)?;
    out.sweep_report(&report);
    Ok(())
}

fn cmd_clear_images(tracker: &mut Tracker, out: &dyn Output, args: &ConfirmArgs) -> Result<()> {
    require_confirmation(args, "delete every image file")?;
    let removed = tracker.clear_images()?;
    out.images_cleared(removed);
    Ok(())
}

fn cmd_config(cli: &Cli) -> Result<()> {
    let settings = Settings::load(&cli.overrides())?;
    if cli.use_json() {
        output_json(cli, &settings);
    } else {
        println!("data_dir       = {}", settings.data_dir.display());
        println!("jpeg_quality   = {}", settings.jpeg_quality);
        println!("sweep_on_start = {}", settings.sweep_on_start);
        match &settings.source {
            Some(path) => println!("# from {}", path.display()),
            None => println!("# defaults (no config file)"),
        }
    }
    Ok(())
}

// === Utilities ===

#[allow(clippy::unnecessary_wraps)] // Consistent return type with other commands
fn cmd_completions(args: &CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(args.shell, &mut cmd, "snag", &mut io::stdout());
    Ok(())
}

fn require_confirmation(confirm: &ConfirmArgs, action: &'static str) -> Result<()> {
    if confirm.yes {
        Ok(())
    } else {
        Err(SnagError::ConfirmationRequired { action })
    }
}

/// Prints quick-start help optimized for both humans and AI agents.
#[allow(clippy::unnecessary_wraps)]
fn print_quick_start(cli: &Cli) -> Result<()> {
    #[derive(Serialize)]
    struct QuickStart {
        tool: &'static str,
        version: &'static str,
        description: &'static str,
        commands: [(&'static str, &'static str); 9],
        output_modes: [&'static str; 3],
    }

    let help = QuickStart {
        tool: "snag",
        version: build_info::VERSION,
        description: "Construction snag tracker with photo storage",
        commands: [
            ("create", "snag new <TITLE> --location <WHERE> --priority high"),
            ("list", "snag list --status open --robot"),
            ("show", "snag show <ID>"),
            ("edit", "snag edit <ID> --status closed"),
            ("attach", "snag photo add <ID> <IMAGE>"),
            ("detach", "snag photo rm <PHOTO_ID>"),
            ("delete", "snag delete <ID> --yes"),
            ("usage", "snag storage"),
            ("reclaim", "snag sweep --dry-run"),
        ],
        output_modes: [
            "--format=text (default)",
            "--robot or --format=json",
            "--format=json-compact",
        ],
    };

    if cli.use_json() {
        output_json(cli, &help);
    } else {
        println!("snag {} - {}\n", help.version, help.description);
        for (name, example) in help.commands {
            println!("  {name:<8} {example}");
        }
        println!("\nRun `snag --help` for all commands.");
    }
    Ok(())
}

fn output_json<T: Serialize>(cli: &Cli, data: &T) {
    let json = if cli.use_compact_json() {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("{{\"error\":true,\"message\":\"serialization failed: {e}\"}}"),
    }
}
