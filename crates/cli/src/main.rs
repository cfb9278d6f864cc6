use anyhow::Result;
use clap::{Parser, Subcommand};
use iconsweep::commands::{
    consolidate_command, consolidate_library_command, handle_command, init_project_command,
    list_markings_command, list_runs_command, mark_command, preview_command, project_info_command,
    scan_command, show_config_command,
};
use iconsweep::init_tracing;

/// Icon discovery and consolidation for design documents.
///
/// This CLI is a thin wrapper around `iconsweep-core` (exposed in code as
/// `iconsweep_core`). Documents are JSON snapshots of a design tree; all
/// heuristics and rewrites live in the library.
#[derive(Parser, Debug)]
#[command(
    name = "iconsweep",
    version,
    about = "Find, audit and consolidate icons in design documents",
    long_about = None
)]
struct Cli {
    /// Log at debug level (overridden by ICONSWEEP_LOG).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new iconsweep project at the given root.
    ///
    /// This will:
    /// - Create a `.iconsweep` metadata directory and a `reports` directory.
    /// - Write a `.iconsweep/project.json` config file.
    /// - Create the project database.
    InitProject {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional project name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,

        /// Document snapshot used when a command is run without --document.
        #[arg(long)]
        document: Option<String>,

        /// YAML or JSON file with engine settings to embed in the project config.
        #[arg(long)]
        engine_config: Option<String>,
    },

    /// Show basic information about an existing project.
    ProjectInfo {
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the engine settings of the project.
    ShowConfig {
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit YAML instead of JSON.
        #[arg(long, default_value_t = false)]
        yaml: bool,
    },

    /// Discover icons and report naming and duplication issues.
    Scan {
        #[arg(long, default_value = ".")]
        root: String,

        /// Document snapshot (JSON). Defaults to the project's default document.
        #[arg(long)]
        document: Option<String>,

        /// Page the user is currently on.
        #[arg(long)]
        page: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Turn duplicate unresolved icons into library masters and instances.
    Consolidate {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        document: Option<String>,

        /// all-pages or current-page.
        #[arg(long, default_value = "all-pages")]
        scope: String,

        /// Current page; required for --scope current-page.
        #[arg(long)]
        page: Option<String>,

        /// Write the rewritten document here instead of over the input.
        #[arg(long)]
        output: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Merge duplicate masters that live on one page.
    ConsolidateLibrary {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        document: Option<String>,

        /// Page holding the masters to merge.
        #[arg(long)]
        page: String,

        #[arg(long)]
        output: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Ignore a node, flag it for swapping, or clear its marking.
    Mark {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        node_id: String,

        /// true/false: exclude the node from scans.
        #[arg(long)]
        ignore: Option<bool>,

        /// true/false: flag the node for replacement.
        #[arg(long)]
        swap: Option<bool>,

        /// Remove the stored marking.
        #[arg(long, default_value_t = false, conflicts_with_all = ["ignore", "swap"])]
        clear: bool,
    },

    /// List stored markings.
    ListMarkings {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List recorded scan and consolidation runs.
    ListRuns {
        #[arg(long, default_value = ".")]
        root: String,

        /// Only runs for this document (as recorded, relative to the root).
        #[arg(long)]
        document: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Render an SVG preview of a node.
    Preview {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        document: Option<String>,

        #[arg(long)]
        node_id: String,

        /// Write the SVG to this file instead of stdout.
        #[arg(long)]
        output: Option<String>,
    },

    /// Answer one JSON host request; responses are printed one per line.
    Handle {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        document: Option<String>,

        /// Request file, or `-` for stdin.
        #[arg(long, default_value = "-")]
        request: String,

        /// Leave the document untouched even if the request rewrites it.
        #[arg(long, default_value_t = false)]
        no_write: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::InitProject { root, name, document, engine_config } => {
            init_project_command(&root, name, document, engine_config.as_deref())?
        }
        Command::ProjectInfo { root, json } => project_info_command(&root, json)?,
        Command::ShowConfig { root, yaml } => show_config_command(&root, yaml)?,
        Command::Scan { root, document, page, json } => {
            scan_command(&root, document.as_deref(), page, json)?
        }
        Command::Consolidate { root, document, scope, page, output, json } => consolidate_command(
            &root,
            document.as_deref(),
            &scope,
            page,
            output.as_deref(),
            json,
        )?,
        Command::ConsolidateLibrary { root, document, page, output, json } => {
            consolidate_library_command(&root, document.as_deref(), &page, output.as_deref(), json)?
        }
        Command::Mark { root, node_id, ignore, swap, clear } => {
            mark_command(&root, &node_id, ignore, swap, clear)?
        }
        Command::ListMarkings { root, json } => list_markings_command(&root, json)?,
        Command::ListRuns { root, document, json } => {
            list_runs_command(&root, document.as_deref(), json)?
        }
        Command::Preview { root, document, node_id, output } => {
            preview_command(&root, document.as_deref(), &node_id, output.as_deref())?
        }
        Command::Handle { root, document, request, no_write } => {
            handle_command(&root, document.as_deref(), &request, !no_write)?
        }
    }

    Ok(())
}
