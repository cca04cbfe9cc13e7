//! tracescope CLI entry point

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tracescope::cli::{CallsArgs, Cli, Commands, DeleteArgs, TreeArgs};
use tracescope::config::Config;
use tracescope::host::NullHost;
use tracescope::present::{self, TreeEntry};
use tracescope::session::Session;
use tracescope::store::{CallNode, TraceMetadata};
use tracescope::Result;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<String> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };
    let config = Config::load(&root)?;
    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path());
    let session = Session::new(config, Arc::new(NullHost));

    match cli.command {
        Commands::Recordings => run_recordings(&session),
        Commands::Tree(args) => run_tree(&session, &db_path, &args).await,
        Commands::Calls(args) => run_calls(&session, &db_path, &args).await,
        Commands::Info => run_info(&db_path),
        Commands::Delete(args) => run_delete(&session, &args).await,
    }
}

async fn run_delete(session: &Session, args: &DeleteArgs) -> Result<String> {
    session.delete_recording(&args.file).await?;
    Ok(format!("Deleted {}\n", args.file.display()))
}

fn run_recordings(session: &Session) -> Result<String> {
    let view = session.recordings();
    let items = view.list();
    if items.is_empty() {
        return Ok("No recordings found.\n".to_string());
    }

    let mut out = String::new();
    for item in &items {
        let tree_item = view.tree_item(item);
        if tree_item.description.is_empty() {
            out.push_str(&format!("{}\n", tree_item.label));
        } else {
            out.push_str(&format!("{}  {}\n", tree_item.label, tree_item.description));
        }
    }
    Ok(out)
}

async fn run_tree(session: &Session, db_path: &PathBuf, args: &TreeArgs) -> Result<String> {
    session.load_recording(db_path).await?;

    let tree = session.app_tree().read();
    let arena = tree.arena();
    let mut out = String::new();

    let top = match &args.file {
        Some(file) => match tree.node_by_file(file) {
            Some(node) => vec![TreeEntry::Node(node)],
            None => Vec::new(),
        },
        None => present::top_level(&tree),
    };
    for entry in &top {
        print_entry(arena, entry, 0, &mut out);
    }
    Ok(out)
}

fn print_entry(
    arena: &tracescope::tree::TreeArena,
    entry: &TreeEntry,
    indent: usize,
    out: &mut String,
) {
    let item = present::tree_item(arena, entry);
    let padding = "  ".repeat(indent);
    if item.description.is_empty() {
        out.push_str(&format!("{padding}{}\n", item.label));
    } else {
        out.push_str(&format!("{padding}{}  ({})\n", item.label, item.description));
    }
    for child in present::children(arena, entry) {
        print_entry(arena, &child, indent + 1, out);
    }
}

async fn run_calls(session: &Session, db_path: &PathBuf, args: &CallsArgs) -> Result<String> {
    session.load_recording(db_path).await?;

    let view = session.calltree();
    let max_depth = args.depth.unwrap_or(usize::MAX);
    let mut out = String::new();
    for mut root in view.roots() {
        print_call(session, &mut root, max_depth, &mut out);
    }
    Ok(out)
}

fn print_call(session: &Session, node: &mut CallNode, max_depth: usize, out: &mut String) {
    let padding = "  ".repeat(node.depth as usize);
    let location = if node.line.is_empty() {
        node.file.clone()
    } else {
        format!("{}:{}", node.file, node.line)
    };
    out.push_str(&format!("{padding}{}  {location}\n", node.display_name()));

    if (node.depth as usize) >= max_depth {
        return;
    }
    for mut child in session.calltree().children(node) {
        print_call(session, &mut child, max_depth, out);
    }
}

fn run_info(db_path: &PathBuf) -> Result<String> {
    let meta = TraceMetadata::load(db_path)?;
    let mut out = String::new();
    out.push_str(&format!("Recording:   {}\n", meta.name));
    out.push_str(&format!("File:        {}\n", meta.db_path.display()));
    if !meta.description.is_empty() {
        out.push_str(&format!("Description: {}\n", meta.description));
    }
    if !meta.caller_class.is_empty() || !meta.caller_method.is_empty() {
        out.push_str(&format!(
            "Trigger:     {}#{} ({}:{})\n",
            meta.caller_class, meta.caller_method, meta.caller_file, meta.caller_line
        ));
    }
    if !meta.start_time.is_empty() {
        out.push_str(&format!(
            "Recorded:    {} .. {} ({} ms)\n",
            meta.start_time, meta.end_time, meta.duration_ms
        ));
    }
    Ok(out)
}
