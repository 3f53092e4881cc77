mod transport;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::warn;

use nc_app::{
    AppError, AppResult, CodeGenerator, ExportFormat, Framework, Provider, ServiceGenerator, Session, SessionConfig,
    SkeletonGenerator, build_prompt, env_lookup, project_service, system_message,
};
use nc_blocks::{BlockCategory, BlockRegistry};

#[derive(Parser)]
#[command(name = "nc-cli")]
#[command(about = "NeuroCanvas CLI - Neural network architecture graphs", long_about = None)]
struct Cli {
    /// Session config YAML (defaults apply when absent)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the block palette
    Blocks {
        /// Only show one category (layer, activation, operation, attention)
        #[arg(long)]
        category: Option<String>,
    },
    /// List built-in architecture templates
    Templates,
    /// Write a template as a graph document
    Template {
        /// Template id (see `templates`)
        id: String,
        /// Output file (.json or .yaml); stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load a graph document and report repairs and invalid edges
    Validate {
        /// Path to the graph document
        graph_path: PathBuf,
    },
    /// Print the code-generation prompt for a graph
    Prompt {
        graph_path: PathBuf,
        #[arg(long)]
        framework: Option<String>,
    },
    /// Generate model code for a graph (offline skeleton unless --provider)
    Generate {
        graph_path: PathBuf,
        #[arg(long)]
        framework: Option<String>,
        /// Hosted provider (gemini, openai, together, openrouter, mistral)
        #[arg(long)]
        provider: Option<String>,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Package a code file as a script or notebook
    Export {
        /// Path to the generated code
        code_path: PathBuf,
        /// py or ipynb
        #[arg(long)]
        format: String,
        /// File name without extension
        #[arg(long)]
        filename: Option<String>,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Record a named version of a graph document
    Snapshot {
        graph_path: PathBuf,
        #[arg(long)]
        name: String,
    },
    /// List recorded versions of a graph document
    Versions { graph_path: PathBuf },
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };

    match cli.command {
        Commands::Blocks { category } => cmd_blocks(category.as_deref()),
        Commands::Templates => cmd_templates(),
        Commands::Template { id, output } => cmd_template(&id, output.as_deref()),
        Commands::Validate { graph_path } => cmd_validate(&graph_path, config),
        Commands::Prompt {
            graph_path,
            framework,
        } => cmd_prompt(&graph_path, framework.as_deref(), config),
        Commands::Generate {
            graph_path,
            framework,
            provider,
            output,
        } => cmd_generate(
            &graph_path,
            framework.as_deref(),
            provider.as_deref(),
            output.as_deref(),
            config,
        ),
        Commands::Export {
            code_path,
            format,
            filename,
            out_dir,
        } => cmd_export(&code_path, &format, filename.as_deref(), &out_dir, &config),
        Commands::Snapshot { graph_path, name } => cmd_snapshot(&graph_path, &name),
        Commands::Versions { graph_path } => cmd_versions(&graph_path),
    }
}

fn cmd_blocks(category: Option<&str>) -> AppResult<()> {
    let registry = BlockRegistry::shared();
    let categories = match category {
        Some(name) => vec![name.parse::<BlockCategory>().map_err(|_| AppError::UnknownOption {
            what: "category",
            value: name.to_string(),
        })?],
        None => registry.categories(),
    };

    for category in categories {
        println!("{category}:");
        for block in registry.list_by_category(category) {
            println!(
                "  {:<22} {} in / {} out  {}",
                block.type_name,
                block.inputs.len(),
                block.outputs.len(),
                block.description
            );
        }
    }
    Ok(())
}

fn cmd_templates() -> AppResult<()> {
    for template in nc_project::builtin_templates()? {
        println!(
            "  {:<18} [{}] {} - {}",
            template.id, template.category, template.name, template.description
        );
    }
    Ok(())
}

fn cmd_template(id: &str, output: Option<&Path>) -> AppResult<()> {
    let template = nc_project::find_template(id)?.ok_or_else(|| AppError::UnknownOption {
        what: "template",
        value: id.to_string(),
    })?;
    match output {
        Some(path) => {
            nc_project::save(path, &template.graph)?;
            println!("✓ Wrote {} to {}", template.name, path.display());
        }
        None => println!("{}", nc_project::to_json_string(&template.graph)?),
    }
    Ok(())
}

fn open(graph_path: &Path, config: SessionConfig) -> AppResult<Session> {
    let (session, report) = project_service::open_document(graph_path, config)?;
    for diagnostic in report.iter() {
        warn!(%diagnostic, "load repair");
    }
    Ok(session)
}

fn cmd_validate(graph_path: &Path, config: SessionConfig) -> AppResult<()> {
    println!("Validating graph: {}", graph_path.display());
    let (session, report) = project_service::open_document(graph_path, config)?;

    for diagnostic in report.iter() {
        println!("  repair: {diagnostic}");
    }
    let graph = session.graph();
    for edge in graph.edges() {
        if let Some(message) = edge.error_message() {
            println!("  invalid edge {}: {}", edge.id, message);
        }
    }
    for node in graph.nodes() {
        for issue in graph.param_issues(&node.id)? {
            println!("  node {}: {}", node.id, issue);
        }
    }

    let summary = project_service::summarize(&session);
    println!(
        "✓ {} nodes, {} edges ({} invalid){}",
        summary.node_count,
        summary.edge_count,
        summary.invalid_edges,
        if summary.has_cycle { ", contains a cycle" } else { "" }
    );
    Ok(())
}

fn apply_framework(session: &mut Session, framework: Option<&str>) -> AppResult<()> {
    if let Some(name) = framework {
        session.set_framework(name.parse::<Framework>()?);
    }
    Ok(())
}

fn cmd_prompt(graph_path: &Path, framework: Option<&str>, config: SessionConfig) -> AppResult<()> {
    let mut session = open(graph_path, config)?;
    apply_framework(&mut session, framework)?;
    if session.graph().nodes().is_empty() {
        return Err(AppError::EmptyGraph);
    }
    println!("# {}", system_message(session.framework()));
    println!();
    println!("{}", build_prompt(&session.serialize_graph(), session.framework()));
    Ok(())
}

fn cmd_generate(
    graph_path: &Path,
    framework: Option<&str>,
    provider: Option<&str>,
    output: Option<&Path>,
    config: SessionConfig,
) -> AppResult<()> {
    let mut session = open(graph_path, config)?;
    apply_framework(&mut session, framework)?;

    let service = ServiceGenerator::new(env_lookup, transport::send);
    let skeleton = SkeletonGenerator::default();
    let generator: &dyn CodeGenerator = match provider {
        Some(name) => {
            session.set_provider(name.parse::<Provider>()?);
            &service
        }
        None => &skeleton,
    };
    session.generate_with(generator)?;

    match output {
        Some(path) => {
            std::fs::write(path, session.generated_code())?;
            println!(
                "✓ Wrote {} code for {} nodes to {}",
                session.framework(),
                session.node_mapping().len(),
                path.display()
            );
        }
        None => println!("{}", session.generated_code()),
    }
    Ok(())
}

fn cmd_export(
    code_path: &Path,
    format: &str,
    filename: Option<&str>,
    out_dir: &Path,
    config: &SessionConfig,
) -> AppResult<()> {
    let code = std::fs::read_to_string(code_path)?;
    if code.trim().is_empty() {
        return Err(AppError::NoCode);
    }
    let format: ExportFormat = format.parse()?;
    let file = nc_app::export(&code, format, Some(filename.unwrap_or(&config.export_filename)))?;
    let path = file.write_to(out_dir)?;
    println!("✓ Exported {} ({})", path.display(), file.content_type);
    Ok(())
}

fn cmd_snapshot(graph_path: &Path, name: &str) -> AppResult<()> {
    let info = project_service::snapshot_document(graph_path, name)?;
    println!("✓ Saved version {} '{}'", info.id, info.name);
    println!("  Hash: {}", info.content_hash);
    println!("  Nodes: {}  Edges: {}", info.node_count, info.edge_count);
    Ok(())
}

fn cmd_versions(graph_path: &Path) -> AppResult<()> {
    let versions = project_service::list_document_versions(graph_path)?;
    if versions.is_empty() {
        println!("No versions recorded for {}", graph_path.display());
        return Ok(());
    }
    for v in versions {
        println!(
            "  {}  {}  {:<20} {} nodes, {} edges",
            v.created_at, v.id, v.name, v.node_count, v.edge_count
        );
    }
    Ok(())
}
