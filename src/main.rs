use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;
use mini_graphlab::analysis::path::{PathType, WeightMode};
use mini_graphlab::graph::{GeneratorParams, GraphModel, LayoutAlgorithm};
use mini_graphlab::{
    AnalysisSession, EngineConfig, GraphLabError, GraphOperations, GraphType, Metric, PathOutcome, Result,
};

/// Mini GraphLab - graph analysis and path-finding from the command line
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (TOML); GRAPHLAB_* environment variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for every randomised step
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Structural properties, average metrics and the node table
    Analyze(GraphInput),
    /// Shortest, strongest or critical path between two nodes
    Path(PathCommand),
    /// Girvan-Newman community levels
    Communities(GraphInput),
    /// Maximal cliques
    Cliques(GraphInput),
    /// Generate a graph from a model and print it as an edge list
    Generate(ModelArgs),
    /// Grow a Barabasi-Albert graph and report the metric time series
    Evolve(EvolveCommand),
    /// Node rankings and metric distributions
    Rank(RankCommand),
    /// Print the effective configuration
    Config,
}

#[derive(Args)]
struct GraphInput {
    /// Edge-list file: `source target [weight]` per line
    file: PathBuf,

    /// Graph type of the edge list
    #[arg(short = 't', long, default_value = "undirected")]
    graph_type: GraphType,

    /// Layout used for node positions
    #[arg(short, long)]
    layout: Option<String>,
}

#[derive(Args)]
struct PathCommand {
    #[command(flatten)]
    input: GraphInput,

    #[arg(short, long)]
    source: String,

    #[arg(short = 'd', long)]
    target: String,

    /// shortest, strongest or critical
    #[arg(short = 'p', long, default_value = "shortest")]
    path_type: PathType,

    /// Honour edge weights
    #[arg(short, long)]
    weighted: bool,
}

#[derive(Args)]
struct ModelArgs {
    /// erdos, binomial, watts_strogatz, regular, random or barabasi
    #[arg(short, long)]
    model: GraphModel,

    #[arg(short, long)]
    nodes: usize,

    #[arg(short = 't', long, default_value = "undirected")]
    graph_type: GraphType,

    #[arg(short, long)]
    probability: Option<f64>,

    /// Edge count (random) or neighbour count (watts_strogatz)
    #[arg(short, long)]
    edges: Option<usize>,

    /// Degree (regular) or attachment degree (barabasi)
    #[arg(short, long)]
    degree: Option<usize>,

    /// Retry Watts-Strogatz until the result is connected
    #[arg(long)]
    connected: bool,
}

impl ModelArgs {
    fn params(&self) -> GeneratorParams {
        let mut params = GeneratorParams::new(self.model, self.nodes, self.graph_type)
            .connected(self.connected);
        if let Some(p) = self.probability {
            params = params.with_probability(p);
        }
        if let Some(m) = self.edges {
            params = params.with_edges(m);
        }
        if let Some(d) = self.degree {
            params = params.with_degree(d);
        }
        params
    }
}

#[derive(Args)]
struct EvolveCommand {
    /// Seed nodes of the complete starting graph
    #[arg(short, long)]
    nodes: usize,

    /// Edges created by every new node
    #[arg(short, long)]
    degree: Option<usize>,

    #[arg(short = 't', long, default_value = "undirected")]
    graph_type: GraphType,

    #[arg(short, long, default_value_t = 10)]
    steps: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum RankKind {
    Color,
    Size,
    Hybrid,
    Distribution,
}

#[derive(Args)]
struct RankCommand {
    #[command(flatten)]
    input: GraphInput,

    #[arg(short, long, value_enum, default_value = "size")]
    kind: RankKind,

    /// Metric ranked (size metric for hybrid rankings)
    #[arg(short, long)]
    metric: Metric,

    /// Colour metric for hybrid rankings
    #[arg(long)]
    color_metric: Option<Metric>,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "mini_graphlab=debug,graphlab=debug" } else { "mini_graphlab=info,graphlab=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>, seed: Option<u64>) -> Result<EngineConfig> {
    let mut config = mini_graphlab::init(path)?;
    if seed.is_some() {
        config.rng_seed = seed;
    }
    Ok(config)
}

fn open_session(input: &GraphInput, config: EngineConfig) -> Result<AnalysisSession> {
    let text = fs::read_to_string(&input.file)?;
    let mut session = AnalysisSession::from_edge_list(&text, input.graph_type, config)?;
    if let Some(name) = &input.layout {
        session.set_layout(LayoutAlgorithm::from_name(name));
    }
    tracing::info!("Loaded {} ({} nodes)", input.file.display(), session.store().node_count());
    Ok(session)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref(), cli.seed)?;

    match cli.command {
        Commands::Analyze(input) => handle_analyze(&input, config),
        Commands::Path(cmd) => handle_path(&cmd, config),
        Commands::Communities(input) => handle_communities(&input, config),
        Commands::Cliques(input) => handle_cliques(&input, config),
        Commands::Generate(args) => handle_generate(&args, config),
        Commands::Evolve(cmd) => handle_evolve(&cmd, config),
        Commands::Rank(cmd) => handle_rank(&cmd, config),
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn handle_analyze(input: &GraphInput, config: EngineConfig) -> Result<()> {
    let mut session = open_session(input, config)?;
    let properties = session.compute_metrics()?;
    let averages = session.average_metrics()?;
    let edge_averages = session.average_edge_metrics().ok();
    let nodes = session.node_table()?;
    let edges = session.edge_table()?;

    print_json(&json!({
        "properties": properties,
        "averages": averages,
        "edge_averages": edge_averages,
        "nodes": nodes,
        "edges": edges,
    }))
}

fn handle_path(cmd: &PathCommand, config: EngineConfig) -> Result<()> {
    let session = open_session(&cmd.input, config)?;
    let weight_mode = if cmd.weighted { WeightMode::Weighted } else { WeightMode::Unweighted };
    let outcome = session.find_path(&cmd.source, &cmd.target, cmd.path_type, weight_mode)?;

    let report = match &outcome {
        PathOutcome::Found(result) => json!({
            "status": "found",
            "length": result.length,
            "sequences": result.sequences,
            "path_edges": result.path_edges(),
            "nodes_not_in_paths": result.nodes_not_in_paths(session.store()),
        }),
        PathOutcome::NoPath => json!({ "status": "no_path" }),
        PathOutcome::NegativeCycle => json!({ "status": "negative_cycle" }),
    };
    print_json(&report)
}

fn handle_communities(input: &GraphInput, config: EngineConfig) -> Result<()> {
    let session = open_session(input, config)?;
    let levels = session.detect_communities();
    print_json(&serde_json::to_value(&levels)?)
}

fn handle_cliques(input: &GraphInput, config: EngineConfig) -> Result<()> {
    let session = open_session(input, config)?;
    let cliques = session.find_cliques()?;
    print_json(&json!({ "count": cliques.len(), "cliques": cliques }))
}

fn handle_generate(args: &ModelArgs, config: EngineConfig) -> Result<()> {
    let session = AnalysisSession::from_model(&args.params(), config)?;
    print!("{}", session.export_text());
    Ok(())
}

fn handle_evolve(cmd: &EvolveCommand, config: EngineConfig) -> Result<()> {
    let mut params = GeneratorParams::new(GraphModel::Barabasi, cmd.nodes, cmd.graph_type);
    if let Some(d) = cmd.degree {
        params = params.with_degree(d);
    }
    let mut session = AnalysisSession::from_model(&params, config)?;
    let series = session.simulate_evolution(cmd.steps)?;

    let rows: BTreeMap<usize, Value> = series.degree.iter()
        .map(|(step, degree)| {
            let path_length = series.path_length.get(step).copied().flatten();
            (*step, json!({ "degree": degree, "path_length": path_length }))
        })
        .collect();
    print_json(&serde_json::to_value(rows)?)
}

fn handle_rank(cmd: &RankCommand, config: EngineConfig) -> Result<()> {
    let mut session = open_session(&cmd.input, config)?;
    if !cmd.metric.applies_to(session.store().graph_type()) {
        return Err(GraphLabError::bad_parameter(format!(
            "metric '{}' is not defined for {} graphs",
            cmd.metric, session.store().graph_type()
        )));
    }

    let value = match cmd.kind {
        RankKind::Color => serde_json::to_value(session.color_ranking(cmd.metric)?)?,
        RankKind::Size => serde_json::to_value(session.size_ranking(cmd.metric)?)?,
        RankKind::Distribution => serde_json::to_value(session.distribution(cmd.metric)?)?,
        RankKind::Hybrid => {
            let color = cmd.color_metric
                .ok_or_else(|| GraphLabError::bad_parameter("hybrid ranking needs --color-metric"))?;
            serde_json::to_value(session.hybrid_ranking(cmd.metric, color)?)?
        }
    };
    print_json(&value)
}
