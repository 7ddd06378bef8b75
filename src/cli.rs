use clap::builder::styling::{AnsiColor, Styles};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

fn parse_threshold(s: &str) -> Result<f32, String> {
	let val: f32 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
	if !(0.0..=1.0).contains(&val) {
		Err(format!("threshold must be between 0.0 and 1.0, got {}", val))
	} else {
		Ok(val)
	}
}

fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Blue.on_default().bold())
		.usage(AnsiColor::Blue.on_default().bold())
		.literal(AnsiColor::Blue.on_default())
		.placeholder(AnsiColor::Yellow.on_default())
		.valid(AnsiColor::Blue.on_default())
		.invalid(AnsiColor::Red.on_default())
}

#[derive(Parser, Debug)]
#[command(
	name = "covervote",
	author,
	version,
	about = "Find album artwork by letting independent sources vote",
	styles = styles(),
	disable_help_subcommand = true,
	after_help = format!(
		"{title}
  {bin} {resolve}  {resolve_args}  {resolve_desc}
  {bin} {resolve}  {url_args}  {url_desc}
  {bin} {compare}  {compare_args}                 {compare_desc}
  {bin} {validate} {validate_args}                          {validate_desc}",
		title = "Examples:".bright_blue().bold(),
		bin = "covervote".bright_blue(),
		resolve = "resolve".yellow(),
		resolve_args = "\"Daft Punk\" Discovery -a ./covers/ -o cover",
		resolve_desc = "Vote among downloaded covers".dimmed(),
		url_args = "Artist Title -u 'https://host/{artist}/{title}.jpg'",
		url_desc = "Query a URL template".dimmed(),
		compare = "compare".yellow(),
		compare_args = "a.jpg b.png c.webp",
		compare_desc = "Show similarity matrix".dimmed(),
		validate = "validate".yellow(),
		validate_args = "cover.jpg",
		validate_desc = "Check embed constraints".dimmed(),
	),
)]
pub struct Cli {
	/// Enable verbose debug output
	#[arg(short = 'v', long = "verbose", global = true)]
	pub verbose: bool,

	/// Config file (JSON); defaults to $COVERVOTE_CONFIG
	#[arg(short = 'c', long = "config", global = true, value_name = "PATH")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Resolve artwork for an artist and title
	Resolve(ResolveArgs),

	/// Print pairwise similarity and clusters for local images
	Compare {
		/// Images to compare
		#[arg(value_name = "IMAGE", required = true, num_args = 1..)]
		images: Vec<PathBuf>,

		/// Similarity threshold for grouping (0.0-1.0)
		#[arg(short = 't', long = "threshold", value_parser = parse_threshold)]
		threshold: Option<f32>,
	},

	/// Check images against the embedding constraints
	Validate {
		/// Images to check
		#[arg(value_name = "IMAGE", required = true, num_args = 1..)]
		images: Vec<PathBuf>,
	},

	/// Show help for a subcommand
	Help {
		/// Subcommand name
		subcommand: Option<String>,
	},
}

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
	/// Artist name
	pub artist: String,

	/// Album or track title
	pub title: String,

	/// Directory searched for images named after the artist and title
	#[arg(short = 's', long = "search-dir", value_name = "DIR")]
	pub search_dirs: Vec<PathBuf>,

	/// Directory whose images are all candidates
	#[arg(short = 'a', long = "accept-dir", value_name = "DIR")]
	pub accept_dirs: Vec<PathBuf>,

	/// URL template with {artist} and {title} placeholders
	#[arg(short = 'u', long = "url", value_name = "TEMPLATE")]
	pub urls: Vec<String>,

	/// Write the artwork here (extension added from the image type if missing)
	#[arg(short = 'o', long = "output", value_name = "PATH")]
	pub output: Option<PathBuf>,

	/// Similarity threshold for agreement (0.0-1.0)
	#[arg(short = 't', long = "threshold", value_parser = parse_threshold)]
	pub threshold: Option<f32>,

	/// Stop querying new sources after this many candidates
	#[arg(long = "max-candidates")]
	pub max_candidates: Option<usize>,

	/// Per-source timeout in milliseconds
	#[arg(long = "timeout-ms")]
	pub timeout_ms: Option<u64>,

	/// Byte budget for the final image, in KB
	#[arg(long = "max-kb")]
	pub max_kb: Option<usize>,

	/// Print a JSON report instead of log lines
	#[arg(long = "json")]
	pub json: bool,
}
