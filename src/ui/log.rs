//! Unified logging system

use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);
static QUIET: AtomicBool = AtomicBool::new(false);

const LOGO: &str = r#"
                                         __
  _________ _   _____  ______   ______  / /____
 / ___/ __ \ | / / _ \/ ___/ | / / __ \/ __/ _ \
/ /__/ /_/ / |/ /  __/ /   | |/ / /_/ / /_/  __/
\___/\____/|___/\___/_/    |___/\____/\__/\___/ "#;

const SLOGANS: &[&str] = &[
	"Twelve sources walk into a bar...",
	"Democracy, but for JPEGs",
	"The majority is always right (about album art)",
	"No more 404 on the front cover",
	"Squeezing 8MB scans into 500KB since today",
	"One of these things is not like the others",
	"Cover me, I'm going in!",
	"Hamming it up",
	"Consensus reached. Mostly.",
	"Judge a record by its cover",
];

pub fn random_slogan() -> &'static str {
	let idx = rand::random_range(0..SLOGANS.len());
	SLOGANS[idx]
}

pub fn print_logo() {
	println!("{}", LOGO.bright_blue().bold());
	println!("{}", random_slogan().dimmed().italic());
}

pub struct Log;

impl Log {
	pub fn set_verbose(enabled: bool) {
		VERBOSE.store(enabled, Ordering::Relaxed);
	}

	pub fn is_verbose() -> bool {
		VERBOSE.load(Ordering::Relaxed)
	}

	/// Suppress info/success lines (stdout stays machine-readable)
	pub fn set_quiet(enabled: bool) {
		QUIET.store(enabled, Ordering::Relaxed);
	}

	pub fn is_quiet() -> bool {
		QUIET.load(Ordering::Relaxed)
	}
}

pub fn info(msg: &str) {
	if !Log::is_quiet() {
		println!("{} {}", "ℹ".bright_blue().bold(), msg.bright_white());
	}
}

pub fn success(msg: &str) {
	if !Log::is_quiet() {
		println!("{} {}", "✓".bright_green().bold(), msg.bright_white());
	}
}

pub fn warn(msg: &str) {
	eprintln!("{} {}", "⚠".bright_yellow().bold(), msg.bright_white());
}

pub fn error(msg: &str) {
	eprintln!("{} {}", "✗".bright_red().bold(), msg.bright_white());
}

pub fn debug(msg: &str) {
	if Log::is_verbose() {
		eprintln!("{} {}", "⚙".bright_black().bold(), msg.dimmed());
	}
}

pub fn header(text: &str) {
	if !Log::is_quiet() {
		println!("\n{}", text.bright_blue().bold());
	}
}

/// Clickable file path (OSC 8 terminal hyperlink)
pub fn path_link(path: &std::path::Path, max_len: usize) -> String {
	let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

	let uri = if cfg!(windows) {
		let path_str = absolute.to_string_lossy();
		let cleaned = path_str.strip_prefix(r"\\?\").unwrap_or(&path_str);
		format!("file:///{}", cleaned.replace('\\', "/"))
	} else {
		format!("file://{}", absolute.display())
	};

	let filename = path
		.file_name()
		.and_then(|n| n.to_str())
		.unwrap_or("unknown");

	let chars: Vec<char> = filename.chars().collect();
	let display_name = if chars.len() > max_len && max_len > 6 {
		let head: String = chars[..max_len / 2].iter().collect();
		let tail: String = chars[chars.len() - (max_len / 2 - 3)..].iter().collect();
		format!("{}...{}", head, tail)
	} else {
		filename.to_string()
	};

	format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", uri, display_name)
}
