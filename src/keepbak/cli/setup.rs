use clap::Parser;
use keepbak::config::DEFAULT_COPIES;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "keepbak", bin_name = "keepbak", version)]
#[command(about = "Date-stamped file and directory backups with retention", long_about = None)]
pub struct Cli {
    /// File or directory to back up
    pub src: PathBuf,

    /// Backup directory (created if missing; its parent must exist)
    pub dest: PathBuf,

    /// Maximum number of copies to keep
    #[arg(long, default_value_t = DEFAULT_COPIES, value_name = "N")]
    pub copies: usize,

    /// Log each kept and removed backup
    #[arg(short, long)]
    pub verbose: bool,

    /// Print nothing on success
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
