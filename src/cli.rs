use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "stackadmin", version, about = "Terminal admin panel for betting stacks")]
pub struct Args {
    /// Path to a config file (defaults to <config dir>/stackadmin/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON file of stacks to load at startup, overriding `[store] seed_file`
    #[arg(short, long)]
    pub seed: Option<PathBuf>,

    /// Only list enabled stacks
    #[arg(short, long)]
    pub enabled_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from(["stackadmin", "--seed", "stacks.json", "-e"]);
        assert_eq!(args.seed, Some(PathBuf::from("stacks.json")));
        assert!(args.enabled_only);
        assert!(args.config.is_none());
    }
}
