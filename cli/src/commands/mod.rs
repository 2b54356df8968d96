pub mod migrate;

use anyhow::Result;

use crate::cli::Cli;

pub fn run(cli: Cli) -> Result<()> {
    let config = cli.migration_config();
    migrate::run(&cli.db_path, &cli.export_file, config).map(|_| ())
}
