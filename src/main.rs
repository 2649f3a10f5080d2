//! pr-pilot binary entry point

use anyhow::Result;

fn main() -> Result<()> {
    pr_pilot::cli::run()
}
