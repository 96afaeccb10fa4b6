//! Command-line capture.
//!
//! The shim must accept anything kitchen-terraform passes to `terraform`,
//! so clap only collects the raw arguments; help and version flags are
//! disabled so `-help` and `-v` reach the real terraform untouched.

use clap::Parser;

/// Drop-in terraform that redirects kitchen-terraform to terragrunt
#[derive(Parser, Debug)]
#[command(name = "terraform")]
#[command(about = "Drop-in terraform that redirects kitchen-terraform to terragrunt")]
#[command(long_about = r#"
Stands in for the terraform executable during kitchen-terraform runs.

SUBCOMMANDS:
  version    → Print the underlying terraform version
  apply      → terragrunt run-all apply in terraform/<env_name>
  output     → terragrunt run-all output, merged into one JSON object
  destroy    → terragrunt run-all destroy in terraform/<env_name>
  workspace  → No-op
  init       → terraform init with fixed flags
  validate   → terraform validate
  *          → Forwarded to terraform verbatim

ENVIRONMENT:
  TK_HOME           Repository root (default: the single dir under /workspaces)
  TGSHIM_STATE_DIR  Where env_name and raw output are kept (default: temp dir)
  TGSHIM_DRY_RUN    Print commands instead of running them
  RUST_LOG          Log filter (logs go to stderr)

EXIT CODES:
  0 - Success
  1 - General error
  2 - Missing precondition
  3 - Child process failure
  4 - Invalid test config
"#)]
#[command(disable_help_flag = true, disable_version_flag = true)]
pub struct Cli {
    /// Subcommand and arguments, exactly as kitchen-terraform passed them
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub argv: Vec<String>,
}
