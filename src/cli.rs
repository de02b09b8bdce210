use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "kaamyab-access",
    about = "Strategic planning access for Kaamyab profiles",
    version
)]
pub struct Cli {
    /// Path to the SQLite database [default: ~/.kaamyab/access.db]
    #[arg(long, env = "KAAMYAB_DB", global = true)]
    pub db: Option<String>,

    /// Path to the policy config [default: ~/.kaamyab/access.toml]
    #[arg(long, env = "KAAMYAB_CONFIG", global = true)]
    pub config: Option<String>,

    /// More log output (-v info, -vv debug); KAAMYAB_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add a profile
    Add {
        /// User id (alphanumeric, hyphens, underscores; immutable after creation)
        user: String,
        /// Sign-up email address
        email: String,
        /// Subscription tier (omit to leave unset; treated as standard)
        #[arg(long)]
        tier: Option<String>,
        /// Subscription state (omit to leave unset; treated as active)
        #[arg(long)]
        state: Option<String>,
    },

    /// Show a profile and its evaluated access
    Show {
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List profiles with their access level
    List {
        /// Only profiles at this level (none, preview, full)
        #[arg(long)]
        level: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change a profile's subscription tier and/or state
    #[command(name = "set-tier")]
    SetTier {
        user: String,
        #[arg(long)]
        tier: Option<String>,
        #[arg(long)]
        state: Option<String>,
    },

    /// Override how a profile's email domain is classified
    #[command(name = "set-domain")]
    SetDomain {
        user: String,
        /// standard, disposable, or enterprise
        #[arg(required_unless_present = "clear", conflicts_with = "clear")]
        domain_type: Option<String>,
        /// Remove the override and classify from the email again
        #[arg(long)]
        clear: bool,
    },

    /// Remove a profile
    Rm { user: String },

    /// Mark the one-time strategic trial as used (idempotent)
    #[command(name = "consume-trial")]
    ConsumeTrial { user: String },

    /// Run strategic planning once for a user, consuming the trial on preview
    Use {
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve access for ad-hoc facts without touching the database
    Eval {
        #[arg(long, default_value = "standard")]
        tier: String,
        #[arg(long, default_value = "active")]
        state: String,
        #[arg(long)]
        trial_used: bool,
        /// standard, disposable, or enterprise
        #[arg(long, default_value = "standard")]
        email_type: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the full decision table
    Table {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a user's access level whenever it changes
    Watch {
        user: String,
        /// Fallback poll interval in seconds
        #[arg(long, default_value_t = 30)]
        poll: u64,
    },
}
