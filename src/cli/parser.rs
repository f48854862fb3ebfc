use clap::{Args, Parser, Subcommand};

/// Command-line interface definition for rAttendance
#[derive(Parser)]
#[command(
    name = "rattendance",
    version = env!("CARGO_PKG_VERSION"),
    about = "Attendance tracking for groups: recurring events, check-ins, absences and member data",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Recurrence options shared by `event` and `edit`.
#[derive(Args, Debug, Clone, Default)]
pub struct RepeatArgs {
    /// Repeat the event: daily, weekly or monthly
    #[arg(long = "repeat", value_name = "FREQ")]
    pub frequency: Option<String>,

    /// Every N days/weeks/months
    #[arg(long, default_value_t = 1)]
    pub interval: u32,

    /// Weekdays for weekly series, e.g. "1,3" or "mon,wed" (0 = Sunday)
    #[arg(long)]
    pub days: Option<String>,

    /// Last allowed start of the series
    #[arg(long, value_name = "DATETIME")]
    pub until: Option<String>,

    /// Number of occurrences
    #[arg(long)]
    pub count: Option<u32>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Show the configuration
    Config {
        #[arg(long = "print", help = "Print the effective configuration")]
        print_config: bool,
    },

    /// Print the internal audit log
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,

        #[arg(long = "op", help = "Only rows for this operation")]
        operation: Option<String>,
    },

    /// Create a business
    Business {
        name: String,

        #[arg(long = "approval", help = "Join requests must be approved")]
        require_approval: bool,

        #[arg(long = "owner", help = "User id of the owner")]
        owner: Option<String>,
    },

    /// Register or update a user
    User {
        id: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,
    },

    /// Add a member to a business (or change their role)
    Member {
        #[arg(long = "business", short = 'b')]
        business: i64,

        user: String,

        #[arg(
            long = "role",
            default_value = "user",
            help = "owner, admin, moderator, scanner or user"
        )]
        role: String,
    },

    /// Create an event, optionally repeating
    Event {
        #[arg(long = "business", short = 'b')]
        business: i64,

        name: String,

        #[arg(long, value_name = "DATETIME", help = "Start (YYYY-MM-DD HH:MM)")]
        start: String,

        #[arg(long, value_name = "DATETIME", help = "End (YYYY-MM-DD HH:MM)")]
        end: String,

        #[arg(long = "desc")]
        description: Option<String>,

        #[arg(long)]
        tag: Option<String>,

        #[command(flatten)]
        repeat: RepeatArgs,
    },

    /// Edit an event and, with --effect, the rest of its series
    Edit {
        id: i64,

        #[arg(long, value_name = "DATETIME")]
        start: Option<String>,

        #[arg(long, value_name = "DATETIME")]
        end: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long = "desc")]
        description: Option<String>,

        #[arg(long)]
        tag: Option<String>,

        #[arg(
            long = "effect",
            default_value_t = 1,
            help = "1 = this event, 2 = this and following, 3 = whole series"
        )]
        effect: u8,

        #[command(flatten)]
        repeat: RepeatArgs,
    },

    /// Delete an event and, with --effect, the rest of its series
    Del {
        id: i64,

        #[arg(
            long = "effect",
            default_value_t = 1,
            help = "1 = this event, 2 = this and following, 3 = whole series"
        )]
        effect: u8,

        #[arg(long = "yes", short = 'y', help = "Do not ask for confirmation")]
        yes: bool,
    },

    /// List the events of a business
    List {
        #[arg(long = "business", short = 'b')]
        business: i64,

        #[arg(long, value_name = "DATE")]
        from: Option<String>,

        #[arg(long, value_name = "DATE")]
        to: Option<String>,

        #[arg(long)]
        tag: Option<String>,
    },

    /// Check a member in to an event
    Scan {
        event: i64,

        user: String,

        #[arg(long = "code", help = "Scan code issued with `scan-code`")]
        code: Option<String>,

        #[arg(long = "at", hide = true)]
        at: Option<String>,
    },

    /// Report your own absence for an event
    Absent {
        event: i64,

        user: String,

        #[arg(long = "at", hide = true)]
        at: Option<String>,
    },

    /// Set the status of several members for several events
    Alter {
        #[arg(long = "events", value_delimiter = ',', required = true)]
        events: Vec<i64>,

        #[arg(long = "users", value_delimiter = ',', required = true)]
        users: Vec<String>,

        #[arg(long, help = "present, absent, late, excused or self")]
        status: String,
    },

    /// Merge member custom data from a CSV file
    Import {
        #[arg(long = "business", short = 'b')]
        business: i64,

        #[arg(value_name = "FILE", help = "CSV file, or - for stdin")]
        file: String,

        #[arg(long = "by", default_value = "email", help = "email, id or name")]
        join_column: String,

        #[arg(long)]
        overwrite: bool,
    },

    /// Show, issue or rotate the join code of a business
    JoinCode {
        #[arg(long = "business", short = 'b')]
        business: i64,

        #[arg(long, help = "Revoke the current code and issue a new one")]
        rotate: bool,
    },

    /// Join a business with its join code
    Join { code: String, user: String },

    /// Approve a pending join request
    Approve {
        #[arg(long = "business", short = 'b')]
        business: i64,

        user: String,
    },

    /// Issue a short-lived scan code
    ScanCode {
        #[arg(long = "business", short = 'b')]
        business: i64,

        #[arg(long = "at", hide = true)]
        at: Option<String>,
    },

    /// Attendance summary per member
    Stats {
        #[arg(long = "business", short = 'b')]
        business: i64,

        #[arg(long, value_name = "DATE")]
        from: Option<String>,

        #[arg(long, value_name = "DATE")]
        to: Option<String>,

        #[arg(long)]
        tag: Option<String>,

        #[arg(long)]
        role: Option<String>,

        #[arg(long, help = "Also count events that have not ended yet")]
        upcoming: bool,

        #[arg(long)]
        json: bool,

        #[arg(long = "at", hide = true)]
        at: Option<String>,
    },

    /// Per-event status of one member
    Status {
        #[arg(long = "business", short = 'b')]
        business: i64,

        user: String,

        #[arg(long, value_name = "DATE")]
        from: Option<String>,

        #[arg(long, value_name = "DATE")]
        to: Option<String>,

        #[arg(long = "at", hide = true)]
        at: Option<String>,
    },
}
