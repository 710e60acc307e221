//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rvdb::{HartId, OutcomePolicy, ReplayConfig, ReplayTarget, Xlen};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "rvdb")]
#[command(about = "Replay and inspect RISC-V conformance traces")]
#[command(version)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Workload database written by the simulator
    #[arg(value_name = "DB")]
    pub db: PathBuf,

    /// Architecture description root (holds the rv32/ and rv64/ CSR tables)
    #[arg(long, global = true, value_name = "DIR")]
    pub arch_dir: Option<PathBuf>,

    /// Register width of the architecture description
    #[arg(long, global = true, value_enum, default_value = "64")]
    pub xlen: XlenArg,

    /// Hardware thread to inspect
    #[arg(long, global = true, default_value = "0")]
    pub hart: u32,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Disable the replay cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Show metrics summary after execution
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Enable verbose output (debug-level logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Session configuration from the global flags.
    #[must_use]
    pub fn replay_config(&self) -> ReplayConfig {
        let mut config = ReplayConfig::default()
            .with_hart(HartId(self.hart))
            .with_xlen(self.xlen.into())
            .with_cache(!self.no_cache);
        if let Some(dir) = &self.arch_dir {
            config = config.with_arch_dir(dir);
        }
        if let Commands::Tests { policy } | Commands::Summary { policy } = &self.command {
            config = config.with_policy((*policy).into());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List passing and failing tests (exits 1 if any test fails)
    Tests {
        /// How a test's outcome is decided
        #[arg(long, value_enum, default_value = "recorded")]
        policy: PolicyArg,
    },
    /// Per-status instruction counts for every test
    Summary {
        /// How a test's outcome is decided
        #[arg(long, value_enum, default_value = "recorded")]
        policy: PolicyArg,
    },
    /// Registers whose initial values differ from the reference
    Init {
        /// Test name
        test: String,

        /// Show every register, not just the differing ones
        #[arg(long)]
        all: bool,
    },
    /// Instruction listing with per-instruction status
    List {
        /// Test name
        test: String,
    },
    /// Operands and result of the instruction at a PC
    Inst {
        /// Test name
        test: String,

        /// Program counter (hex with 0x prefix, or decimal)
        #[arg(value_parser = parse_u64)]
        pc: u64,
    },
    /// CSR values after the instruction at a PC, model vs. reference
    Csrs {
        /// Test name
        test: String,

        /// Program counter (hex with 0x prefix, or decimal)
        #[arg(value_parser = parse_u64)]
        pc: u64,
    },
    /// Reconstructed register state
    Regs {
        /// Test name
        test: String,

        /// Replay up to the last occurrence of this PC
        #[arg(value_parser = parse_u64, required_unless_present = "record")]
        pc: Option<u64>,

        /// Replay up to the n-th record (0-based) instead of a PC
        #[arg(long, conflicts_with = "pc")]
        record: Option<usize>,

        /// Only show these registers
        #[arg(long = "reg", value_name = "NAME")]
        regs: Vec<String>,
    },
    /// Write mask and field decode of a register
    Mask {
        /// Test name
        test: String,

        /// Register name
        reg: String,

        /// Take the value at this PC instead of the initial state
        #[arg(long, value_parser = parse_u64)]
        pc: Option<u64>,

        /// Take the value at the n-th record instead of the initial state
        #[arg(long, conflicts_with = "pc")]
        record: Option<usize>,

        /// Show the value a software write of VALUE would leave behind
        #[arg(long, value_parser = parse_u64, value_name = "VALUE")]
        write: Option<u64>,
    },
}

/// Replay target from optional PC and record arguments.
#[must_use]
pub const fn replay_target(pc: Option<u64>, record: Option<usize>) -> Option<ReplayTarget> {
    match (pc, record) {
        (_, Some(n)) => Some(ReplayTarget::Record(n)),
        (Some(pc), None) => Some(ReplayTarget::Pc(pc)),
        (None, None) => None,
    }
}

// ============================================================================
// Argument types with conversions
// ============================================================================

/// Register width.
#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum XlenArg {
    #[value(name = "32")]
    Rv32,
    #[default]
    #[value(name = "64")]
    Rv64,
}

impl From<XlenArg> for Xlen {
    fn from(arg: XlenArg) -> Self {
        match arg {
            XlenArg::Rv32 => Self::Rv32,
            XlenArg::Rv64 => Self::Rv64,
        }
    }
}

/// Test outcome policy.
#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum PolicyArg {
    /// Fail on recorded PC mismatch, register mismatch or unimplemented
    #[default]
    Recorded,
    /// Fail on any alert-level instruction status
    Classified,
}

impl From<PolicyArg> for OutcomePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Recorded => Self::RecordedCategories,
            PolicyArg::Classified => Self::ClassifiedStatus,
        }
    }
}

/// Output format.
#[derive(Clone, Copy, Debug, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Parse a `0x`-prefixed hex or decimal integer.
pub fn parse_u64(arg: &str) -> Result<u64, String> {
    let arg = arg.trim();
    let parsed = match arg.strip_prefix("0x").or_else(|| arg.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => arg.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid number '{arg}': {e}"))
}
