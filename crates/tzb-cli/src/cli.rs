use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tzb",
    about = "Timezone boundary builder: recipe-driven zone polygons, overlap validation, release diffs",
    version
)]
pub struct Cli {
    /// TOML settings file; explicit arguments win over its values
    #[arg(long, global = true)]
    pub settings: Option<String>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Configuration inputs and directories shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Zone recipes
    #[arg(long)]
    pub zones: Option<String>,

    /// Zone recipes for the 1970 cutoff variant
    #[arg(long)]
    pub zones_1970: Option<String>,

    /// Zone recipes for the present-day variant
    #[arg(long)]
    pub zones_now: Option<String>,

    /// Boundary source queries
    #[arg(long)]
    pub sources: Option<String>,

    /// Expected zone overlaps
    #[arg(long)]
    pub expected_overlaps: Option<String>,

    /// Directory holding downloaded boundary sources
    #[arg(long)]
    pub downloads_dir: Option<String>,

    /// Directory for per-zone outputs, combined outputs and diagnostics
    #[arg(long)]
    pub working_dir: Option<String>,

    /// Directory for distributable outputs
    #[arg(long)]
    pub dist_dir: Option<String>,

    /// Only handle these zones (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub included_zones: Vec<String>,

    /// Skip these zones (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub excluded_zones: Vec<String>,

    /// Worker threads (default: one per core)
    #[arg(long)]
    pub threads: Option<usize>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build every zone, fill oceans, validate overlaps and write combined outputs
    Build {
        #[command(flatten)]
        run: RunArgs,

        /// Do not validate zone overlaps
        #[arg(long)]
        skip_validation: bool,

        /// Do not fill ocean bands
        #[arg(long)]
        skip_oceans: bool,

        /// Recompute every zone, ignoring the zone cache
        #[arg(long)]
        no_cache: bool,

        /// Output the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate previously built zone files for unexpected overlaps
    Validate {
        #[command(flatten)]
        run: RunArgs,

        /// Output the validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diff the combined output against a previous release
    Diff {
        #[command(flatten)]
        run: RunArgs,

        /// Previous release FeatureCollection (GeoJSON)
        #[arg(long)]
        previous_release: Option<String>,

        /// Output the diff summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the configuration for undefined/unused sources, bad overlap entries and cycles
    Lint {
        #[command(flatten)]
        run: RunArgs,

        /// Output the lint report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the Overpass queries for every download a build reads
    Queries {
        #[command(flatten)]
        run: RunArgs,

        /// Output the queries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the list of zone names (land and ocean) to the dist directory
    Names {
        #[command(flatten)]
        run: RunArgs,
    },
}
