use clap::Parser;
use shipping_forms::config::toml_config::TomlConfig;
use shipping_forms::utils::{logger, progress::ConsoleObserver, validation::Validate};
use shipping_forms::{
    BatchEngine, BatchOutcome, FormsError, PathProvider, PdfFormFiller, SpreadsheetExtractor,
};

#[derive(Parser)]
#[command(name = "toml-batch")]
#[command(about = "Shipping form batch with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "batch-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Dry run - show what would be generated without writing PDFs
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    let args = Args::parse();

    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    logger::init_logger(args.verbose || config.verbose(), config.json_logs());

    tracing::info!("🚀 Starting TOML-based shipping form batch");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    let dry_run = args.dry_run || config.dry_run();
    display_config_summary(&config, dry_run);

    let encoding = match config.csv_encoding() {
        Ok(encoding) => encoding,
        Err(e) => fail(e),
    };

    let filler = PdfFormFiller::new(config.selections());
    let extractor = SpreadsheetExtractor::with_csv_encoding(encoding);
    let engine = BatchEngine::new(filler, extractor).with_dry_run(dry_run);

    let mut observer = ConsoleObserver::new();
    let report = match engine.run(&config, &mut observer) {
        Ok(report) => report,
        Err(e) => fail(e),
    };

    if let Some(path) = config.report_path() {
        if let Err(e) = report.write_json(&path) {
            tracing::error!("❌ Could not write report to {}: {}", path.display(), e);
            fail(e);
        }
        tracing::info!("📝 Report saved to: {}", path.display());
    }

    match report.outcome {
        BatchOutcome::NoData => println!("⚠️ No data in the Excel file."),
        BatchOutcome::Success if dry_run => {
            println!("🔍 Dry run analysis:");
            for path in &report.planned {
                println!("  {}", path.display());
            }
            println!("✅ Dry run complete. {}", report.summary());
        }
        BatchOutcome::Success => {
            println!("✅ Success!");
            println!("📊 {}", report.summary());
        }
    }
}

fn display_config_summary(config: &TomlConfig, dry_run: bool) {
    println!("📋 Configuration Summary:");
    println!("  Template: {}", config.template_path().display());
    println!("  Input: {}", config.input_path().display());
    println!("  Output: {}", config.output_dir().display());

    if let Ok(encoding) = config.csv_encoding() {
        println!("  CSV Encoding: {}", encoding.name());
    }

    let selections = config.selections();
    println!("  Selections: {} groups", selections.len());
    for (field, option) in selections.iter() {
        println!("    {} -> {}", field, option);
    }

    if let Some(report) = config.report_path() {
        println!("  Report: {}", report.display());
    }

    if dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn fail(e: FormsError) -> ! {
    tracing::error!(
        "❌ Batch failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}
