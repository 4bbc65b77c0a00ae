use clap::Parser;
use shipping_forms::utils::{logger, progress::ConsoleObserver, validation::Validate};
use shipping_forms::{
    BatchEngine, BatchOutcome, CliConfig, FormSelections, FormsError, PathProvider, PdfFormFiller,
    SpreadsheetExtractor,
};

fn main() {
    let config = CliConfig::parse();

    logger::init_logger(config.verbose, config.log_json);

    tracing::info!("Starting shipping-forms CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    let encoding = match config.csv_encoding() {
        Ok(encoding) => encoding,
        Err(e) => fail(e),
    };

    let filler = PdfFormFiller::new(FormSelections::default());
    let extractor = SpreadsheetExtractor::with_csv_encoding(encoding);
    let engine = BatchEngine::new(filler, extractor).with_dry_run(config.dry_run);

    if config.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no PDF files will be written");
    }
    tracing::info!("📄 Template: {}", config.template_path().display());

    let mut observer = ConsoleObserver::new();
    let report = match engine.run(&config, &mut observer) {
        Ok(report) => report,
        Err(e) => fail(e),
    };

    if let Some(path) = &config.report {
        if let Err(e) = report.write_json(path) {
            tracing::error!("❌ Could not write report to {}: {}", path.display(), e);
            fail(e);
        }
        tracing::info!("📝 Report saved to: {}", path.display());
    }

    match report.outcome {
        BatchOutcome::NoData => {
            println!("⚠️ No data in the Excel file.");
        }
        BatchOutcome::Success => {
            if config.dry_run {
                for path in &report.planned {
                    println!("🔍 {}", path.display());
                }
                println!("✅ Dry run complete. {}", report.summary());
            } else {
                println!("✅ Success!");
                println!("📊 {}", report.summary());
            }
        }
    }
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
