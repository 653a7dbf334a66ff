use anyhow::Context;
use catalog_migrate::{
    IndexManager, IndexReport, MigrateConfig, MigrationDriver, MigrationError, RollbackDriver,
    RunSummary, VerificationReport, Verifier,
};
use catalog_store::{connect_from_env, STORE_URL_ENV};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

const EXIT_OK: i32 = 0;
const EXIT_ATTENTION: i32 = 1;
const EXIT_FATAL: i32 = 2;

/// Everything printed to stdout at the end of a run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReport {
    #[serde(flatten)]
    summary: RunSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    indexes: Option<IndexReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verification: Option<VerificationReport>,
}

impl RunReport {
    fn exit_code(&self) -> i32 {
        let indexes_ok = self.indexes.as_ref().map_or(true, IndexReport::is_clean);
        let verified = self
            .verification
            .as_ref()
            .map_or(true, VerificationReport::passed);
        if self.summary.is_clean() && indexes_ok && verified {
            EXIT_OK
        } else {
            EXIT_ATTENTION
        }
    }
}

/// Counts of a pass the error cut short, if any
fn partial_summary(err: &anyhow::Error) -> Option<&RunSummary> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<MigrationError>())
        .and_then(MigrationError::partial_summary)
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!("Cannot render run report: {}", e),
    }
}

fn cli() -> Command {
    Command::new("catalog-migrate")
        .version(catalog_migrate::VERSION)
        .about("Migrate the catalog collection between the flat and nested document shapes")
        .after_help(format!(
            "The store is read from {STORE_URL_ENV} (memory:// or file:///dir).\n\
             Only one instance may run against a collection at a time."
        ))
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Transform and count documents without writing anything"),
        )
        .arg(
            Arg::new("rollback")
                .long("rollback")
                .action(ArgAction::SetTrue)
                .help("Convert migrated documents back to the flat shape"),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .action(ArgAction::SetTrue)
                .help("Roll back even if the collection holds both shapes"),
        )
        .arg(
            Arg::new("skip-indexes")
                .long("skip-indexes")
                .action(ArgAction::SetTrue)
                .help("Leave the index catalogue untouched"),
        )
        .arg(
            Arg::new("batch-size")
                .long("batch-size")
                .default_value("100")
                .value_parser(value_parser!(usize))
                .help("Documents written per batch"),
        )
        .arg(
            Arg::new("max-attempts")
                .long("max-attempts")
                .default_value("3")
                .value_parser(value_parser!(u32))
                .help("Read/write attempts per document before it counts as failed"),
        )
        .arg(
            Arg::new("progress-every")
                .long("progress-every")
                .default_value("1000")
                .value_parser(value_parser!(u64))
                .help("Print a progress line every N documents (0 disables)"),
        )
        .arg(
            Arg::new("verify-sample")
                .long("verify-sample")
                .value_parser(value_parser!(usize))
                .help("Verify only the first N documents after a live run"),
        )
}

fn config_from(matches: &ArgMatches) -> MigrateConfig {
    let mut config = MigrateConfig::new()
        .with_dry_run(matches.get_flag("dry-run"))
        .with_force(matches.get_flag("force"))
        .with_reconcile_indexes(!matches.get_flag("skip-indexes"))
        .with_verify_sample(matches.get_one::<usize>("verify-sample").copied());
    if let Some(&size) = matches.get_one::<usize>("batch-size") {
        config = config.with_batch_size(size);
    }
    if let Some(&attempts) = matches.get_one::<u32>("max-attempts") {
        config = config.with_max_attempts(attempts);
    }
    if let Some(&every) = matches.get_one::<u64>("progress-every") {
        config = config.with_progress_every(every);
    }
    config
}

async fn run(matches: &ArgMatches) -> anyhow::Result<RunReport> {
    let config = config_from(matches);
    let rollback = matches.get_flag("rollback");

    let store = connect_from_env()
        .await
        .with_context(|| format!("cannot open the store named by {STORE_URL_ENV}"))?;

    let summary = if rollback {
        RollbackDriver::new(store.clone(), config.clone()).run().await?
    } else {
        MigrationDriver::new(store.clone(), config.clone()).run().await?
    };

    let mut report = RunReport {
        summary,
        indexes: None,
        verification: None,
    };
    if config.dry_run {
        return Ok(report);
    }

    if config.reconcile_indexes {
        let manager = IndexManager::new(store.clone());
        let indexes = if rollback {
            manager.restore_legacy().await
        } else {
            manager.reconcile().await
        }
        .context("index reconciliation aborted")?;
        report.indexes = Some(indexes);
    }

    if !rollback {
        let verification = Verifier::new(store)
            .verify(config.verify_sample)
            .await
            .context("verification aborted")?;
        report.verification = Some(verification);
    }

    Ok(report)
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let code = match run(&matches).await {
        Ok(report) => {
            println!("{}", report.summary.attention_line());
            print_json(&report);
            report.exit_code()
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            if let Some(partial) = partial_summary(&e) {
                println!("{}: aborted before the end of the collection", partial.mode);
                println!("{}", partial.attention_line());
                print_json(partial);
            }
            EXIT_FATAL
        }
    };

    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn flags_map_to_config() {
        let matches = cli()
            .try_get_matches_from([
                "catalog-migrate",
                "--dry-run",
                "--batch-size",
                "0",
                "--verify-sample",
                "25",
                "--skip-indexes",
            ])
            .unwrap();
        let config = config_from(&matches);
        assert!(config.dry_run);
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.verify_sample, Some(25));
        assert!(!config.reconcile_indexes);
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn defaults_match_config_defaults() {
        let matches = cli().try_get_matches_from(["catalog-migrate"]).unwrap();
        assert_eq!(config_from(&matches), MigrateConfig::default());
    }

    #[test]
    fn interrupted_pass_keeps_its_counts() {
        let tally = catalog_migrate::summary::Tally {
            scanned: 5,
            migrated: 4,
            ..Default::default()
        };
        let err = anyhow::Error::new(MigrationError::Interrupted {
            partial: Box::new(tally.finish(
                catalog_migrate::RunMode::Migrate,
                false,
                Duration::ZERO,
            )),
            source: catalog_store::StoreError::Connection("reset".into()),
        });
        assert_eq!(partial_summary(&err).map(|s| (s.scanned, s.migrated)), Some((5, 4)));

        let other = anyhow::Error::new(MigrationError::MixedState {
            legacy: 1,
            migrated: 1,
        });
        assert!(partial_summary(&other).is_none());
    }

    #[test]
    fn exit_code_reflects_verification() {
        let summary = catalog_migrate::summary::Tally::default().finish(
            catalog_migrate::RunMode::Migrate,
            false,
            Duration::ZERO,
        );
        let mut report = RunReport {
            summary,
            indexes: Some(IndexReport::default()),
            verification: Some(VerificationReport::default()),
        };
        assert_eq!(report.exit_code(), EXIT_OK);

        report.verification = Some(VerificationReport {
            legacy_remaining: 1,
            ..VerificationReport::default()
        });
        assert_eq!(report.exit_code(), EXIT_ATTENTION);
    }
}
