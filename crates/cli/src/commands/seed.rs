use crate::commands::CommandResult;
use ringi_core::config::{AppConfig, LoadOptions};
use ringi_db::{connect, migrations, seed_demo_routes};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let summary = seed_demo_routes(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8))?;

        pool.close().await;
        Ok::<ringi_db::SeedSummary, (&'static str, String, u8)>(summary)
    });

    match result {
        Ok(summary) => {
            let route_descriptions: Vec<String> = summary
                .routes
                .iter()
                .map(|route| {
                    format!("  - {}: {} ({} steps)", route.route_id, route.name, route.step_count)
                })
                .collect();
            let message = format!(
                "demo approval routes loaded:\n{}",
                route_descriptions.join("\n")
            );
            CommandResult::success("seed", message)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
