//! `teammate doctor`: diagnose configuration and backends.

use teammate_config::AppConfig;

pub async fn run() -> anyhow::Result<()> {
    println!("TeamMate Doctor");
    println!("===============\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  [ok]   Config file {}", config_path.display());
    } else {
        println!("  [info] No config file, using defaults and environment");
    }

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            println!("  [fail] Config invalid: {e}");
            return Ok(());
        }
    };
    println!(
        "  [ok]   Listening on {}:{}",
        config.gateway.host, config.gateway.port
    );

    if config.has_api_key() {
        println!("  [ok]   Generation key configured ({})", config.generation.model);
        match teammate_providers::build_generator(&config) {
            Ok(generator) => match generator.health_check().await {
                Ok(true) => println!("  [ok]   Generation API reachable at {}", config.generation.api_url),
                Ok(false) => {
                    println!("  [warn] Generation API at {} did not answer", config.generation.api_url);
                    issues += 1;
                }
                Err(e) => {
                    println!("  [fail] Generation API: {e}");
                    issues += 1;
                }
            },
            Err(e) => {
                println!("  [fail] Generation client: {e}");
                issues += 1;
            }
        }
    } else {
        println!("  [warn] OPENAI_API_KEY is not set; `serve` will refuse to start");
        issues += 1;
    }

    match teammate_providers::build_vector_store(&config) {
        Ok(store) => match store.health_check().await {
            Ok(true) => println!("  [ok]   Vector store ready at {}", config.vector_store.url),
            Ok(false) => {
                println!("  [warn] Vector store at {} is not ready", config.vector_store.url);
                issues += 1;
            }
            Err(e) => {
                println!("  [fail] Vector store unreachable: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  [fail] Vector store client: {e}");
            issues += 1;
        }
    }

    let schema_path = &config.data.schema_path;
    match std::fs::read_to_string(schema_path) {
        Ok(content) => match serde_json::from_str::<teammate_core::vector::SchemaDefinition>(&content) {
            Ok(schema) => println!(
                "  [ok]   Schema file {} declares {}",
                schema_path.display(),
                schema.class_names().join(", ")
            ),
            Err(e) => {
                println!("  [fail] Schema file {} is malformed: {e}", schema_path.display());
                issues += 1;
            }
        },
        Err(e) => {
            println!("  [warn] Schema file {}: {e}", schema_path.display());
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  All checks passed.");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
