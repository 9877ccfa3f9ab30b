use log::{error, info};
use std::process::ExitCode;

use rusty_auth::auth::{hash_password, CredentialVerifier};
use rusty_auth::config::AuthConfig;
use rusty_auth::security_logger::{init_security_logger, log_security_event, SecurityEvent};

const USAGE: &str = "usage:
  rusty_auth hash <value>              print the SHA-256 digest used for secret comparison
  rusty_auth compare <value> <digest>  print whether <value> hashes to <digest>
  rusty_auth hash-password <password>  print an Argon2 hash for a user record
  rusty_auth check-config              validate the environment configuration";

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize env
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }

    // Initialize logging
    env_logger::init();
    init_security_logger();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["hash", value] => {
            println!("{}", CredentialVerifier::hash(value));
            ExitCode::SUCCESS
        }
        ["compare", value, digest] => {
            println!("{}", CredentialVerifier::equals(value, digest));
            ExitCode::SUCCESS
        }
        ["hash-password", password] => match hash_password(password) {
            Ok(phc) => {
                println!("{}", phc);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Failed to hash password: {}", e);
                ExitCode::FAILURE
            }
        },
        ["check-config"] => match AuthConfig::from_env() {
            Ok(config) => {
                info!(
                    "Configuration OK: cookie={}, token_ttl={:?}, issuer={:?}",
                    config.cookie_name, config.token_ttl, config.issuer
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                log_security_event(SecurityEvent::ConfigurationError {
                    component: "AuthConfig".to_string(),
                    error: e.to_string(),
                })
                .await;
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("{}", USAGE);
            ExitCode::from(2)
        }
    }
}
