//! Operator CLI over the access-control engine.
//!
//! Configuration comes from the environment (see `EngineConfig::from_env`);
//! the session is persisted between invocations in the storage directory.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use gestio_auth::catalogue;
use gestio_auth::{AccessControl, AdminCredentials, EngineConfig, UserId};

#[derive(Parser)]
#[command(name = "gestio", about = "Inspect and drive the gestio access-control engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and persist the session.
    Login { identifier: String, secret: String },

    /// Clear the persisted session.
    Logout,

    /// Print the acting user.
    Whoami,

    /// Act as another directory user (demo affordance).
    Switch { id: u64 },

    /// Exit 0 if the acting user holds the permission, 1 otherwise.
    Check { permission: String },

    /// Explain the decision for a permission.
    Explain { permission: String },

    /// List directory users.
    Users,

    /// List roles and their permissions.
    Roles,

    /// List the permission catalogue grouped by module.
    Permissions,

    /// Store administrator override credentials.
    SetAdmin { username: String, password: String },
}

fn main() -> ExitCode {
    gestio_observability::init();

    let cli = Cli::parse();
    let config = EngineConfig::from_env();
    let mut engine = AccessControl::from_config(&config);

    match run(&mut engine, cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(engine: &mut AccessControl, command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Login { identifier, secret } => {
            if !engine.login_user(&identifier, &secret) {
                eprintln!("login failed: invalid credentials");
                return Ok(ExitCode::FAILURE);
            }
            print_json(&engine.current_user())?;
        }
        Command::Logout => engine.logout_user(),
        Command::Whoami => print_json(&engine.current_user())?,
        Command::Switch { id } => {
            engine.switch_user(UserId::new(id))?;
            print_json(&engine.current_user())?;
        }
        Command::Check { permission } => {
            let permission = lookup(&permission)?;
            let granted = engine.has_permission(&permission);
            println!("{}", if granted { "granted" } else { "denied" });
            if !granted {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Explain { permission } => {
            let permission = gestio_auth::Permission::from(permission);
            print_json(&engine.explain(&permission))?;
        }
        Command::Users => print_json(&engine.available_users())?,
        Command::Roles => {
            let roles: Vec<serde_json::Value> = engine
                .available_roles()
                .iter()
                .map(|role| {
                    serde_json::json!({
                        "name": role,
                        "permissions": engine.get_role_permissions(role),
                    })
                })
                .collect();
            print_json(&roles)?;
        }
        Command::Permissions => print_json(&catalogue::by_module())?,
        Command::SetAdmin { username, password } => {
            engine.set_admin_credentials(&AdminCredentials::new(username, password))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn lookup(token: &str) -> anyhow::Result<gestio_auth::Permission> {
    catalogue::lookup(token).ok_or_else(|| anyhow::anyhow!("unknown permission '{token}'"))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
