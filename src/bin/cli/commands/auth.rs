use clap::Subcommand;

use crate::client::EnzoLearnClient;
use crate::output::{self, OutputConfig};

/// Account commands
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Create an account and log in
    Register {
        #[clap(long)]
        name: String,
        #[clap(long)]
        email: String,
        #[clap(long, env = "ENZOLEARN_PASSWORD")]
        password: String,
    },
    /// Log in and save the session token
    Login {
        #[clap(long)]
        email: String,
        #[clap(long, env = "ENZOLEARN_PASSWORD")]
        password: String,
    },
    /// Log out and forget the saved token
    Logout,
    /// Show the logged-in user
    Whoami,
}

/// Executes an auth command
pub async fn execute(
    client: &mut EnzoLearnClient,
    cmd: AuthCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        AuthCommands::Register { name, email, password } => {
            let payload = client.register(name, email, password).await?;
            output::print_user(&payload.user, config);
        }
        AuthCommands::Login { email, password } => {
            let payload = client.login(email, password).await?;
            output::print_success(&format!("Logged in as {}", payload.user.get_email()), config);
        }
        AuthCommands::Logout => {
            let message = client.logout().await?;
            output::print_success(&message, config);
        }
        AuthCommands::Whoami => {
            let user = client.current_user().await?;
            output::print_user(&user, config);
        }
    }
    Ok(())
}
