use super::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in with email and password and store the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Store the token pair handed over by an OAuth redirect.
    Oauth {
        #[arg(long)]
        access_token: String,
        #[arg(long)]
        user_id: String,
    },
    Logout,
    /// Show whether a session is stored.
    Status,
    /// Send an authenticated request and print the JSON response.
    Request {
        method: String,
        path: String,
        #[arg(long)]
        body: Option<String>,
    },
}
