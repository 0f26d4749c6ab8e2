use std::str::FromStr;
use waypoint::application_port::*;
use waypoint::client::Client;
use waypoint::domain_model::*;
use waypoint::logger::*;
use waypoint::settings::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    debug!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let client = Client::try_new(&project_settings).await?;

    let outcome = run(&client, cli.command).await;
    client.settle().await;
    outcome
}

async fn run(client: &Client, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let record = client.session.login(LoginInput { email, password }).await?;
            println!("logged in as {}", record.user_id);
        }
        Command::Oauth {
            access_token,
            user_id,
        } => {
            client
                .session
                .complete_oauth(TokenRecord::new(access_token, user_id))
                .await?;
            println!("session stored");
        }
        Command::Logout => {
            client.session.logout().await?;
            println!("logged out");
        }
        Command::Status => match client.session.status().await {
            SessionStatus::Authenticated { user_id } => println!("authenticated as {user_id}"),
            SessionStatus::Anonymous => println!("anonymous"),
        },
        Command::Request { method, path, body } => {
            let method = Method::from_str(&method)?;
            let mut request = ApiRequest::new(method, path);
            if let Some(body) = body {
                request = request.with_body(serde_json::from_str(&body)?);
            }
            let response = client.api.send(request).await?;
            println!("{}", serde_json::to_string_pretty(&response.body)?);
        }
    }

    Ok(())
}
