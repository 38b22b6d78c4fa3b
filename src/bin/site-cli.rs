use clap::{Parser, Subcommand};
use reqwest::header::USER_AGENT;
use reqwest::redirect::Policy;

#[derive(Parser)]
#[command(name = "site-cli")]
#[command(about = "Operations CLI for the site server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Purge the whole CDN cache
    Purge {
        /// Fastly API key the server expects
        #[arg(short, long, env = "FASTLY_API_KEY")]
        key: String,
    },
    /// Show where /api/download sends a user agent
    Download {
        #[arg(short = 'a', long)]
        user_agent: Option<String>,
    },
    /// Fetch a crumb and print the cookie the server set
    Crumb,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .build()?;

    match cli.command {
        Commands::Purge { key } => {
            let res = client
                .post(format!("{}/api/purge", cli.url))
                .query(&[("fastly_api_key", key.as_str())])
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Download { user_agent } => {
            let mut req = client.get(format!("{}/api/download", cli.url));
            if let Some(ua) = user_agent {
                req = req.header(USER_AGENT, ua);
            }
            let res = req.send().await?;
            match res.headers().get(reqwest::header::LOCATION) {
                Some(location) => println!("{}", location.to_str()?),
                None => print_response(res).await?,
            }
        }
        Commands::Crumb => {
            let res = client.get(format!("{}/api/crumb", cli.url)).send().await?;
            for cookie in res.headers().get_all(reqwest::header::SET_COOKIE) {
                println!("Set-Cookie: {}", cookie.to_str()?);
            }
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        eprintln!("Response: {}", text);
        return Ok(());
    }

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
