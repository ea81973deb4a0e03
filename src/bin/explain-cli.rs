use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use code_explainer::CodeExplanation;

#[derive(Parser)]
#[command(name = "explain-cli")]
#[command(about = "Command-line client for the code explainer service", long_about = None)]
struct Cli {
    #[arg(short, long, env = "EXPLAINER_URL", default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Explain a source file (reads stdin when FILE is omitted)
    Explain {
        file: Option<PathBuf>,

        #[arg(short, long, default_value = "python")]
        language: String,

        /// Print the raw JSON instead of formatted sections
        #[arg(long)]
        json: bool,
    },
    /// Check that the service is up
    Health,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let base = cli.url.trim_end_matches('/');
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Explain {
            file,
            language,
            json,
        } => {
            let code = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };

            let res = client
                .post(format!("{}/explain", base))
                .json(&json!({ "code": code, "language": language }))
                .send()
                .await?;

            let Some(body) = read_success(res).await? else {
                return Ok(ExitCode::FAILURE);
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                let explanation: CodeExplanation = serde_json::from_value(body)?;
                print_explanation(&explanation);
            }
        }
        Commands::Health => {
            let res = client.get(format!("{}/", base)).send().await?;
            let Some(body) = read_success(res).await? else {
                return Ok(ExitCode::FAILURE);
            };
            println!("{}", body["status"].as_str().unwrap_or("unknown"));
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Body of a 2xx response, or `None` after reporting the server's `detail`.
async fn read_success(res: reqwest::Response) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let status = res.status();
    if status.is_success() {
        return Ok(Some(res.json().await?));
    }

    let detail = res
        .json::<Value>()
        .await
        .ok()
        .and_then(|v| v["detail"].as_str().map(str::to_string))
        .unwrap_or_else(|| "An unexpected error occurred.".to_string());
    eprintln!("Error ({}): {}", status.as_u16(), detail);
    Ok(None)
}

fn print_explanation(explanation: &CodeExplanation) {
    println!("== Summary ==\n{}\n", explanation.summary);

    println!("== Line-by-Line ==");
    for item in &explanation.line_by_line {
        println!("Line {}: {}", item.line, item.explanation);
    }

    println!("\n== Suggested Tests ==");
    for item in &explanation.suggested_tests {
        println!("- {}\n  {}", item.test_case, item.description);
    }

    println!("\n== Potential Refactors ==");
    for item in &explanation.potential_refactors {
        println!("- {}\n  {}", item.area, item.suggestion);
    }
}
