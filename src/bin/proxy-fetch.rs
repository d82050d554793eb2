use a2a_proxy::config::{BackendUrl, BACKEND_URL_ENV, DEFAULT_BACKEND_URL};
use a2a_proxy::fetch::{Fetch, HttpFetch, ProxyFetch, RequestInit};
use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use serde_json::Value;
use std::io::Write;
use url::Url;

#[derive(Parser)]
#[command(name = "proxy-fetch")]
#[command(about = "Fetch a backend URL through a running a2a-proxy", long_about = None)]
struct Cli {
    /// Origin of the running proxy.
    #[arg(short, long, default_value = "http://localhost:3000")]
    proxy: Url,

    /// Backend base URL; URLs under it are routed through the proxy.
    #[arg(short, long, env = BACKEND_URL_ENV, default_value = DEFAULT_BACKEND_URL)]
    backend_url: BackendUrl,

    /// HTTP method.
    #[arg(short = 'X', long, default_value = "GET")]
    method: Method,

    /// Request body, sent as JSON.
    #[arg(short, long)]
    data: Option<String>,

    /// URL to fetch.
    url: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let fetch = ProxyFetch::new(
        HttpFetch::new(reqwest::Client::builder().no_proxy().build()?).with_origin(cli.proxy),
        cli.backend_url,
    );

    let mut init = RequestInit::new(cli.method);
    if let Some(data) = cli.data {
        init = init
            .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(data);
    }

    let res = fetch.fetch(cli.url.into(), Some(init)).await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let is_json = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    if !status.is_success() {
        eprintln!("Error: request returned status {}", status);
    }

    if is_json {
        let json: Value = res.json().await?;
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    // Event streams are printed as they arrive.
    let mut res = res;
    while let Some(chunk) = res.chunk().await? {
        print!("{}", String::from_utf8_lossy(&chunk));
        std::io::stdout().flush()?;
    }
    println!();
    Ok(())
}
