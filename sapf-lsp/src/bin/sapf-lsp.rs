use sapf_lsp::SapfLanguageServer;
use tokio::io::{stdin, stdout};
use tower_lsp::{LspService, Server};

#[tokio::main]
async fn main() {
    // stdout carries the protocol; env_logger writes to stderr.
    env_logger::init();

    let config = match sapf_config::load_defaults() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load sapf configuration: {err}");
            std::process::exit(1);
        }
    };

    let stdin = stdin();
    let stdout = stdout();
    let (service, socket) = LspService::new(move |client| SapfLanguageServer::new(client, config));
    Server::new(stdin, stdout, socket).serve(service).await;
}
