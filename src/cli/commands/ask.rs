//! One-shot generation through the full gateway.

use console::style;

use crate::config::ConfigLoader;
use crate::gateway::AiGateway;
use crate::types::{GenerationRequest, Result};

pub struct AskOptions {
    pub prompt: String,
    pub system: Option<String>,
    pub operation: String,
    pub issue: Option<u64>,
}

pub async fn run(options: AskOptions) -> Result<()> {
    let config = ConfigLoader::load()?;
    let gateway = AiGateway::from_config(&config)?;

    let mut request = GenerationRequest::new(options.prompt)?;
    if let Some(system) = options.system {
        request = request.with_system(system);
    }

    let response = gateway
        .generate(&request, &options.operation, options.issue)
        .await?;

    println!("{}", response.content);
    eprintln!();
    eprintln!(
        "{}",
        style(format!(
            "provider: {} | tokens: {} in / {} out | cost: ${:.6}",
            response.provider, response.tokens.input, response.tokens.output, response.cost
        ))
        .dim()
    );

    Ok(())
}
